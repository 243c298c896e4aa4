pub mod client;

pub use client::{FileEntry, HubClient, ModelEntry};
