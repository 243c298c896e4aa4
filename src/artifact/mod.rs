pub mod quant;
pub mod select;

pub use quant::QuantMethod;
pub use select::{select_artifact, Selection, SelectionConstraint};
