use std::fmt;

#[derive(Debug)]
pub enum Error {
	ModelNotFound(String),
	InvalidArgument(String),
	NoMatchingArtifact(String),
	DestinationUnreadable(String),
	TransferMechanismUnavailable(String),
	TransferFailed(String),
	HubRequestFailed { status: u16, url: String },
	ConfigError(String),
	IoError(std::io::Error),
	HttpError(reqwest::Error),
	SerializationError(String),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::ModelNotFound(name) => write!(f, "Model not found: {}", name),
			Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
			Error::NoMatchingArtifact(msg) => write!(f, "No matching artifact: {}", msg),
			Error::DestinationUnreadable(msg) => write!(f, "Destination unreadable: {}", msg),
			Error::TransferMechanismUnavailable(msg) => {
				write!(f, "Transfer mechanism unavailable: {}", msg)
			}
			Error::TransferFailed(msg) => write!(f, "Transfer failed: {}", msg),
			Error::HubRequestFailed { status, url } => {
				write!(f, "Hub request failed with status {}: {}", status, url)
			}
			Error::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
			Error::IoError(e) => write!(f, "IO error: {}", e),
			Error::HttpError(e) => write!(f, "HTTP error: {}", e),
			Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Error::IoError(err)
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Error::HttpError(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

impl From<toml::de::Error> for Error {
	fn from(err: toml::de::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

impl From<toml::ser::Error> for Error {
	fn from(err: toml::ser::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;
