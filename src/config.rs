use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub data_dir: PathBuf,
	pub models_dir: PathBuf,
	pub registry_path: PathBuf,
	#[serde(skip)]
	pub hub_token: Option<String>,
}

impl Config {
	pub fn new() -> crate::error::Result<Self> {
		let project_dirs = ProjectDirs::from("", "", "ggpull")
			.ok_or_else(|| crate::error::Error::ConfigError("Could not determine config directory".to_string()))?;

		Self::with_data_dir(project_dirs.data_dir().to_path_buf())
	}

	pub fn from_env() -> crate::error::Result<Self> {
		if let Ok(data_dir) = std::env::var("GGPULL_DATA_DIR") {
			Self::with_data_dir(PathBuf::from(data_dir))
		} else {
			Self::new()
		}
	}

	fn with_data_dir(data_dir: PathBuf) -> crate::error::Result<Self> {
		let models_dir = data_dir.join("models");
		let registry_path = data_dir.join("artifacts.toml");

		std::fs::create_dir_all(&data_dir)?;
		std::fs::create_dir_all(&models_dir)?;

		Ok(Self {
			data_dir,
			models_dir,
			registry_path,
			hub_token: std::env::var("HF_TOKEN").ok(),
		})
	}
}
