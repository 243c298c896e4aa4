use crate::config::Config;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub model_id: String,
    pub file_name: String,
    pub quantization: Option<String>,
    pub size_bytes: u64,
    pub local_path: PathBuf,
    pub downloaded_at: String,
}

/// Record of artifacts that finished downloading. In-flight progress is
/// never stored here; the destination file's length is the only transfer
/// state that exists.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ArtifactRegistry {
    artifacts: HashMap<String, ArtifactInfo>,
}

impl ArtifactRegistry {
    pub fn load(config: &Config) -> Result<Self> {
        if !config.registry_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config.registry_path)?;
        let registry: ArtifactRegistry = toml::from_str(&content)?;
        Ok(registry)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(&config.registry_path, content)?;
        Ok(())
    }

    pub fn add_artifact(&mut self, artifact: ArtifactInfo) {
        self.artifacts.insert(artifact.file_name.clone(), artifact);
    }

    pub fn list_artifacts(&self) -> Vec<&ArtifactInfo> {
        let mut artifacts: Vec<&ArtifactInfo> = self.artifacts.values().collect();
        artifacts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        artifacts
    }
}
