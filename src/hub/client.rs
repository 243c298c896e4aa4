use crate::config::Config;
use crate::error::{Error, Result};
use serde_json::Value;
use std::time::Duration;

pub const HUB_BASE_URL: &str = "https://huggingface.co";

/// A model repository as reported by the hub's listing API.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub id: String,
    pub downloads: u64,
    pub likes: u64,
}

impl ModelEntry {
    /// Repository name without the owner prefix.
    pub fn short_name(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}

/// A file in a model repository: its path and byte size, as reported by the
/// hub. Immutable once retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub size: u64,
}

/// Thin client over the hub's catalog API.
pub struct HubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HubClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: HUB_BASE_URL.to_string(),
            token: config.hub_token.clone(),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HubRequestFailed {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }

    /// List all model repositories belonging to `owner`.
    pub async fn list_models(&self, owner: &str) -> Result<Vec<ModelEntry>> {
        let url = format!("{}/api/models?author={}&limit=1000", self.base_url, owner);
        tracing::debug!("Listing models: {}", url);

        let json = self.get_json(&url).await?;
        Ok(parse_model_entries(&json))
    }

    /// List the files of a model repository, in hub order.
    ///
    /// The selector's quantization-mode tie-break depends on this ordering,
    /// so entries are returned exactly as the hub reports them.
    pub async fn list_files(&self, model_id: &str) -> Result<Vec<FileEntry>> {
        let url = format!("{}/api/models/{}/tree/main", self.base_url, model_id);
        tracing::debug!("Listing files: {}", url);

        match self.get_json(&url).await {
            Ok(json) => Ok(parse_tree_entries(&json)),
            Err(Error::HubRequestFailed { status: 404, .. }) => {
                Err(Error::ModelNotFound(model_id.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Direct download URL for a file in a model repository.
    pub fn download_url(&self, model_id: &str, file_path: &str) -> String {
        format!("{}/{}/resolve/main/{}", self.base_url, model_id, file_path)
    }

    /// Human-facing page for a model repository.
    pub fn model_page_url(&self, model_id: &str) -> String {
        format!("{}/{}", self.base_url, model_id)
    }
}

fn parse_model_entries(json: &Value) -> Vec<ModelEntry> {
    let Some(items) = json.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let id = item
                .get("id")
                .or_else(|| item.get("modelId"))
                .and_then(|v| v.as_str())?;
            if id.is_empty() {
                return None;
            }

            Some(ModelEntry {
                id: id.to_string(),
                downloads: item.get("downloads").and_then(Value::as_u64).unwrap_or(0),
                likes: item.get("likes").and_then(Value::as_u64).unwrap_or(0),
            })
        })
        .collect()
}

fn parse_tree_entries(json: &Value) -> Vec<FileEntry> {
    let Some(items) = json.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let kind = item.get("type").and_then(|v| v.as_str())?;
            if kind != "file" {
                return None;
            }

            let path = item.get("path").and_then(|v| v.as_str())?;
            let size = item.get("size").and_then(Value::as_u64)?;

            Some(FileEntry {
                path: path.to_string(),
                size,
            })
        })
        .collect()
}
