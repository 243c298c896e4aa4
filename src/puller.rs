use crate::artifact::{select_artifact, Selection, SelectionConstraint};
use crate::config::Config;
use crate::error::Result;
use crate::hub::HubClient;
use crate::registry::{ArtifactInfo, ArtifactRegistry};
use crate::transfer::{HttpFetcher, TransferTarget, Transferor, WgetFetcher};
use std::io::Write;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn print_progress(line: &str) {
    print!("\r{}", line);
    let _ = std::io::stdout().flush();
}

pub struct ArtifactPuller {
    config: Config,
    hub: HubClient,
    registry: ArtifactRegistry,
}

impl ArtifactPuller {
    pub fn new(config: Config) -> Result<Self> {
        let hub = HubClient::new(&config)?;
        let registry = ArtifactRegistry::load(&config)?;
        Ok(Self {
            config,
            hub,
            registry,
        })
    }

    /// Select one artifact of `model_id` and download it into the models
    /// directory, recording the result in the registry.
    pub async fn pull(
        &mut self,
        model_id: &str,
        constraint: SelectionConstraint,
        use_wget: bool,
    ) -> Result<ArtifactInfo> {
        tracing::info!("Fetching file list for {}", model_id);
        let files = self.hub.list_files(model_id).await?;

        let selection = select_artifact(model_id, &files, constraint)?;
        self.report_selection(model_id, &selection, constraint);

        let file_name = selection
            .entry
            .path
            .rsplit('/')
            .next()
            .unwrap_or(&selection.entry.path)
            .to_string();
        let target = TransferTarget {
            source_url: self.hub.download_url(model_id, &selection.entry.path),
            destination_path: self.config.models_dir.join(&file_name),
            expected_final_size: selection.entry.size,
        };

        tracing::info!("Downloading {} to {:?}", target.source_url, target.destination_path);
        if use_wget {
            Transferor::new(WgetFetcher)
                .transfer(&target, print_progress)
                .await?;
        } else {
            Transferor::new(HttpFetcher::new()?)
                .transfer(&target, print_progress)
                .await?;
        }
        println!();

        let artifact = ArtifactInfo {
            model_id: model_id.to_string(),
            file_name,
            quantization: selection.method.map(|method| method.to_string()),
            size_bytes: selection.entry.size,
            local_path: target.destination_path.clone(),
            downloaded_at: chrono::Utc::now().to_rfc3339(),
        };
        self.registry.add_artifact(artifact.clone());
        self.registry.save(&self.config)?;

        tracing::info!("Artifact '{}' downloaded and recorded", artifact.file_name);
        Ok(artifact)
    }

    fn report_selection(
        &self,
        model_id: &str,
        selection: &Selection,
        constraint: SelectionConstraint,
    ) {
        if let SelectionConstraint::MaxSizeBytes(ceiling) = constraint {
            println!(
                "Found {} quantization levels for {} at or under {:.2} GiB",
                selection.candidates,
                model_id,
                ceiling as f64 / BYTES_PER_GIB
            );
        }

        println!("Model name: {}", model_id);
        println!("- webpage: {}", self.hub.model_page_url(model_id));
        match selection.method {
            Some(method) => println!("- quantization method: {}", method),
            None => println!("- quantization method: unknown"),
        }
        println!(
            "- artifact: {} ({:.2} GiB)",
            selection.entry.path,
            selection.entry.size as f64 / BYTES_PER_GIB
        );
    }
}
