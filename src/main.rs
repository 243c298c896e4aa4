mod artifact;
mod cli;
mod config;
mod error;
mod hub;
mod puller;
mod registry;
mod transfer;

use artifact::{QuantMethod, SelectionConstraint};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use hub::{HubClient, ModelEntry};
use puller::ArtifactPuller;
use registry::ArtifactRegistry;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn resolve_model_id(model: &str, owner: &str) -> String {
    if model.contains('/') {
        model.to_string()
    } else {
        format!("{}/{}", owner, model)
    }
}

async fn gguf_models(hub: &HubClient, owner: &str) -> Result<Vec<ModelEntry>> {
    let mut models = hub.list_models(owner).await?;
    // the hub lists every repository for the owner; keep the GGUF ones
    models.retain(|model| model.short_name().ends_with("-GGUF"));
    models.sort_by(|a, b| b.downloads.cmp(&a.downloads));
    Ok(models)
}

fn print_model_list(models: &[ModelEntry]) {
    if models.is_empty() {
        println!("No models found.");
        return;
    }

    for model in models {
        println!("- {}", model.short_name());
        println!("  - likes: {}", model.likes);
        println!("  - downloads: {}", model.downloads);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::List { owner } => {
            let hub = HubClient::new(&config)?;
            let models = gguf_models(&hub, &owner).await?;
            print_model_list(&models);
        }

        Commands::Search { terms, owner } => {
            let hub = HubClient::new(&config)?;
            let mut models = gguf_models(&hub, &owner).await?;
            models.retain(|model| {
                let name = model.short_name().to_lowercase();
                terms.iter().all(|term| name.contains(&term.to_lowercase()))
            });
            print_model_list(&models);
        }

        Commands::Download {
            model,
            max_size_gb,
            quantization,
            owner,
            wget,
        } => {
            let max_size_bytes = max_size_gb.map(|gb| (gb * BYTES_PER_GIB) as u64);
            let method = match quantization {
                Some(tag) => Some(tag.parse::<QuantMethod>()?),
                None => None,
            };
            let constraint = SelectionConstraint::from_options(max_size_bytes, method)?;
            let model_id = resolve_model_id(&model, &owner);

            let mut puller = ArtifactPuller::new(config)?;
            let artifact = puller.pull(&model_id, constraint, wget).await?;

            println!("✓ Successfully downloaded: {}", artifact.file_name);
            println!("  Model: {}", artifact.model_id);
            println!("  Path: {:?}", artifact.local_path);
            if let Some(quantization) = artifact.quantization {
                println!("  Quantization: {}", quantization);
            }
        }

        Commands::Installed => {
            let registry = ArtifactRegistry::load(&config)?;
            let artifacts = registry.list_artifacts();

            if artifacts.is_empty() {
                println!("No artifacts downloaded.");
                println!("Use 'ggpull download <model>' to fetch one.");
            } else {
                println!("Downloaded artifacts:\n");
                for artifact in artifacts {
                    println!("  {}", artifact.file_name);
                    println!("    Model: {}", artifact.model_id);
                    if let Some(quantization) = &artifact.quantization {
                        println!("    Quantization: {}", quantization);
                    }
                    println!(
                        "    Size: {:.2} GiB",
                        artifact.size_bytes as f64 / BYTES_PER_GIB
                    );
                    println!("    Path: {:?}", artifact.local_path);
                    println!("    Downloaded: {}", artifact.downloaded_at);
                    println!();
                }
            }
        }
    }

    Ok(())
}
