use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ggpull")]
#[command(version, about = "Discover and download quantized GGUF model artifacts", long_about = None)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
	/// List the GGUF model repositories available on the hub
	List {
		/// Hub owner whose repositories are listed
		#[arg(long, env = "GGPULL_OWNER", default_value = "TheBloke")]
		owner: String,
	},

	/// Search the available models by name
	Search {
		/// Terms that must all appear in the model name
		terms: Vec<String>,

		/// Hub owner whose repositories are searched
		#[arg(long, env = "GGPULL_OWNER", default_value = "TheBloke")]
		owner: String,
	},

	/// Download a model artifact
	Download {
		/// Model repository (e.g., "Llama-2-7B-GGUF" or "TheBloke/Llama-2-7B-GGUF")
		model: String,

		/// Maximum artifact size in GiB; picks the largest quantization that fits
		#[arg(long, short = 's')]
		max_size_gb: Option<f64>,

		/// Quantization method to download (e.g., "Q6_K")
		#[arg(long, short = 'q')]
		quantization: Option<String>,

		/// Hub owner prepended to bare model names
		#[arg(long, env = "GGPULL_OWNER", default_value = "TheBloke")]
		owner: String,

		/// Transfer with an external `wget -c` process instead of the built-in client
		#[arg(long)]
		wget: bool,
	},

	/// List artifacts already downloaded to the local store
	Installed,
}
