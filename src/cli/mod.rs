//! CLI commands

mod classify;
mod info;
mod pull;
mod serve;

pub use classify::classify;
pub use info::info;
pub use pull::pull;
pub use serve::serve;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::{ClassrConfig, DeviceConfig};

/// Classr - HTTP inference server for a BERT news classifier
#[derive(Parser)]
#[command(name = "classr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that loads the model
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Config file (YAML, or JSON by extension)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Directory (or weights file) of the fine-tuned model
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Force CPU inference
    #[arg(long)]
    pub cpu: bool,
}

impl ModelArgs {
    /// Load the config file, if any, and apply command-line overrides
    pub fn load_config(&self) -> Result<ClassrConfig> {
        let mut config = match self.config {
            Some(ref path) => ClassrConfig::from_file(path)?,
            None => ClassrConfig::default(),
        };
        if let Some(ref dir) = self.model_dir {
            config.model.dir = Some(dir.clone());
        }
        if self.cpu {
            config.inference.device = DeviceConfig::Simple("cpu".to_string());
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start inference server
    Serve {
        #[command(flatten)]
        model: ModelArgs,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Classify texts and print one label per line
    Classify {
        #[command(flatten)]
        model: ModelArgs,

        /// Texts to classify
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Show resolved model files and configuration
    Info {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Pull tokenizer and config from HuggingFace Hub
    Pull {
        /// Repository ID
        #[arg(default_value = "bert-large-uncased")]
        repo: String,

        /// Output directory (default: the model directory)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Also download the (untrained) base weights
        #[arg(long)]
        weights: bool,
    },
}
