//! Pull model files from HuggingFace Hub

use std::path::PathBuf;

use anyhow::Result;
use hf_hub::api::sync::Api;

use crate::config::ModelConfig;

/// Tokenizer and config files worth keeping next to the fine-tuned weights
const TOKENIZER_FILES: &[&str] = &[
    "config.json",
    "tokenizer.json",
    "tokenizer_config.json",
    "vocab.txt",
    "special_tokens_map.json",
];

/// Pull model files from HuggingFace Hub
///
/// Lets `serve` start without network access once the fine-tuned weights
/// are in place.
pub async fn pull(repo: String, output: Option<PathBuf>, weights: bool) -> Result<()> {
    let output_dir = output.unwrap_or_else(|| {
        ModelConfig {
            name: repo.clone(),
            dir: None,
        }
        .resolve_dir()
    });

    std::fs::create_dir_all(&output_dir)?;

    println!("Downloading from: {}", repo);
    println!("Downloading to: {}", output_dir.display());

    tokio::task::spawn_blocking(move || -> Result<()> {
        let api = Api::new()?;
        let repo_api = api.model(repo.clone());

        let mut files: Vec<&str> = TOKENIZER_FILES.to_vec();
        if weights {
            files.push("model.safetensors");
        }

        for filename in files {
            match repo_api.get(filename) {
                Ok(cached_path) => {
                    let dest = output_dir.join(filename);
                    std::fs::copy(&cached_path, &dest)?;
                    println!("  Downloaded: {}", filename);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", filename, e);
                }
            }
        }

        println!("\nFiles downloaded to: {}", output_dir.display());
        Ok(())
    })
    .await?
}
