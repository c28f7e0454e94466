//! HuggingFace Hub access

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use hf_hub::api::sync::Api;

/// Fetch one file of a Hub model repo, returning its local cache path
pub fn fetch(repo: &str, filename: &str) -> Result<PathBuf> {
    let api = Api::new()?;
    tracing::info!("Fetching {} from {}", filename, repo);
    api.model(repo.to_string())
        .get(filename)
        .map_err(|e| anyhow!("Failed to fetch {} from {}: {}", filename, repo, e))
}
