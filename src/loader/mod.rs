//! Model loading utilities
//!
//! Resolves the files a classifier needs:
//! - fine-tuned weights, always local (Keras HDF5, SafeTensors or PyTorch)
//! - `config.json` and `tokenizer.json`, local when present, otherwise
//!   taken from the base model repo on the HuggingFace Hub

mod detect;
pub mod hub;
#[cfg(feature = "keras")]
pub mod keras;

pub use detect::{detect_weights, ModelFormat, WeightsSource};

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use candle_core::{DType, Device};
use candle_nn::VarBuilder;

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Everything needed to build an executor
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub weights: WeightsSource,
    pub config_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

/// Resolve model files, falling back to the Hub repo `base_repo`
///
/// Weights are checked first so a missing checkpoint fails before any
/// network access.
pub fn resolve_model_files<P: AsRef<Path>>(path: P, base_repo: &str) -> Result<ModelFiles> {
    resolve_model_files_with(path, |filename| hub::fetch(base_repo, filename))
}

/// Resolve model files with a custom fetcher for missing files
pub fn resolve_model_files_with<P, F>(path: P, fetch: F) -> Result<ModelFiles>
where
    P: AsRef<Path>,
    F: Fn(&str) -> Result<PathBuf>,
{
    let weights = detect_weights(path)?;
    let locate = |filename: &str| -> Result<PathBuf> {
        let local = weights.model_dir.join(filename);
        if local.is_file() {
            Ok(local)
        } else {
            tracing::debug!(
                "{} not in {}, using the base model's copy",
                filename,
                weights.model_dir.display()
            );
            fetch(filename)
        }
    };

    let config_path = locate(CONFIG_FILE)?;
    let tokenizer_path = locate(TOKENIZER_FILE)?;

    Ok(ModelFiles {
        weights,
        config_path,
        tokenizer_path,
    })
}

/// Open the weights for building a model
pub fn var_builder(
    weights: &WeightsSource,
    dtype: DType,
    device: &Device,
) -> Result<VarBuilder<'static>> {
    let path = &weights.weights_path;
    let vb = match weights.format {
        // SAFETY: the file is memory-mapped read-only and must not be
        // modified while the server runs.
        ModelFormat::SafeTensors => unsafe {
            VarBuilder::from_mmaped_safetensors(&[path], dtype, device)
        },
        ModelFormat::PyTorch => VarBuilder::from_pth(path, dtype, device),
        ModelFormat::Keras => return keras_var_builder(path, dtype, device),
    };
    vb.map_err(|e| anyhow!("Failed to load weights {}: {}", path.display(), e))
}

#[cfg(feature = "keras")]
fn keras_var_builder(path: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let tensors = keras::load_tensors(path)
        .map_err(|e| anyhow!("Failed to load weights {}: {:#}", path.display(), e))?;
    Ok(VarBuilder::from_tensors(tensors, dtype, device))
}

#[cfg(not(feature = "keras"))]
fn keras_var_builder(path: &Path, _dtype: DType, _device: &Device) -> Result<VarBuilder<'static>> {
    Err(anyhow!(
        "Cannot load {}: classr was built without the `keras` feature",
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline(filename: &str) -> Result<PathBuf> {
        Err(anyhow!("offline: {}", filename))
    }

    #[test]
    fn test_local_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["model.safetensors", CONFIG_FILE, TOKENIZER_FILE] {
            std::fs::write(dir.path().join(name), b"{}").unwrap();
        }

        let files = resolve_model_files_with(dir.path(), offline).unwrap();
        assert_eq!(files.config_path, dir.path().join(CONFIG_FILE));
        assert_eq!(files.tokenizer_path, dir.path().join(TOKENIZER_FILE));
    }

    #[test]
    fn test_missing_files_are_fetched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.safetensors"), b"").unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), b"{}").unwrap();

        let files = resolve_model_files_with(dir.path(), |name| {
            Ok(PathBuf::from("/hub/cache").join(name))
        })
        .unwrap();
        assert_eq!(files.config_path, dir.path().join(CONFIG_FILE));
        assert_eq!(
            files.tokenizer_path,
            PathBuf::from("/hub/cache/tokenizer.json")
        );
    }

    #[test]
    fn test_missing_weights_skip_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_model_files_with(dir.path(), |_| -> Result<PathBuf> {
            panic!("fetch must not run without weights")
        })
        .unwrap_err();
        assert!(err.to_string().contains("No model weights found"));
    }

    #[test]
    fn test_fetch_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.safetensors"), b"").unwrap();
        let err = resolve_model_files_with(dir.path(), offline).unwrap_err();
        assert!(err.to_string().contains("offline: config.json"));
    }
}
