//! Weights format and location detection

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

/// Detected weights format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// SafeTensors format (HuggingFace standard)
    SafeTensors,
    /// PyTorch pickle checkpoint
    PyTorch,
    /// Keras HDF5 weights (`save_weights` of a TF model)
    Keras,
}

/// Detected weights location
#[derive(Debug, Clone)]
pub struct WeightsSource {
    /// Path to the model weights
    pub weights_path: PathBuf,
    /// Directory to search for config.json and tokenizer.json
    pub model_dir: PathBuf,
    /// Detected format
    pub format: ModelFormat,
}

/// Weights file names, in order of preference
const WEIGHTS_CANDIDATES: &[(&str, ModelFormat)] = &[
    ("tf_model.h5", ModelFormat::Keras),
    ("model.safetensors", ModelFormat::SafeTensors),
    ("pytorch_model.safetensors", ModelFormat::SafeTensors),
    ("pytorch_model.bin", ModelFormat::PyTorch),
];

/// Detect weights format and location from a path
///
/// The path can be:
/// - A directory containing model files
/// - A direct path to a .safetensors file
/// - A direct path to a .bin file
/// - A direct path to a Keras .h5 file
pub fn detect_weights<P: AsRef<Path>>(path: P) -> Result<WeightsSource> {
    let path = path.as_ref();

    if path.is_file() {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let format = match ext {
            "safetensors" => ModelFormat::SafeTensors,
            "bin" | "pt" | "pth" => ModelFormat::PyTorch,
            "h5" => ModelFormat::Keras,
            _ => return Err(anyhow!("Unsupported weights file format: .{}", ext)),
        };
        let model_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(WeightsSource {
            weights_path: path.to_path_buf(),
            model_dir,
            format,
        })
    } else if path.is_dir() {
        detect_weights_in_directory(path)
    } else {
        Err(anyhow!("Model path does not exist: {}", path.display()))
    }
}

fn detect_weights_in_directory(dir: &Path) -> Result<WeightsSource> {
    for (name, format) in WEIGHTS_CANDIDATES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Ok(WeightsSource {
                weights_path: candidate,
                model_dir: dir.to_path_buf(),
                format: *format,
            });
        }
    }

    Err(anyhow!(
        "No model weights found in {} (expected one of: {})",
        dir.display(),
        WEIGHTS_CANDIDATES
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    ))
}
