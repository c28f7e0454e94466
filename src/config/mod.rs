//! Configuration system for classr
//!
//! ClassrConfig groups the model location, the label map, inference
//! settings and server settings. Every field has a default, so an empty
//! file (or no file at all) yields a server for `bert-large-uncased`
//! fine-tuned on AG News.

mod inference;
mod server;

pub use inference::{DeviceConfig, InferenceConfig};
pub use server::ServerConfig;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use candle_core::DType;
use serde::{Deserialize, Serialize};

use crate::labels::LabelMap;

/// Environment variable overriding the model directory
pub const MODEL_DIR_ENV: &str = "CLASSR_MODEL_DIR";

/// Parse a dtype string into a `DType`.
///
/// Accepts short and long forms: "f32"/"float32", "f16"/"float16", "bf16"/"bfloat16".
pub fn parse_dtype(s: &str) -> Result<DType> {
    match s {
        "f32" | "float32" => Ok(DType::F32),
        "f16" | "float16" => Ok(DType::F16),
        "bf16" | "bfloat16" => Ok(DType::BF16),
        other => Err(anyhow!("unknown dtype: '{}'", other)),
    }
}

/// Which pretrained model to serve and where its fine-tuned weights live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// HuggingFace repo of the base model (tokenizer and config fallback)
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Directory holding the fine-tuned weights
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_model_name() -> String {
    "bert-large-uncased".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            dir: None,
        }
    }
}

impl ModelConfig {
    /// Resolve the model directory
    ///
    /// Explicit `dir` wins, then `CLASSR_MODEL_DIR`, then
    /// `../models/<name>-trained`.
    pub fn resolve_dir(&self) -> PathBuf {
        self.resolve_dir_with(std::env::var(MODEL_DIR_ENV).ok())
    }

    fn resolve_dir_with(&self, env_dir: Option<String>) -> PathBuf {
        if let Some(ref dir) = self.dir {
            return dir.clone();
        }
        if let Some(dir) = env_dir.filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        PathBuf::from("../models").join(format!("{}-trained", self.name))
    }
}

/// Classr configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassrConfig {
    #[serde(default)]
    pub model: ModelConfig,

    /// Class labels in logit order
    #[serde(default)]
    pub labels: LabelMap,

    /// Inference-specific settings
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Server settings (only for `classr serve`)
    #[serde(default)]
    pub server: ServerConfig,
}

impl ClassrConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from a file, picking the format from its extension
    ///
    /// `.json` is parsed as JSON, anything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            _ => Self::from_yaml(path),
        };
        config.with_context(|| format!("failed to load config {}", path.display()))
    }

    /// Get the inference dtype
    pub fn dtype(&self) -> Result<DType> {
        parse_dtype(&self.inference.dtype)
    }

    /// Get the model directory
    pub fn model_dir(&self) -> PathBuf {
        self.model.resolve_dir()
    }
}
