//! Inference configuration settings

use anyhow::{anyhow, Result};
use candle_core::Device;
use serde::{Deserialize, Serialize};

/// Device configuration for inference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceConfig {
    /// Simple device string (e.g., "cuda:0", "cpu")
    Simple(String),
    /// Detailed device configuration
    Detailed {
        /// Device type: "cuda", "cpu"
        device_type: String,
        /// Device ID (for multi-GPU)
        #[serde(default)]
        device_id: usize,
    },
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig::Simple("cpu".to_string())
    }
}

impl DeviceConfig {
    /// Get device type ("cuda" or "cpu")
    pub fn device_type(&self) -> &str {
        match self {
            DeviceConfig::Simple(s) => {
                if s.starts_with("cuda") {
                    "cuda"
                } else {
                    "cpu"
                }
            }
            DeviceConfig::Detailed { device_type, .. } => device_type,
        }
    }

    /// Get device ID (for multi-GPU)
    pub fn device_id(&self) -> usize {
        match self {
            DeviceConfig::Simple(s) => s
                .strip_prefix("cuda:")
                .and_then(|id| id.parse().ok())
                .unwrap_or(0),
            DeviceConfig::Detailed { device_id, .. } => *device_id,
        }
    }

    /// Check if using CUDA
    pub fn is_cuda(&self) -> bool {
        self.device_type() == "cuda"
    }

    /// Open the candle device
    ///
    /// Fails when CUDA is requested but the binary was built without the
    /// `cuda` feature.
    pub fn open(&self) -> Result<Device> {
        if self.is_cuda() {
            Device::new_cuda(self.device_id())
                .map_err(|e| anyhow!("failed to open cuda:{}: {}", self.device_id(), e))
        } else {
            Ok(Device::Cpu)
        }
    }
}

/// Inference-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Device configuration
    #[serde(default)]
    pub device: DeviceConfig,

    /// Data type for the weights (f32, f16, bf16)
    #[serde(default = "default_dtype")]
    pub dtype: String,

    /// Token budget per instance, special tokens included
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Run a dummy forward pass before accepting requests
    #[serde(default = "default_true")]
    pub warmup: bool,
}

fn default_dtype() -> String {
    "f32".to_string()
}

fn default_max_length() -> usize {
    512
}

fn default_true() -> bool {
    true
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            dtype: default_dtype(),
            max_length: default_max_length(),
            warmup: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_strings() {
        let cpu = DeviceConfig::Simple("cpu".into());
        assert_eq!(cpu.device_type(), "cpu");
        assert!(!cpu.is_cuda());

        let gpu = DeviceConfig::Simple("cuda:1".into());
        assert!(gpu.is_cuda());
        assert_eq!(gpu.device_id(), 1);
    }

    #[test]
    fn test_detailed_device() {
        let device: DeviceConfig =
            serde_yaml::from_str("device_type: cuda\ndevice_id: 2").unwrap();
        assert!(device.is_cuda());
        assert_eq!(device.device_id(), 2);
    }

    #[test]
    fn test_open_cpu() {
        assert!(DeviceConfig::default().open().unwrap().is_cpu());
    }

    #[test]
    fn test_defaults() {
        let config = InferenceConfig::default();
        assert_eq!(config.max_length, 512);
        assert_eq!(config.dtype, "f32");
        assert!(config.warmup);
    }
}
