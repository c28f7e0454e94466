use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use candle_transformers::models::bert::Config as BertConfig;
use serde::Deserialize;

/// Classifier configuration - the BERT config.json plus the head size
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub bert: BertConfig,
    /// Number of output logits, if the config declares it
    ///
    /// Fine-tuned checkpoints carry `id2label`; base checkpoints carry
    /// nothing and the label map decides.
    pub num_labels: Option<usize>,
}

// Head fields HuggingFace stores next to the encoder settings
#[derive(Deserialize)]
struct HeadFields {
    #[serde(default)]
    num_labels: Option<usize>,
    #[serde(default)]
    id2label: Option<HashMap<String, String>>,
}

impl ClassifierConfig {
    /// Load from a config.json file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("invalid BERT config {}", path.display()))
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let bert: BertConfig = serde_json::from_str(contents)?;
        let head: HeadFields = serde_json::from_str(contents)?;
        let num_labels = head
            .num_labels
            .or_else(|| head.id2label.map(|labels| labels.len()));

        Ok(Self { bert, num_labels })
    }

    pub fn hidden_size(&self) -> usize {
        self.bert.hidden_size
    }
}

#[cfg(test)]
pub(crate) const TINY_BERT_CONFIG: &str = r#"{
  "model_type": "bert",
  "vocab_size": 12,
  "hidden_size": 8,
  "num_hidden_layers": 1,
  "num_attention_heads": 2,
  "intermediate_size": 16,
  "hidden_act": "gelu",
  "hidden_dropout_prob": 0.1,
  "attention_probs_dropout_prob": 0.1,
  "max_position_embeddings": 32,
  "type_vocab_size": 2,
  "initializer_range": 0.02,
  "layer_norm_eps": 1e-12,
  "pad_token_id": 0
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_config_has_no_head() {
        let config = ClassifierConfig::from_json_str(TINY_BERT_CONFIG).unwrap();
        assert_eq!(config.hidden_size(), 8);
        assert_eq!(config.num_labels, None);
        assert_eq!(config.bert.model_type.as_deref(), Some("bert"));
    }

    #[test]
    fn test_num_labels_from_id2label() {
        let mut value: serde_json::Value = serde_json::from_str(TINY_BERT_CONFIG).unwrap();
        value["id2label"] = serde_json::json!({
            "0": "LABEL_0", "1": "LABEL_1", "2": "LABEL_2", "3": "LABEL_3"
        });
        let config = ClassifierConfig::from_json_str(&value.to_string()).unwrap();
        assert_eq!(config.num_labels, Some(4));
    }

    #[test]
    fn test_explicit_num_labels_wins() {
        let mut value: serde_json::Value = serde_json::from_str(TINY_BERT_CONFIG).unwrap();
        value["num_labels"] = serde_json::json!(3);
        value["id2label"] = serde_json::json!({"0": "a", "1": "b"});
        let config = ClassifierConfig::from_json_str(&value.to_string()).unwrap();
        assert_eq!(config.num_labels, Some(3));
    }

    #[test]
    fn test_rejects_non_bert_json() {
        assert!(ClassifierConfig::from_json_str(r#"{"hidden_size": 8}"#).is_err());
    }
}
