//! Inference executor
//!
//! Runs the BERT classifier over texts one instance at a time.

use std::time::Instant;

use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};

use super::postprocess::{self, Prediction};
use crate::config::ClassrConfig;
use crate::labels::LabelMap;
use crate::loader;
use crate::model::{BertClassifier, ClassifierConfig};
use crate::tokenizer::{BoxedTokenizer, Tokenizer, TokenizerTrait};

/// Anything that turns texts into predictions
///
/// The HTTP layer depends on this rather than on [`Executor`] so it can be
/// driven without model weights.
pub trait TextClassifier: Send + Sync {
    /// Classify every text, preserving order
    ///
    /// A failure on any text fails the whole call.
    fn classify(&self, texts: &[String]) -> Result<Vec<Prediction>>;

    /// Labels this classifier can produce
    fn labels(&self) -> &LabelMap;
}

/// Inference executor
///
/// Owns the tokenizer and the classifier. Both are read-only after
/// construction, so one executor can be shared across threads.
pub struct Executor {
    model: BertClassifier,
    tokenizer: BoxedTokenizer,
    labels: LabelMap,
    device: Device,
}

impl Executor {
    /// Create a new executor
    pub fn new<T: TokenizerTrait + 'static>(
        model: BertClassifier,
        tokenizer: T,
        labels: LabelMap,
    ) -> Result<Self> {
        if model.num_labels() != labels.len() {
            return Err(anyhow!(
                "classifier has {} outputs but {} labels are configured",
                model.num_labels(),
                labels.len()
            ));
        }
        let device = model.device().clone();
        Ok(Self {
            model,
            tokenizer: Box::new(tokenizer),
            labels,
            device,
        })
    }

    /// Load tokenizer and weights described by `config`
    pub fn load(config: &ClassrConfig) -> Result<Self> {
        let start = Instant::now();
        let model_dir = config.model_dir();
        tracing::info!("Loading model from {}", model_dir.display());

        let files = loader::resolve_model_files(&model_dir, &config.model.name)?;
        let device = config.inference.device.open()?;
        let dtype = config.dtype()?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer_path, config.inference.max_length)?;
        let model_config = ClassifierConfig::load(&files.config_path)?;

        let num_labels = match model_config.num_labels {
            Some(n) if n != config.labels.len() => {
                return Err(anyhow!(
                    "{} declares {} labels but {} are configured",
                    files.config_path.display(),
                    n,
                    config.labels.len()
                ));
            }
            Some(n) => n,
            None => config.labels.len(),
        };

        let vb = loader::var_builder(&files.weights, dtype, &device)?;
        let model = BertClassifier::load(vb, &model_config, num_labels)?;

        tracing::info!(
            "Model loaded in {:?} ({} labels, {:?}, max_length {})",
            start.elapsed(),
            num_labels,
            dtype,
            config.inference.max_length
        );

        Self::new(model, tokenizer, config.labels.clone())
    }

    /// Warm up the model by running a dummy forward pass
    pub fn warmup(&self) -> Result<()> {
        tracing::debug!("Warming up model...");
        let start = Instant::now();
        self.classify_one("")?;
        tracing::debug!("Model warmup complete in {:?}", start.elapsed());
        Ok(())
    }

    /// Classify a single text
    pub fn classify_one(&self, text: &str) -> Result<Prediction> {
        let encoded = self.tokenizer.encode(text)?;
        let input_ids = self.row(&encoded.ids)?;
        let token_type_ids = self.row(&encoded.type_ids)?;
        let attention_mask = self.row(&encoded.attention_mask)?;

        let logits = self
            .model
            .forward(&input_ids, &token_type_ids, &attention_mask)?;
        let prediction = postprocess::pick(&logits, &self.labels)?;

        tracing::debug!(
            "{} tokens -> {} ({:.4})",
            encoded.ids.len(),
            prediction.label,
            prediction.score
        );
        Ok(prediction)
    }

    fn row(&self, values: &[u32]) -> Result<Tensor> {
        Ok(Tensor::new(values, &self.device)?.unsqueeze(0)?)
    }
}

impl TextClassifier for Executor {
    fn classify(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        texts.iter().map(|text| self.classify_one(text)).collect()
    }

    fn labels(&self) -> &LabelMap {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{CONFIG_FILE, TOKENIZER_FILE};
    use crate::model::{tiny_checkpoint, TINY_BERT_CONFIG};
    use crate::tokenizer::TEST_TOKENIZER_JSON;
    use candle_core::DType;
    use candle_nn::VarBuilder;
    use std::path::Path;

    fn tiny_executor(num_labels: usize, labels: LabelMap) -> Result<Executor> {
        let config = ClassifierConfig::from_json_str(TINY_BERT_CONFIG)?;
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = BertClassifier::load(vb, &config, num_labels)?;
        let tokenizer = Tokenizer::from_bytes(TEST_TOKENIZER_JSON.as_bytes(), 16)?;
        Executor::new(model, tokenizer, labels)
    }

    #[test]
    fn test_classify_preserves_length_and_order() {
        let executor = tiny_executor(4, LabelMap::default()).unwrap();
        let texts = vec![
            "fears for pension after talks".to_string(),
            "goal".to_string(),
            String::new(),
        ];

        let predictions = executor.classify(&texts).unwrap();
        assert_eq!(predictions.len(), 3);
        // Zero weights give uniform probabilities, so the first class wins.
        for prediction in &predictions {
            assert_eq!(prediction.label, "World");
            assert!((prediction.score - 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let executor = tiny_executor(4, LabelMap::default()).unwrap();
        let texts = vec!["stocks fell".to_string()];
        assert_eq!(
            executor.classify(&texts).unwrap(),
            executor.classify(&texts).unwrap()
        );
    }

    #[test]
    fn test_long_text_is_truncated() {
        let executor = tiny_executor(4, LabelMap::default()).unwrap();
        let long = "fears for pension after talks ".repeat(50);
        assert!(executor.classify_one(&long).is_ok());
    }

    #[test]
    fn test_empty_batch() {
        let executor = tiny_executor(4, LabelMap::default()).unwrap();
        assert!(executor.classify(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_warmup() {
        assert!(tiny_executor(4, LabelMap::default()).unwrap().warmup().is_ok());
    }

    #[test]
    fn test_label_count_mismatch() {
        assert!(tiny_executor(2, LabelMap::default()).is_err());
    }

    /// Model directory with config.json and tokenizer.json next to the weights
    fn model_dir(model_config: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), model_config).unwrap();
        std::fs::write(dir.path().join(TOKENIZER_FILE), TEST_TOKENIZER_JSON).unwrap();
        dir
    }

    fn load_from(dir: &Path) -> Result<Executor> {
        let mut config = ClassrConfig::default();
        config.model.dir = Some(dir.to_path_buf());
        config.inference.max_length = 16;
        config.inference.warmup = false;
        Executor::load(&config)
    }

    fn texts() -> Vec<String> {
        vec!["fears for pension after talks".to_string(), "goal".to_string()]
    }

    #[test]
    fn test_load_prefixed_safetensors() {
        let dir = model_dir(TINY_BERT_CONFIG);
        candle_core::safetensors::save(
            &tiny_checkpoint("bert", 4, 2),
            dir.path().join("model.safetensors"),
        )
        .unwrap();

        let executor = load_from(dir.path()).unwrap();
        let predictions = executor.classify(&texts()).unwrap();
        assert_eq!(predictions.len(), 2);
        for prediction in &predictions {
            assert_eq!(prediction.label, "Business");
            assert_eq!(prediction.index, 2);
            assert!(prediction.score > 0.25);
        }
    }

    #[test]
    fn test_load_unprefixed_safetensors() {
        let dir = model_dir(TINY_BERT_CONFIG);
        candle_core::safetensors::save(
            &tiny_checkpoint("", 4, 3),
            dir.path().join("model.safetensors"),
        )
        .unwrap();

        let executor = load_from(dir.path()).unwrap();
        assert!(executor.warmup().is_ok());
        assert_eq!(executor.classify_one("stocks fell").unwrap().label, "Sci/Tech");
    }

    #[test]
    fn test_load_rejects_declared_label_mismatch() {
        let mut value: serde_json::Value = serde_json::from_str(TINY_BERT_CONFIG).unwrap();
        value["id2label"] = serde_json::json!({"0": "NEGATIVE", "1": "POSITIVE"});
        let dir = model_dir(&value.to_string());
        candle_core::safetensors::save(
            &tiny_checkpoint("bert", 2, 0),
            dir.path().join("model.safetensors"),
        )
        .unwrap();

        let err = load_from(dir.path()).err().unwrap().to_string();
        assert!(err.contains("declares 2 labels"));
    }

    #[test]
    fn test_load_without_weights() {
        let dir = model_dir(TINY_BERT_CONFIG);
        let err = load_from(dir.path()).err().unwrap().to_string();
        assert!(err.contains("No model weights found"));
    }

    #[cfg(feature = "keras")]
    #[test]
    fn test_load_keras_checkpoint() {
        let dir = model_dir(TINY_BERT_CONFIG);
        crate::loader::keras::write_checkpoint(
            &dir.path().join("tf_model.h5"),
            &tiny_checkpoint("bert", 4, 1),
        )
        .unwrap();

        let executor = load_from(dir.path()).unwrap();
        let predictions = executor.classify(&texts()).unwrap();
        assert!(predictions.iter().all(|p| p.label == "Sports"));
    }
}
