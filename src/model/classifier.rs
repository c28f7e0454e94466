//! BERT sequence classifier
//!
//! Encoder from candle-transformers, then the HuggingFace
//! `BertForSequenceClassification` head: tanh pooler over the `[CLS]`
//! hidden state followed by a linear layer to one logit per class.

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};
use candle_transformers::models::bert::BertModel;

use super::config::ClassifierConfig;

/// Tensor prefix of the encoder in fine-tuned checkpoints
const ENCODER_PREFIX: &str = "bert";

pub struct BertClassifier {
    encoder: BertModel,
    pooler: Linear,
    classifier: Linear,
    num_labels: usize,
    device: Device,
}

impl BertClassifier {
    /// Build from pretrained weights
    ///
    /// Checkpoints exported from `BertForSequenceClassification` nest the
    /// pooler under `bert.`; bare encoder exports keep it at the root.
    pub fn load(vb: VarBuilder, config: &ClassifierConfig, num_labels: usize) -> Result<Self> {
        if num_labels == 0 {
            return Err(anyhow!("classifier needs at least one label"));
        }
        let hidden_size = config.hidden_size();
        let device = vb.device().clone();

        let encoder = BertModel::load(vb.clone(), &config.bert)
            .map_err(|e| anyhow!("Failed to load BERT encoder: {}", e))?;

        let pooler_vb = if vb.contains_tensor(&format!("{ENCODER_PREFIX}.pooler.dense.weight")) {
            vb.pp(ENCODER_PREFIX).pp("pooler").pp("dense")
        } else {
            vb.pp("pooler").pp("dense")
        };
        let pooler = linear(hidden_size, hidden_size, pooler_vb)
            .map_err(|e| anyhow!("Failed to load pooler: {}", e))?;
        let classifier = linear(hidden_size, num_labels, vb.pp("classifier"))
            .map_err(|e| anyhow!("Failed to load classifier head: {}", e))?;

        Ok(Self {
            encoder,
            pooler,
            classifier,
            num_labels,
            device,
        })
    }

    /// Forward pass
    ///
    /// All inputs are `(batch, seq_len)` u32 tensors. Returns `(batch, num_labels)`
    /// logits in f32 regardless of the weight dtype.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let hidden = self
            .encoder
            .forward(input_ids, token_type_ids, Some(attention_mask))?;
        let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?;
        Ok(logits.to_dtype(DType::F32)?)
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

/// Named tensors of a checkpoint matching `TINY_BERT_CONFIG`
///
/// Encoder and pooler names get `prefix` (`"bert"` or `""`); the head is
/// always `classifier.*`. Every weight is a small constant except the
/// head, whose bias makes `winner` the predicted class.
#[cfg(test)]
pub(crate) fn tiny_checkpoint(
    prefix: &str,
    num_labels: usize,
    winner: usize,
) -> std::collections::HashMap<String, Tensor> {
    let (vocab, hidden, intermediate, positions, types) = (12, 8, 16, 32, 2);
    let dev = &Device::Cpu;
    let filled = |dims: &[usize]| Tensor::full(0.02f32, dims, dev).unwrap();
    let named = |name: &str| {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        }
    };

    let mut tensors = std::collections::HashMap::new();
    for (name, dims) in [
        ("embeddings.word_embeddings.weight", [vocab, hidden]),
        ("embeddings.position_embeddings.weight", [positions, hidden]),
        ("embeddings.token_type_embeddings.weight", [types, hidden]),
    ] {
        tensors.insert(named(name), filled(&dims));
    }
    for norm in [
        "embeddings.LayerNorm",
        "encoder.layer.0.attention.output.LayerNorm",
        "encoder.layer.0.output.LayerNorm",
    ] {
        tensors.insert(
            named(&format!("{norm}.weight")),
            Tensor::ones(hidden, DType::F32, dev).unwrap(),
        );
        tensors.insert(
            named(&format!("{norm}.bias")),
            Tensor::zeros(hidden, DType::F32, dev).unwrap(),
        );
    }
    for (dense, out_dim, in_dim) in [
        ("encoder.layer.0.attention.self.query", hidden, hidden),
        ("encoder.layer.0.attention.self.key", hidden, hidden),
        ("encoder.layer.0.attention.self.value", hidden, hidden),
        ("encoder.layer.0.attention.output.dense", hidden, hidden),
        ("encoder.layer.0.intermediate.dense", intermediate, hidden),
        ("encoder.layer.0.output.dense", hidden, intermediate),
        ("pooler.dense", hidden, hidden),
    ] {
        tensors.insert(named(&format!("{dense}.weight")), filled(&[out_dim, in_dim]));
        tensors.insert(named(&format!("{dense}.bias")), filled(&[out_dim]));
    }

    let mut bias = vec![0f32; num_labels];
    bias[winner] = 1.0;
    tensors.insert(
        "classifier.weight".to_string(),
        Tensor::zeros((num_labels, hidden), DType::F32, dev).unwrap(),
    );
    tensors.insert(
        "classifier.bias".to_string(),
        Tensor::new(bias.as_slice(), dev).unwrap(),
    );
    tensors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::TINY_BERT_CONFIG;

    fn tiny_classifier(num_labels: usize) -> BertClassifier {
        let config = ClassifierConfig::from_json_str(TINY_BERT_CONFIG).unwrap();
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        BertClassifier::load(vb, &config, num_labels).unwrap()
    }

    #[test]
    fn test_logits_shape() {
        let model = tiny_classifier(4);
        let ids = Tensor::new(&[[2u32, 4, 5, 3]], &Device::Cpu).unwrap();
        let type_ids = ids.zeros_like().unwrap();
        let mask = ids.ones_like().unwrap();

        let logits = model.forward(&ids, &type_ids, &mask).unwrap();
        assert_eq!(logits.dims(), &[1, 4]);
        assert_eq!(logits.dtype(), DType::F32);
        assert_eq!(model.num_labels(), 4);
    }

    fn classify_with(tensors: std::collections::HashMap<String, Tensor>) -> Vec<f32> {
        let config = ClassifierConfig::from_json_str(TINY_BERT_CONFIG).unwrap();
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &Device::Cpu);
        let model = BertClassifier::load(vb, &config, 4).unwrap();
        let ids = Tensor::new(&[[2u32, 4, 5, 3]], &Device::Cpu).unwrap();
        let type_ids = ids.zeros_like().unwrap();
        let mask = ids.ones_like().unwrap();
        model
            .forward(&ids, &type_ids, &mask)
            .unwrap()
            .squeeze(0)
            .unwrap()
            .to_vec1()
            .unwrap()
    }

    #[test]
    fn test_loads_prefixed_checkpoint() {
        let logits = classify_with(tiny_checkpoint("bert", 4, 2));
        assert_eq!(logits, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_loads_unprefixed_checkpoint() {
        let logits = classify_with(tiny_checkpoint("", 4, 1));
        assert_eq!(logits, vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_pooler_rejected() {
        let config = ClassifierConfig::from_json_str(TINY_BERT_CONFIG).unwrap();
        let mut tensors = tiny_checkpoint("bert", 4, 0);
        tensors.remove("bert.pooler.dense.weight");
        tensors.remove("bert.pooler.dense.bias");
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &Device::Cpu);
        assert!(BertClassifier::load(vb, &config, 4).is_err());
    }

    #[test]
    fn test_missing_head_rejected() {
        let config = ClassifierConfig::from_json_str(TINY_BERT_CONFIG).unwrap();
        let mut tensors = tiny_checkpoint("bert", 4, 0);
        tensors.remove("classifier.weight");
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &Device::Cpu);
        assert!(BertClassifier::load(vb, &config, 4).is_err());
    }

    #[test]
    fn test_zero_labels_rejected() {
        let config = ClassifierConfig::from_json_str(TINY_BERT_CONFIG).unwrap();
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        assert!(BertClassifier::load(vb, &config, 0).is_err());
    }
}
