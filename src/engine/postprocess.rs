//! Logits to label

use anyhow::{anyhow, Result};
use candle_core::{DType, Tensor, D};
use serde::Serialize;

use crate::labels::LabelMap;

/// Classification result for one instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub index: usize,
    /// Softmax probability of the winning class
    pub score: f32,
}

/// Softmax over the last axis
pub fn softmax(logits: &Tensor) -> Result<Tensor> {
    Ok(candle_nn::ops::softmax(&logits.to_dtype(DType::F32)?, D::Minus1)?)
}

/// Index of the largest value; the first one wins on ties
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Pick the label for a single row of logits
///
/// Accepts `(num_labels,)` or `(1, num_labels)`.
pub fn pick(logits: &Tensor, labels: &LabelMap) -> Result<Prediction> {
    let row = match logits.rank() {
        1 => logits.clone(),
        2 if logits.dim(0)? == 1 => logits.squeeze(0)?,
        _ => return Err(anyhow!("expected one row of logits, got {:?}", logits.dims())),
    };

    let probs: Vec<f32> = softmax(&row)?.to_vec1()?;
    let index = argmax(&probs).ok_or_else(|| anyhow!("empty logits"))?;
    let label = labels
        .get(index)
        .ok_or_else(|| anyhow!("class index {} has no label ({} labels)", index, labels.len()))?;

    Ok(Prediction {
        label: label.to_string(),
        index,
        score: probs[index],
    })
}
