//! Core inference engine
//!
//! This module provides the classification pipeline:
//! - Executor: tokenize, forward, softmax, argmax, label
//! - postprocess: logits to [`Prediction`]

mod executor;
pub mod postprocess;

pub use executor::{Executor, TextClassifier};
pub use postprocess::Prediction;
