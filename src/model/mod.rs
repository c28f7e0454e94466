//! Model architecture components.
//!
//! This module contains the classifier configuration and the BERT
//! sequence-classification network.

mod classifier;
mod config;

pub use classifier::BertClassifier;
pub use config::ClassifierConfig;

#[cfg(test)]
pub(crate) use classifier::tiny_checkpoint;
#[cfg(test)]
pub(crate) use config::TINY_BERT_CONFIG;
