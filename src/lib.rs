//! Classr - HTTP inference server for a BERT news classifier
//!
//! Serves a `bert-large-uncased` sequence classifier fine-tuned on AG News.
//! The tokenizer and weights are loaded once at start-up; each request is
//! tokenized, run through the model, and mapped to one of `World`,
//! `Sports`, `Business` or `Sci/Tech`.
//!
//! # Example
//!
//! ```bash
//! # Start server
//! classr serve --model-dir ../models/bert-large-uncased-trained --port 8080
//!
//! curl -X POST -d '{"instances": [{"text": "Fears for T N pension after talks"}]}' \
//!     localhost:8080/predict
//! # {"predictions":["Business"]}
//!
//! # Classify without a server
//! classr classify "Late goal sends United through"
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod labels;
pub mod loader;
pub mod model;
pub mod server;
pub mod tokenizer;

// Re-export key types
pub use config::{ClassrConfig, InferenceConfig, ServerConfig};
pub use engine::{Executor, Prediction, TextClassifier};
pub use labels::LabelMap;
