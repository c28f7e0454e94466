//! Model info command

use std::path::Path;

use anyhow::Result;

use super::ModelArgs;
use crate::loader::{self, ModelFormat};
use crate::model::ClassifierConfig;
use crate::tokenizer::Tokenizer;

/// Show model information
pub async fn info(args: ModelArgs) -> Result<()> {
    let config = args.load_config()?;
    let model_dir = config.model_dir();

    println!("Model: {}\n", config.model.name);
    println!("Path: {}", model_dir.display());

    let files = loader::resolve_model_files(&model_dir, &config.model.name)?;

    let format = match files.weights.format {
        ModelFormat::SafeTensors => "SafeTensors",
        ModelFormat::PyTorch => "PyTorch",
        ModelFormat::Keras => "Keras HDF5",
    };
    println!("Format: {}", format);
    println!("Weights: {}", files.weights.weights_path.display());
    println!("Config: {}", files.config_path.display());
    println!("Tokenizer: {}\n", files.tokenizer_path.display());

    print_bert_info(&files.config_path)?;

    let tokenizer = Tokenizer::from_file(&files.tokenizer_path, config.inference.max_length)?;
    println!("\nTokenizer vocab: {}", tokenizer.vocab_size());
    println!("Max length: {}", config.inference.max_length);

    println!("\nLabels:");
    for (index, label) in config.labels.iter().enumerate() {
        println!("  {}: {}", index, label);
    }

    if let Ok(metadata) = std::fs::metadata(&files.weights.weights_path) {
        let size_gb = metadata.len() as f64 / (1024.0 * 1024.0 * 1024.0);
        if size_gb >= 1.0 {
            println!("\nWeights size: {:.2} GB", size_gb);
        } else {
            let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
            println!("\nWeights size: {:.2} MB", size_mb);
        }
    }

    Ok(())
}

fn print_bert_info(config_path: &Path) -> Result<()> {
    let config = ClassifierConfig::load(config_path)?;
    let bert = &config.bert;

    println!("Configuration:");
    if let Some(ref model_type) = bert.model_type {
        println!("  Architecture: {}", model_type);
    }
    println!("  Hidden size: {}", bert.hidden_size);
    println!("  Layers: {}", bert.num_hidden_layers);
    println!("  Attention heads: {}", bert.num_attention_heads);
    println!("  Vocab size: {}", bert.vocab_size);
    println!("  Max context: {}", bert.max_position_embeddings);
    println!("  FFN dim: {}", bert.intermediate_size);
    match config.num_labels {
        Some(n) => println!("  Classifier outputs: {}", n),
        None => println!("  Classifier outputs: from label map"),
    }

    Ok(())
}
