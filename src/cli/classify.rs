//! One-shot classification command

use anyhow::Result;

use super::ModelArgs;
use crate::engine::{Executor, TextClassifier};

/// Classify texts from the command line
pub async fn classify(args: ModelArgs, texts: Vec<String>) -> Result<()> {
    let config = args.load_config()?;

    let predictions = tokio::task::spawn_blocking(move || {
        let executor = Executor::load(&config)?;
        executor.classify(&texts)
    })
    .await??;

    for prediction in predictions {
        tracing::debug!("{} ({:.4})", prediction.label, prediction.score);
        println!("{}", prediction.label);
    }

    Ok(())
}
