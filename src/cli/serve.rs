//! HTTP server command

use std::sync::Arc;

use anyhow::Result;

use super::ModelArgs;
use crate::engine::{Executor, TextClassifier};
use crate::server;

/// Start the inference server
pub async fn serve(args: ModelArgs, port: Option<u16>, host: Option<String>) -> Result<()> {
    let mut config = args.load_config()?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }

    // Model load is blocking and must finish before the listener opens.
    let load_config = config.clone();
    let executor = tokio::task::spawn_blocking(move || -> Result<Executor> {
        let executor = Executor::load(&load_config)?;
        if load_config.inference.warmup {
            executor.warmup()?;
        }
        Ok(executor)
    })
    .await??;

    tracing::info!(
        "Labels: {}",
        executor.labels().iter().collect::<Vec<_>>().join(", ")
    );

    let classifier: Arc<dyn TextClassifier> = Arc::new(executor);
    server::start(classifier, config.server).await
}
