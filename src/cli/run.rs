use crate::config::{load_config_or_default, Config};
use crate::pipeline::{Dispatcher, RunSummary, TracingSink};
use crate::producer::{run_producer, MessageGenerator, MessageWriter};
use crate::source::TailReader;
use std::path::Path;
use thiserror::Error;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("source reader error: {0}")]
    SourceReader(#[from] crate::source::ReaderError),

    #[error("producer error: {0}")]
    Producer(#[from] crate::producer::ProducerError),
}

pub async fn consume(config_path: Option<&Path>) -> Result<RunSummary, RunError> {
    let config = load(config_path)?;

    info!(
        path = %config.file.path.display(),
        alert_threshold = config.consumer.alert_threshold,
        window_secs = config.consumer.window.as_secs(),
        "Starting consumer"
    );

    // A missing file is fatal; the producer is expected to create it first
    let reader = TailReader::open(&config.file.path)?;
    let mut dispatcher = Dispatcher::new(reader, &config.consumer, TracingSink);

    let shutdown_rx = shutdown_on_ctrl_c();
    let summary = dispatcher.run(shutdown_rx).await?;

    info!("Consumer stopped");
    Ok(summary)
}

pub async fn produce(config_path: Option<&Path>) -> Result<u64, RunError> {
    let config = load(config_path)?;

    info!(
        interval_secs = config.producer.interval.as_secs_f64(),
        "Messages will be sent every {} seconds",
        config.producer.interval.as_secs_f64()
    );
    info!("Hit CTRL+C to stop");

    let mut writer = MessageWriter::open(&config.file.path)?;
    let shutdown_rx = shutdown_on_ctrl_c();
    let written = run_producer(
        &mut writer,
        MessageGenerator::from_entropy(),
        config.producer.interval,
        shutdown_rx,
    )
    .await?;

    Ok(written)
}

fn load(config_path: Option<&Path>) -> Result<Config, RunError> {
    match config_path {
        Some(path) => info!(config_path = %path.display(), "Loading configuration"),
        None => info!("No config file found, using defaults and environment"),
    }
    Ok(load_config_or_default(config_path)?)
}

/// Flip the returned receiver to `true` on the first Ctrl+C.
fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, finishing current message");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                // Keep the sender alive so the pipeline is not stopped by the drop
                std::future::pending::<()>().await;
            }
        }
    });

    shutdown_rx
}
