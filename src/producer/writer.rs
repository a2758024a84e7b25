use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("failed to open '{}' for appending: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Appends newline-terminated records to the shared file.
pub struct MessageWriter {
    path: PathBuf,
    file: File,
    written: u64,
}

impl MessageWriter {
    /// Open `path` for appending, creating it and its parent directories if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProducerError> {
        let path = path.as_ref().to_path_buf();
        let open_error = |source| ProducerError::Open {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(open_error)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_error)?;

        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    /// Write one record and flush it so a tailing reader sees it immediately.
    /// Embedded line breaks are replaced so one call is always one line.
    pub fn append(&mut self, message: &str) -> Result<(), ProducerError> {
        let line = message.replace(['\r', '\n'], " ");
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Drain `messages` into `writer`, one every `interval`, until the iterator
/// ends or `shutdown` becomes true. Returns the number of messages written.
pub async fn run_producer<I>(
    writer: &mut MessageWriter,
    messages: I,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<u64, ProducerError>
where
    I: IntoIterator<Item = String>,
{
    info!(
        path = %writer.path().display(),
        interval_secs = interval.as_secs_f64(),
        "Producer started"
    );

    for message in messages {
        if *shutdown.borrow() {
            break;
        }

        writer.append(&message)?;
        info!("[BUZZ] {}", message);

        tokio::select! {
            _ = sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    debug!("Shutdown sender dropped, stopping producer");
                    break;
                }
            }
        }
    }

    info!(written = writer.written(), "Producer stopped");
    Ok(writer.written())
}
