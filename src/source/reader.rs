use std::fs::{File, Metadata};
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("source unavailable '{}': {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single line read from the tailed file, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub text: String,
    /// Byte offset of the start of the line within the file
    pub offset: u64,
}

/// Result of a single read attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(LogRecord),
    /// No complete line is available yet; retry later from the same offset.
    Pending,
}

/// Follows a file from its end, yielding only lines appended after `open`.
pub struct TailReader {
    path: PathBuf,
    file: Option<BufReader<File>>,
    offset: u64,
    file_inode: u64,
    stalled: bool,
}

impl TailReader {
    /// Open the file and position the cursor at its current end.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let path = path.as_ref().to_path_buf();
        let unavailable = |source| ReaderError::SourceUnavailable {
            path: path.clone(),
            source,
        };

        let file = File::open(&path).map_err(unavailable)?;
        let metadata = file.metadata().map_err(unavailable)?;
        if metadata.is_dir() {
            return Err(unavailable(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path is a directory",
            )));
        }

        let mut buf_reader = BufReader::new(file);
        let offset = buf_reader.seek(SeekFrom::End(0))?;
        debug!(path = %path.display(), offset, "Attached to end of file");

        Ok(Self {
            file_inode: get_inode(&metadata),
            path,
            file: Some(buf_reader),
            offset,
            stalled: false,
        })
    }

    /// Attempt to read the next newline-terminated line.
    ///
    /// An unterminated trailing line is left in place and reported as
    /// `Pending`, so it is delivered whole once the writer finishes it.
    pub fn next_line(&mut self) -> Result<ReadOutcome, ReaderError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(ReadOutcome::Pending);
        };

        let mut buf = Vec::new();
        let bytes_read = file.read_until(b'\n', &mut buf)?;

        if bytes_read == 0 {
            self.check_source_replaced()?;
            return Ok(ReadOutcome::Pending);
        }

        if buf.last() != Some(&b'\n') {
            // Partial line: rewind so the next attempt starts at the line boundary
            file.seek(SeekFrom::Start(self.offset))?;
            return Ok(ReadOutcome::Pending);
        }

        let line_start_offset = self.offset;
        self.offset += bytes_read as u64;
        self.stalled = false;

        let text = String::from_utf8_lossy(&buf);
        let text = text.trim_end_matches(&['\n', '\r'][..]).to_string();

        Ok(ReadOutcome::Line(LogRecord {
            text,
            offset: line_start_offset,
        }))
    }

    /// Byte offset just past the last delivered line
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Release the file handle. Subsequent reads report `Pending`.
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            debug!(path = %self.path.display(), offset = self.offset, "Released file handle");
        }
    }

    /// Detect truncation or replacement of the followed file.
    ///
    /// Recovery is not attempted: the reader keeps its offset and stalls
    /// until the file grows past it again. Only the first detection is logged.
    fn check_source_replaced(&mut self) -> Result<(), ReaderError> {
        let Some(file) = self.file.as_ref() else {
            return Ok(());
        };

        let len = file.get_ref().metadata()?.len();
        let truncated = len < self.offset;

        let rotated = match std::fs::metadata(&self.path) {
            Ok(metadata) => get_inode(&metadata) != self.file_inode,
            // Removed, or no longer reachable; our handle is still valid either way
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Followed path not accessible");
                true
            }
        };

        if (truncated || rotated) && !self.stalled {
            warn!(
                path = %self.path.display(),
                offset = self.offset,
                file_len = len,
                truncated,
                rotated,
                "Followed file was truncated or replaced, reader will stall"
            );
            self.stalled = true;
        }

        Ok(())
    }
}

#[cfg(unix)]
fn get_inode(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
fn get_inode(_metadata: &Metadata) -> u64 {
    // No stable file identity; rotation detection falls back to truncation only
    0
}
