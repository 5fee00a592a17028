//! Cursor-based tail reader for the growing source file

use super::sample::Sample;
use crate::error::MonitorError;
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// Result of one pass over the newly appended bytes
#[derive(Debug, Default)]
pub struct PollOutcome {
    /// Accepted samples, in file order
    pub samples: Vec<Sample>,
    /// Lines that failed to parse and were skipped
    pub rejected: usize,
    /// Bytes consumed by this pass
    pub bytes_read: u64,
}

pub struct TailReader {
    path: PathBuf,
    cursor: u64,
    inode: Option<u64>,
}

impl TailReader {
    pub fn new(path: PathBuf) -> Self {
        Self::resume(path, 0, None)
    }

    /// Resume from a persisted byte offset
    ///
    /// With `inode` set, a source replaced while the daemon was down is read
    /// from the start even if it is longer than `cursor`.
    pub fn resume(path: PathBuf, cursor: u64, inode: Option<u64>) -> Self {
        Self {
            path,
            cursor,
            inode,
        }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Inode of the source as of the last poll
    pub fn inode(&self) -> Option<u64> {
        self.inode
    }

    /// Read every complete line appended since the last poll
    ///
    /// A trailing line without a newline is left for the next poll. The cursor
    /// only moves backwards when the source was truncated or replaced.
    pub async fn poll(&mut self) -> Result<PollOutcome, MonitorError> {
        let unavailable = |source| MonitorError::SourceUnavailable {
            path: self.path.clone(),
            source,
        };

        let file = File::open(&self.path).await.map_err(unavailable)?;
        let metadata = file.metadata().await.map_err(unavailable)?;

        if self.detect_rotation(&metadata) {
            log::warn!(
                "🔄 Source truncated or replaced, reading from start: {}",
                self.path.display()
            );
            self.cursor = 0;
        }

        #[cfg(unix)]
        {
            self.inode = Some(metadata.ino());
        }

        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(self.cursor))
            .await
            .map_err(unavailable)?;

        let mut outcome = PollOutcome::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = match reader.read_until(b'\n', &mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    log::warn!("Read error on {} at offset {}: {}", self.path.display(), self.cursor, e);
                    break;
                }
            };
            if n == 0 {
                break;
            }
            if buf.last() != Some(&b'\n') {
                log::debug!("Partial line at offset {}, waiting for the rest", self.cursor);
                break;
            }

            self.cursor += n as u64;
            outcome.bytes_read += n as u64;

            let line = String::from_utf8_lossy(&buf);
            match Sample::from_line(&line) {
                Ok(Some(sample)) => {
                    log::debug!("Read line: {}", line.trim_end());
                    outcome.samples.push(sample);
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!(
                        "⚠️  Skipping malformed line {:?}: {}",
                        line.trim_end(),
                        MonitorError::from(e)
                    );
                    outcome.rejected += 1;
                }
            }
        }

        Ok(outcome)
    }

    fn detect_rotation(&self, metadata: &std::fs::Metadata) -> bool {
        if metadata.len() < self.cursor {
            return true;
        }

        #[cfg(unix)]
        {
            self.inode.map_or(false, |old| old != metadata.ino())
        }

        #[cfg(not(unix))]
        {
            false
        }
    }
}
