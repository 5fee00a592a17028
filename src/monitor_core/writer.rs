//! Append-only writer for the three Log Record files

use super::bucket::BucketAverage;
use super::sample::{format_record, Sample};
use crate::error::MonitorError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One on-disk log in `DD.MM.YYYY HH:MM:SS <value>` format
///
/// The file is opened, written, flushed and closed on every append so a
/// record is durable as soon as the call returns.
#[derive(Debug, Clone)]
pub struct RecordLog {
    path: PathBuf,
}

impl RecordLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append_sample(&self, sample: &Sample) -> Result<(), MonitorError> {
        self.append_line(&sample.to_record())
    }

    pub fn append_average(&self, flushed: &BucketAverage) -> Result<(), MonitorError> {
        self.append_line(&format_record(flushed.window_start, flushed.average))
    }

    fn append_line(&self, record: &str) -> Result<(), MonitorError> {
        let write_failure = |source| MonitorError::WriteFailure {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_failure)?;

        writeln!(file, "{}", record).map_err(write_failure)?;
        file.flush().map_err(write_failure)?;
        Ok(())
    }
}
