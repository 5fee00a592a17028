//! Retention policies and log compaction

use super::sample::record_timestamp;
use crate::clock::local_midnight;
use crate::error::MonitorError;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep records younger than the given age
    Rolling(Duration),
    /// Keep records from January 1 of the current year on
    CurrentYear,
}

impl RetentionPolicy {
    /// 24 hours, for the all-measurements log
    pub fn measurements() -> Self {
        RetentionPolicy::Rolling(Duration::hours(24))
    }

    /// 30 days, for the hourly-average log
    pub fn hourly_averages() -> Self {
        RetentionPolicy::Rolling(Duration::days(30))
    }

    /// Current calendar year, for the daily-average log
    pub fn daily_averages() -> Self {
        RetentionPolicy::CurrentYear
    }

    /// Oldest timestamp that is still retained
    pub fn cutoff(&self, now: DateTime<Local>) -> DateTime<Local> {
        match self {
            RetentionPolicy::Rolling(max_age) => now - *max_age,
            RetentionPolicy::CurrentYear => NaiveDate::from_ymd_opt(now.year(), 1, 1)
                .and_then(local_midnight)
                .unwrap_or(now),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompactionStats {
    pub retained: usize,
    pub removed: usize,
}

/// Rewrite `path` keeping only records at or after `cutoff`
///
/// Unparseable and blank lines are dropped. Retained lines keep their original
/// text and order. The new content goes to a sibling temp file that is then
/// renamed over the log. A missing log is a no-op.
pub fn compact_log(path: &Path, cutoff: DateTime<Local>) -> Result<CompactionStats, MonitorError> {
    let compaction = |source| MonitorError::Compaction {
        path: path.to_path_buf(),
        source,
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CompactionStats::default()),
        Err(e) => return Err(compaction(e)),
    };
    let content = String::from_utf8_lossy(&bytes);

    let mut kept = Vec::new();
    let mut removed = 0;
    for line in content.lines() {
        match record_timestamp(line) {
            Some(ts) if ts >= cutoff => kept.push(line),
            _ => removed += 1,
        }
    }

    let stats = CompactionStats {
        retained: kept.len(),
        removed,
    };
    if removed == 0 {
        return Ok(stats);
    }

    let tmp_path = temp_path_for(path);
    let result = write_lines(&tmp_path, &kept).and_then(|_| fs::rename(&tmp_path, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(compaction(e));
    }

    Ok(stats)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".compact.tmp");
    path.with_file_name(name)
}

fn write_lines(path: &Path, lines: &[&str]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    file.sync_all()
}
