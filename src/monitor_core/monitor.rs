//! Cycle driver: tail → aggregate → compact, once per tick

use super::bucket::{Aggregator, BucketAverage, Granularity};
use super::reader::TailReader;
use super::retention::{compact_log, RetentionPolicy};
use super::sample::format_timestamp;
use super::writer::RecordLog;
use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::persistence::{load_cursor, save_cursor, CursorSnapshot};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};

/// What one cycle did
#[derive(Debug, Default, Clone)]
pub struct CycleReport {
    pub source_available: bool,
    pub samples_ingested: usize,
    pub lines_rejected: usize,
    pub write_failures: usize,
    pub hourly: Option<BucketAverage>,
    pub daily: Option<BucketAverage>,
    pub records_pruned: usize,
}

pub struct Monitor {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    reader: TailReader,
    measurements: RecordLog,
    hourly_log: RecordLog,
    daily_log: RecordLog,
    hourly: Aggregator,
    daily: Aggregator,
    saved_position: (u64, Option<u64>),
    total_ingested: u64,
}

impl Monitor {
    /// Build the monitor; any error here is fatal
    pub fn new(config: MonitorConfig, clock: Arc<dyn Clock>) -> Result<Self, MonitorError> {
        config.validate()?;

        std::fs::create_dir_all(&config.log_dir).map_err(|e| {
            MonitorError::Setup(format!(
                "cannot create log directory {}: {}",
                config.log_dir.display(),
                e
            ))
        })?;

        let resumed = match &config.cursor_state_path {
            Some(state_path) => load_cursor(state_path, &config.source_path)?,
            None => None,
        };
        let position = resumed.map_or((0, None), |snapshot| (snapshot.offset, snapshot.inode));

        let now = clock.now();
        let hourly = Aggregator::hourly(config.hourly_check(), now);
        let daily = Aggregator::daily(config.daily_check(), now);

        Ok(Self {
            reader: TailReader::resume(config.source_path.clone(), position.0, position.1),
            measurements: RecordLog::new(config.all_measurements_path()),
            hourly_log: RecordLog::new(config.hourly_average_path()),
            daily_log: RecordLog::new(config.daily_average_path()),
            hourly,
            daily,
            saved_position: position,
            total_ingested: 0,
            config,
            clock,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn cursor(&self) -> u64 {
        self.reader.cursor()
    }

    pub fn hourly(&self) -> &Aggregator {
        &self.hourly
    }

    pub fn daily(&self) -> &Aggregator {
        &self.daily
    }

    /// Samples accepted since construction
    pub fn total_ingested(&self) -> u64 {
        self.total_ingested
    }

    /// Run forever, one cycle per poll interval
    pub async fn run(&mut self) {
        log::info!(
            "⏰ Starting monitor loop (interval: {}s)",
            self.config.poll_interval_secs
        );

        let mut timer = interval(self.config.poll_interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            let report = self.run_cycle().await;
            log::debug!(
                "Cycle done: {} ingested, {} rejected, {} pruned",
                report.samples_ingested,
                report.lines_rejected,
                report.records_pruned
            );
        }
    }

    /// One full pass; never fails, errors are logged and retried next tick
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        self.ingest(&mut report).await;

        let now = self.clock.now();
        report.hourly = self.flush(Granularity::Hour, now);
        report.daily = self.flush(Granularity::Day, now);

        report.records_pruned = self.compact(now);
        report
    }

    async fn ingest(&mut self, report: &mut CycleReport) {
        let outcome = match self.reader.poll().await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("❌ {}", e);
                return;
            }
        };

        report.source_available = true;
        report.lines_rejected = outcome.rejected;

        for sample in outcome.samples {
            if let Err(e) = self.measurements.append_sample(&sample) {
                log::warn!("⚠️  {}", e);
                report.write_failures += 1;
            }
            self.hourly.ingest(sample);
            self.daily.ingest(sample);
            report.samples_ingested += 1;
            log::info!("🌡️  Received: {:.2}", sample.value);
        }
        self.total_ingested += report.samples_ingested as u64;

        self.persist_cursor();
    }

    fn flush(&mut self, granularity: Granularity, now: DateTime<Local>) -> Option<BucketAverage> {
        let (aggregator, record_log) = match granularity {
            Granularity::Hour => (&mut self.hourly, &self.hourly_log),
            Granularity::Day => (&mut self.daily, &self.daily_log),
        };

        let flushed = aggregator.maybe_flush(now)?;
        log::info!(
            "📊 {} average for {}: {:.2} ({} samples)",
            flushed.granularity.as_str(),
            format_timestamp(flushed.window_start),
            flushed.average,
            flushed.sample_count
        );
        if let Err(e) = record_log.append_average(&flushed) {
            log::warn!("⚠️  {}", e);
        }
        Some(flushed)
    }

    fn compact(&self, now: DateTime<Local>) -> usize {
        let targets = [
            (&self.measurements, RetentionPolicy::measurements()),
            (&self.hourly_log, RetentionPolicy::hourly_averages()),
            (&self.daily_log, RetentionPolicy::daily_averages()),
        ];

        let mut pruned = 0;
        for (record_log, policy) in targets {
            match compact_log(record_log.path(), policy.cutoff(now)) {
                Ok(stats) => {
                    if stats.removed > 0 {
                        log::info!(
                            "🧹 Pruned {} records from {} ({} kept)",
                            stats.removed,
                            record_log.path().display(),
                            stats.retained
                        );
                    }
                    pruned += stats.removed;
                }
                Err(e) => log::warn!("⚠️  {}", e),
            }
        }
        pruned
    }

    fn persist_cursor(&mut self) {
        let Some(state_path) = &self.config.cursor_state_path else {
            return;
        };
        let position = (self.reader.cursor(), self.reader.inode());
        if position == self.saved_position {
            return;
        }

        let snapshot = CursorSnapshot {
            source_path: self.config.source_path.clone(),
            offset: position.0,
            inode: position.1,
            saved_at: self.clock.now(),
        };
        match save_cursor(&snapshot, state_path) {
            Ok(()) => self.saved_position = position,
            Err(e) => log::warn!("Failed to save cursor: {}", e),
        }
    }
}
