//! Monitor Core - Ingestion, Aggregation and Retention
//!
//! # Architecture
//!
//! ```text
//! Source file → TailReader (byte cursor) → Sample
//!     ↓
//! RecordLog (all_measurements.log, one record per sample)
//!     ↓
//! Aggregator::hourly / Aggregator::daily (maybe_flush on clock boundaries)
//!     ↓
//! RecordLog (hourly_average.log / daily_average.log)
//!     ↓
//! compact_log per RetentionPolicy (24h / 30d / current year)
//! ```

pub mod bucket;
pub mod monitor;
pub mod reader;
pub mod retention;
pub mod sample;
pub mod writer;

pub use bucket::{Aggregator, Bucket, BucketAverage, Granularity};
pub use monitor::{CycleReport, Monitor};
pub use reader::{PollOutcome, TailReader};
pub use retention::{compact_log, CompactionStats, RetentionPolicy};
pub use sample::{format_record, ParseError, Sample};
pub use writer::RecordLog;
