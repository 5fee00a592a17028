//! # tempflow
//!
//! Telemetry aggregation daemon for a single metric stream.
//!
//! ## Architecture
//!
//! ```text
//! source file (virtual_port.txt) → TailReader → Sample
//!     ↓
//! RecordLog (all_measurements.log)
//!     ↓
//! Aggregator (hour) / Aggregator (day) → hourly_average.log / daily_average.log
//!     ↓
//! RetentionPolicy + compact_log (24h / 30d / current year)
//! ```
//!
//! One cycle runs to completion before the next tick; see [`monitor_core::Monitor`].

pub mod clock;
pub mod config;
pub mod error;
pub mod monitor_core;
pub mod persistence;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, MonitorConfig};
pub use error::MonitorError;
