//! Hourly and daily aggregation buckets

use super::sample::Sample;
use crate::clock::local_midnight;
use chrono::{DateTime, Duration, Local, Timelike};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Hour,
    Day,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hourly",
            Granularity::Day => "daily",
        }
    }

    /// Start of the hour / local day containing `now`
    pub fn truncate(&self, now: DateTime<Local>) -> DateTime<Local> {
        match self {
            Granularity::Hour => {
                // Step back in absolute time so a repeated wall hour keeps its offset
                let into_hour = Duration::seconds(i64::from(now.minute() * 60 + now.second()))
                    + Duration::nanoseconds(i64::from(now.nanosecond()));
                now - into_hour
            }
            Granularity::Day => local_midnight(now.date_naive()).unwrap_or(now),
        }
    }
}

/// Mean of one flushed bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketAverage {
    pub granularity: Granularity,
    pub window_start: DateTime<Local>,
    pub average: f64,
    pub sample_count: usize,
}

/// Samples accumulated for the current window
#[derive(Debug, Clone)]
pub struct Bucket {
    pub window_start: DateTime<Local>,
    pub samples: Vec<Sample>,
}

impl Bucket {
    pub fn new(window_start: DateTime<Local>) -> Self {
        Self {
            window_start,
            samples: Vec::new(),
        }
    }

    /// Arithmetic mean, finite for any finite inputs
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len() as f64;
        let sum: f64 = self.samples.iter().map(|s| s.value).sum();
        if sum.is_finite() {
            return Some(sum / n);
        }
        // Sum overflowed; scale each term first
        Some(self.samples.iter().map(|s| s.value / n).sum())
    }
}

/// Per-granularity aggregation state machine
///
/// `ingest` appends, `maybe_flush` decides against the supplied clock reading
/// whether the window is over. Neither touches the filesystem.
#[derive(Debug, Clone)]
pub struct Aggregator {
    granularity: Granularity,
    check_interval: Duration,
    bucket: Bucket,
}

impl Aggregator {
    pub fn new(granularity: Granularity, check_interval: Duration, now: DateTime<Local>) -> Self {
        Self {
            granularity,
            check_interval,
            bucket: Bucket::new(granularity.truncate(now)),
        }
    }

    pub fn hourly(check_interval: Duration, now: DateTime<Local>) -> Self {
        Self::new(Granularity::Hour, check_interval, now)
    }

    pub fn daily(check_interval: Duration, now: DateTime<Local>) -> Self {
        Self::new(Granularity::Day, check_interval, now)
    }

    pub fn window_start(&self) -> DateTime<Local> {
        self.bucket.window_start
    }

    pub fn len(&self) -> usize {
        self.bucket.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bucket.samples.is_empty()
    }

    pub fn ingest(&mut self, sample: Sample) {
        self.bucket.samples.push(sample);
    }

    /// Flush the bucket if its window has elapsed
    ///
    /// Hourly: once `check_interval` has passed, a non-empty bucket is averaged,
    /// and the window always moves to the top of the current hour. Idle hours
    /// are skipped, not backfilled.
    ///
    /// Daily: only at 00:00 local, after `check_interval`, with a non-empty
    /// bucket. The next window starts at `now`, not at midnight.
    pub fn maybe_flush(&mut self, now: DateTime<Local>) -> Option<BucketAverage> {
        let elapsed = now - self.bucket.window_start;

        match self.granularity {
            Granularity::Hour => {
                if elapsed < self.check_interval {
                    return None;
                }
                let flushed = self.take_average();
                self.bucket.window_start = Granularity::Hour.truncate(now);
                flushed
            }
            Granularity::Day => {
                let at_midnight = now.hour() == 0 && now.minute() == 0;
                if !at_midnight || elapsed < self.check_interval || self.is_empty() {
                    return None;
                }
                let flushed = self.take_average();
                self.bucket.window_start = now;
                flushed
            }
        }
    }

    fn take_average(&mut self) -> Option<BucketAverage> {
        let average = self.bucket.average()?;
        let flushed = BucketAverage {
            granularity: self.granularity,
            window_start: self.bucket.window_start,
            average,
            sample_count: self.bucket.samples.len(),
        };
        self.bucket.samples.clear();
        Some(flushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn sample(ts: DateTime<Local>, value: f64) -> Sample {
        Sample::new(ts, value)
    }

    #[test]
    fn test_initial_window_is_aligned() {
        let now = at(2024, 6, 1, 10, 37, 12);

        let hourly = Aggregator::hourly(Duration::hours(1), now);
        assert_eq!(hourly.window_start(), at(2024, 6, 1, 10, 0, 0));

        let daily = Aggregator::daily(Duration::hours(23), now);
        assert_eq!(daily.window_start(), at(2024, 6, 1, 0, 0, 0));
    }

    #[test]
    fn test_hour_truncation_aligned_every_hour_of_year() {
        // Covers both DST transitions of whatever zone the tests run in
        let start = at(2024, 1, 1, 0, 30, 0);
        for hour in 0..(366 * 24) {
            let now = start + Duration::hours(hour);
            let top = Granularity::Hour.truncate(now);

            assert_eq!((top.minute(), top.second(), top.nanosecond()), (0, 0, 0), "{}", now);
            let into_hour = now - top;
            assert!(into_hour >= Duration::zero() && into_hour < Duration::hours(1), "{}", now);
        }
    }

    #[test]
    fn test_mean_of_huge_values_stays_finite() {
        let mut agg = Aggregator::hourly(Duration::hours(1), at(2024, 6, 1, 10, 5, 0));
        agg.ingest(sample(at(2024, 6, 1, 10, 15, 0), 1e308));
        agg.ingest(sample(at(2024, 6, 1, 10, 45, 0), 1e308));

        let flushed = agg.maybe_flush(at(2024, 6, 1, 11, 0, 10)).unwrap();
        assert!(flushed.average.is_finite());
        assert_eq!(flushed.average, 1e308);
    }

    #[test]
    fn test_mean_when_sum_overflows() {
        let mut bucket = Bucket::new(at(2024, 6, 1, 10, 0, 0));
        bucket.samples.push(sample(at(2024, 6, 1, 10, 1, 0), f64::MAX));
        bucket.samples.push(sample(at(2024, 6, 1, 10, 2, 0), f64::MAX));
        bucket.samples.push(sample(at(2024, 6, 1, 10, 3, 0), -f64::MAX));

        assert_eq!(bucket.average(), Some(f64::MAX / 3.0));
    }

    #[test]
    fn test_hourly_flush_computes_mean() {
        let mut agg = Aggregator::hourly(Duration::hours(1), at(2024, 6, 1, 10, 5, 0));
        agg.ingest(sample(at(2024, 6, 1, 10, 15, 0), 21.5));
        agg.ingest(sample(at(2024, 6, 1, 10, 45, 0), 22.5));

        assert!(agg.maybe_flush(at(2024, 6, 1, 10, 59, 59)).is_none());
        assert_eq!(agg.len(), 2);

        let flushed = agg.maybe_flush(at(2024, 6, 1, 11, 0, 10)).unwrap();
        assert_eq!(flushed.granularity, Granularity::Hour);
        assert_eq!(flushed.window_start, at(2024, 6, 1, 10, 0, 0));
        assert_eq!(flushed.average, 22.0);
        assert_eq!(flushed.sample_count, 2);
        assert!(agg.is_empty());
        assert_eq!(agg.window_start(), at(2024, 6, 1, 11, 0, 0));
    }

    #[test]
    fn test_hourly_empty_bucket_advances_without_flush() {
        let mut agg = Aggregator::hourly(Duration::hours(1), at(2024, 6, 1, 10, 5, 0));

        assert!(agg.maybe_flush(at(2024, 6, 1, 13, 20, 0)).is_none());
        assert_eq!(agg.window_start(), at(2024, 6, 1, 13, 0, 0));
    }

    #[test]
    fn test_hourly_skips_idle_hours() {
        let mut agg = Aggregator::hourly(Duration::hours(1), at(2024, 6, 1, 10, 5, 0));
        agg.ingest(sample(at(2024, 6, 1, 10, 15, 0), 20.0));

        let flushed = agg.maybe_flush(at(2024, 6, 1, 14, 30, 0)).unwrap();
        assert_eq!(flushed.window_start, at(2024, 6, 1, 10, 0, 0));
        assert_eq!(agg.window_start(), at(2024, 6, 1, 14, 0, 0));
    }

    #[test]
    fn test_short_check_interval() {
        let mut agg = Aggregator::hourly(Duration::seconds(10), at(2024, 6, 1, 10, 0, 0));
        agg.ingest(sample(at(2024, 6, 1, 10, 0, 1), 18.0));

        let flushed = agg.maybe_flush(at(2024, 6, 1, 10, 0, 10)).unwrap();
        assert_eq!(flushed.average, 18.0);
        assert_eq!(agg.window_start(), at(2024, 6, 1, 10, 0, 0));
    }

    #[test]
    fn test_daily_requires_midnight() {
        let mut agg = Aggregator::daily(Duration::hours(23), at(2024, 6, 1, 8, 0, 0));
        agg.ingest(sample(at(2024, 6, 1, 9, 0, 0), 10.0));
        agg.ingest(sample(at(2024, 6, 1, 21, 0, 0), 20.0));

        // Interval elapsed but not at 00:00
        assert!(agg.maybe_flush(at(2024, 6, 1, 23, 59, 0)).is_none());
        assert!(agg.maybe_flush(at(2024, 6, 2, 0, 1, 0)).is_none());
        assert_eq!(agg.len(), 2);

        let midnight = at(2024, 6, 2, 0, 0, 30);
        let flushed = agg.maybe_flush(midnight).unwrap();
        assert_eq!(flushed.granularity, Granularity::Day);
        assert_eq!(flushed.window_start, at(2024, 6, 1, 0, 0, 0));
        assert_eq!(flushed.average, 15.0);
        assert_eq!(agg.window_start(), midnight);
    }

    #[test]
    fn test_daily_empty_bucket_does_not_advance() {
        let start = at(2024, 6, 1, 8, 0, 0);
        let mut agg = Aggregator::daily(Duration::hours(23), start);

        assert!(agg.maybe_flush(at(2024, 6, 2, 0, 0, 5)).is_none());
        assert_eq!(agg.window_start(), at(2024, 6, 1, 0, 0, 0));
    }

    #[test]
    fn test_daily_needs_check_interval() {
        let mut agg = Aggregator::daily(Duration::hours(23), at(2024, 6, 1, 8, 0, 0));
        agg.ingest(sample(at(2024, 6, 1, 9, 0, 0), 10.0));

        let midnight = at(2024, 6, 2, 0, 0, 20);
        assert!(agg.maybe_flush(midnight).is_some());

        // Next midnight check in the same minute: interval not elapsed
        agg.ingest(sample(at(2024, 6, 2, 0, 0, 25), 11.0));
        assert!(agg.maybe_flush(at(2024, 6, 2, 0, 0, 40)).is_none());
        assert_eq!(agg.len(), 1);
    }
}
