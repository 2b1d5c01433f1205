//! Bar aggregation into coarser intervals
//!
//! Two independent strategies: grouping a fixed number of source bars, and
//! aligning bars to fixed-length time buckets. Both are single O(n) passes and
//! return an empty series for empty input.

use crate::bar::{Bar, Candle};
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

/// Running OHLC accumulator for one output bar.
struct PendingBar {
    open_time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: Option<f64>,
}

impl PendingBar {
    fn start<B: Bar>(bar: &B, open_time: DateTime<Utc>) -> Self {
        Self {
            open_time,
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
            volume: bar.volume(),
        }
    }

    fn extend<B: Bar>(&mut self, bar: &B) {
        self.high = self.high.max(bar.high());
        self.low = self.low.min(bar.low());
        self.close = bar.close();
        self.volume = match (self.volume, bar.volume()) {
            (Some(total), Some(v)) => Some(total + v),
            (total, v) => total.or(v),
        };
    }

    fn finish(self, interval: Duration) -> Candle {
        Candle {
            open_time: self.open_time,
            interval,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// Group every `count` consecutive bars into one.
///
/// The final group may hold fewer bars and is still emitted. The output
/// interval is `count` times the interval of the group's first bar. A `count`
/// of zero, or one whose scaled interval overflows, yields an empty series.
pub fn aggregate_by_count<B: Bar>(bars: &[B], count: usize) -> Vec<Candle> {
    if count == 0 || bars.is_empty() {
        return Vec::new();
    }

    let aggregated: Option<Vec<Candle>> = bars
        .chunks(count)
        .map(|group| {
            let (first, rest) = group.split_first()?;
            let interval = scaled_interval(first.interval(), count)?;
            let mut pending = PendingBar::start(first, first.open_time());
            for bar in rest {
                pending.extend(bar);
            }
            Some(pending.finish(interval))
        })
        .collect();

    let Some(aggregated) = aggregated else {
        warn!("Scaled interval overflows for count {}, no bars aggregated", count);
        return Vec::new();
    };

    debug!(
        "Aggregated {} bars by count {} into {} bars",
        bars.len(),
        count,
        aggregated.len()
    );
    aggregated
}

/// `interval * count` at millisecond precision, `None` on overflow
fn scaled_interval(interval: Duration, count: usize) -> Option<Duration> {
    let count = i64::try_from(count).ok()?;
    let millis = interval.num_milliseconds().checked_mul(count)?;
    Duration::try_milliseconds(millis)
}

/// Align bars to fixed time buckets of length `target`.
///
/// The bucket of a bar is `floor(open_time / target)`. Consecutive bars
/// sharing a bucket extend the current output bar; a bucket change flushes it
/// and starts a new bar anchored at `bucket * target`. A non-positive target
/// yields an empty series.
pub fn aggregate_to_interval<B: Bar>(bars: &[B], target: Duration) -> Vec<Candle> {
    let target_ms = target.num_milliseconds();
    if target_ms <= 0 || bars.is_empty() {
        return Vec::new();
    }

    let mut aggregated = Vec::new();
    let mut current: Option<(i64, PendingBar)> = None;

    for bar in bars {
        let bucket = bar.open_time().timestamp_millis().div_euclid(target_ms);

        match current.as_mut() {
            Some((active, pending)) if *active == bucket => pending.extend(bar),
            _ => {
                if let Some((_, pending)) = current.take() {
                    aggregated.push(pending.finish(target));
                }
                let anchor =
                    DateTime::from_timestamp_millis(bucket * target_ms).unwrap_or(bar.open_time());
                current = Some((bucket, PendingBar::start(bar, anchor)));
            }
        }
    }

    if let Some((_, pending)) = current {
        aggregated.push(pending.finish(target));
    }

    debug!(
        "Aligned {} bars to {}s buckets, produced {} bars",
        bars.len(),
        target.num_seconds(),
        aggregated.len()
    );
    aggregated
}
