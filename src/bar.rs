//! OHLC bar capability and the concrete candle type
//!
//! Every analysis routine in the crate is generic over [`Bar`], so a host
//! application can hand in its own kline representation without copying it
//! into [`Candle`] first.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Read-only view of one OHLC observation.
///
/// Implementations must satisfy `high >= max(open, close)` and
/// `low <= min(open, close)`. A series is a slice of bars with strictly
/// increasing `open_time`; this is a caller precondition and is not checked.
#[cfg_attr(test, mockall::automock)]
pub trait Bar {
    /// Start of the bar.
    fn open_time(&self) -> DateTime<Utc>;

    /// Duration covered by the bar, always positive.
    fn interval(&self) -> Duration;

    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    /// Traded volume, if the data source provides it.
    fn volume(&self) -> Option<f64> {
        None
    }

    /// Bullish bar (close at or above open)
    fn is_long(&self) -> bool {
        self.open() <= self.close()
    }

    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    fn upper_wick(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    fn lower_wick(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    /// Midpoint between open and close
    fn center_price(&self) -> f64 {
        self.open() + (self.close() - self.open()) / 2.0
    }

    fn close_time(&self) -> DateTime<Utc> {
        self.open_time() + self.interval()
    }

    fn center_time(&self) -> DateTime<Utc> {
        self.open_time() + self.interval() / 2
    }
}

/// Owned OHLC bar produced by the resampler and used by the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    #[serde(with = "interval_seconds")]
    pub interval: Duration,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Candle {
    pub fn new(
        open_time: DateTime<Utc>,
        interval: Duration,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Self {
        Self {
            open_time,
            interval,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Copy any bar into an owned candle.
    pub fn from_bar<B: Bar + ?Sized>(bar: &B) -> Self {
        Self {
            open_time: bar.open_time(),
            interval: bar.interval(),
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
            volume: bar.volume(),
        }
    }
}

impl Bar for Candle {
    fn open_time(&self) -> DateTime<Utc> {
        self.open_time
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> Option<f64> {
        self.volume
    }
}

impl<B: Bar + ?Sized> Bar for &B {
    fn open_time(&self) -> DateTime<Utc> {
        (**self).open_time()
    }

    fn interval(&self) -> Duration {
        (**self).interval()
    }

    fn open(&self) -> f64 {
        (**self).open()
    }

    fn high(&self) -> f64 {
        (**self).high()
    }

    fn low(&self) -> f64 {
        (**self).low()
    }

    fn close(&self) -> f64 {
        (**self).close()
    }

    fn volume(&self) -> Option<f64> {
        (**self).volume()
    }
}

pub fn closes<B: Bar>(bars: &[B]) -> Vec<f64> {
    bars.iter().map(|b| b.close()).collect()
}

pub fn highs<B: Bar>(bars: &[B]) -> Vec<f64> {
    bars.iter().map(|b| b.high()).collect()
}

pub fn lows<B: Bar>(bars: &[B]) -> Vec<f64> {
    bars.iter().map(|b| b.low()).collect()
}

/// Lowest low and highest high of the series, `None` when empty.
pub fn price_range<B: Bar>(bars: &[B]) -> Option<(f64, f64)> {
    if bars.is_empty() {
        return None;
    }
    let low = bars.iter().map(|b| b.low()).fold(f64::INFINITY, f64::min);
    let high = bars
        .iter()
        .map(|b| b.high())
        .fold(f64::NEG_INFINITY, f64::max);
    Some((low, high))
}

/// Serialize an interval as whole seconds.
mod interval_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(interval: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(interval.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds = i64::deserialize(deserializer)?;
        Ok(Duration::seconds(seconds))
    }
}
