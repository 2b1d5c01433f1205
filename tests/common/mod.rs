//! Shared bar builders for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use trendscope::Candle;

pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_699_999_200, 0).unwrap()
}

/// One-minute candles from `(open, high, low, close)` rows.
pub fn candles(rows: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    rows.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Candle::new(
                start_time() + Duration::minutes(i as i64),
                Duration::minutes(1),
                open,
                high,
                low,
                close,
            )
        })
        .collect()
}

/// Candles that open at the previous close, with a fixed wick around the body.
pub fn from_closes(closes: &[f64]) -> Vec<Candle> {
    let rows: Vec<_> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 0.5, open.min(close) - 0.5, close)
        })
        .collect();
    candles(&rows)
}

/// Smooth oscillation with drift, long enough for every default window.
pub fn wave(n: usize) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n)
        .map(|i| 100.0 + 8.0 * (i as f64 / 7.0).sin() + i as f64 * 0.05)
        .collect();
    from_closes(&closes)
}

/// Random walk of valid candles with positive prices.
pub fn arb_candles(max_len: usize) -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec((-2.0f64..2.0, 0.0f64..1.0, 0.0f64..1.0), 0..max_len).prop_map(
        |steps| {
            let mut price = 100.0;
            let rows: Vec<_> = steps
                .into_iter()
                .map(|(change, upper, lower)| {
                    let open = price;
                    price = (price + change).max(1.0);
                    let close = price;
                    (open, open.max(close) + upper, open.min(close) - lower, close)
                })
                .collect();
            candles(&rows)
        },
    )
}
