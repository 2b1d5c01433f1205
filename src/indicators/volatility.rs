//! True range and Wilder-smoothed Average True Range.

use crate::bar::Bar;

/// True range per bar: `max(high - low, |high - prev_close|, |low - prev_close|)`.
///
/// The first bar has no predecessor and uses its own close.
pub fn true_range<B: Bar>(bars: &[B]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let reference_close = if i == 0 {
                bar.close()
            } else {
                bars[i - 1].close()
            };
            (bar.high() - bar.low())
                .max((bar.high() - reference_close).abs())
                .max((bar.low() - reference_close).abs())
        })
        .collect()
}

/// Average True Range.
///
/// Seeded at index `period - 1` with the mean of the first `period` true
/// ranges, then `atr[i] = (atr[i-1] * (period - 1) + tr[i]) / period`.
pub fn average_true_range<B: Bar>(bars: &[B], period: usize) -> Vec<f64> {
    let mut output = vec![0.0; bars.len()];
    if period == 0 || bars.len() < period {
        return output;
    }

    let ranges = true_range(bars);
    let p = period as f64;
    output[period - 1] = ranges[..period].iter().sum::<f64>() / p;

    for i in period..ranges.len() {
        output[i] = (output[i - 1] * (p - 1.0) + ranges[i]) / p;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::test_support::{candles, twenty_bar_fixture};

    fn assert_fixture(result: &[f64], expected: &[f64]) {
        assert_eq!(result.len(), expected.len());
        for (i, (actual, expected)) in result.iter().zip(expected).enumerate() {
            assert!(
                (actual - expected).abs() < 0.001,
                "ATR at index {}: expected {}, got {}",
                i,
                expected,
                actual
            );
        }
    }

    #[test]
    fn test_atr_reference_fixture() {
        let result = average_true_range(&twenty_bar_fixture(), 14);
        let mut expected = vec![0.0; 13];
        expected.extend([0.507, 0.520, 0.512, 0.504, 0.511, 0.510, 0.509]);
        assert_fixture(&result, &expected);
    }

    #[test]
    fn test_atr_trending_fixture() {
        let bars = candles(&[
            (1.0, 1.5, 0.8, 1.2),
            (1.2, 1.6, 0.9, 1.3),
            (1.3, 1.7, 1.0, 1.4),
            (1.4, 1.6, 1.1, 1.2),
            (1.2, 1.8, 1.0, 1.5),
            (1.5, 2.0, 1.3, 1.7),
            (1.7, 2.1, 1.4, 1.6),
            (1.6, 2.2, 1.5, 1.8),
            (1.8, 2.3, 1.6, 1.7),
            (1.7, 2.4, 1.5, 1.9),
            (1.9, 2.5, 1.7, 2.0),
            (2.0, 2.6, 1.8, 2.1),
            (2.1, 2.7, 1.9, 2.2),
            (2.2, 2.8, 2.0, 2.1),
            (2.1, 2.9, 2.0, 2.3),
            (2.3, 3.0, 2.1, 2.2),
            (2.2, 3.1, 2.1, 2.4),
            (2.4, 3.2, 2.2, 2.3),
            (2.3, 3.3, 2.2, 2.5),
            (2.5, 3.4, 2.3, 2.4),
        ]);
        let result = average_true_range(&bars, 14);
        let mut expected = vec![0.0; 13];
        expected.extend([0.736, 0.747, 0.758, 0.776, 0.792, 0.814, 0.834]);
        assert_fixture(&result, &expected);
    }

    #[test]
    fn test_atr_recurrence_holds() {
        let bars = twenty_bar_fixture();
        let ranges = true_range(&bars);
        let atr = average_true_range(&bars, 5);
        for i in 5..atr.len() {
            let expected = (atr[i - 1] * 4.0 + ranges[i]) / 5.0;
            assert!((atr[i] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_first_true_range_uses_own_close() {
        let bars = candles(&[(1.0, 1.5, 0.9, 1.3)]);
        assert!((true_range(&bars)[0] - 0.6).abs() < 1e-12);
    }
}
