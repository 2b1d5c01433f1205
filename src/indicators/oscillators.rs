//! Momentum oscillators: RSI and rate of change.

/// Relative Strength Index with Wilder smoothing.
///
/// The seed averages sum the gains and losses of the `period - 1` deltas
/// ending at index `period - 1` and divide by `period`. From there on
/// `avg = (avg * (period - 1) + current) / period`. A zero average loss maps
/// to 100. Entries before `period - 1` are 0.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let mut output = vec![0.0; closes.len()];
    if period == 0 || closes.len() < period {
        return output;
    }

    let (gains, losses) = closes[..period]
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(gains, losses), change| {
            if change > 0.0 {
                (gains + change, losses)
            } else {
                (gains, losses - change)
            }
        });

    let p = period as f64;
    let mut average_gain = gains / p;
    let mut average_loss = losses / p;
    output[period - 1] = strength_index(average_gain, average_loss);

    for i in period..closes.len() {
        let change = closes[i] - closes[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        average_gain = (average_gain * (p - 1.0) + gain) / p;
        average_loss = (average_loss * (p - 1.0) + loss) / p;
        output[i] = strength_index(average_gain, average_loss);
    }
    output
}

fn strength_index(average_gain: f64, average_loss: f64) -> f64 {
    if average_loss == 0.0 {
        return 100.0;
    }
    let rs = average_gain / average_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Fractional change against the close `period` bars earlier, 0 before that
/// or when the earlier close is 0.
pub fn rate_of_change(closes: &[f64], period: usize) -> Vec<f64> {
    let mut output = vec![0.0; closes.len()];
    if period == 0 {
        return output;
    }

    for i in period..closes.len() {
        let previous = closes[i - period];
        if previous != 0.0 {
            output[i] = (closes[i] - previous) / previous;
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::closes;
    use crate::bar::test_support::ten_bar_fixture;

    #[test]
    fn test_rsi_reference_fixture() {
        let values = closes(&ten_bar_fixture());
        let result = rsi(&values, 5);
        let expected = [
            0.0, 0.0, 0.0, 0.0, 71.42, 78.94, 67.79, 76.20, 65.51, 74.46,
        ];

        assert_eq!(result.len(), expected.len());
        for (i, (actual, expected)) in result.iter().zip(expected).enumerate() {
            assert!(
                (actual - expected).abs() < 0.1,
                "RSI at index {}: expected {}, got {}",
                i,
                expected,
                actual
            );
        }
    }

    #[test]
    fn test_rsi_without_losses_is_100() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&values, 14);
        assert!(result[13..].iter().all(|&v| v == 100.0));
        assert!(result[..13].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rsi_short_history() {
        assert_eq!(rsi(&[1.0, 2.0, 3.0], 14), vec![0.0; 3]);
        assert!(rsi(&[], 14).is_empty());
    }

    #[test]
    fn test_rate_of_change() {
        let values = [100.0, 110.0, 121.0, 0.0, 50.0];
        let result = rate_of_change(&values, 1);
        assert_eq!(result[0], 0.0);
        assert!((result[1] - 0.1).abs() < 1e-12);
        assert!((result[2] - 0.1).abs() < 1e-12);
        assert!((result[3] + 1.0).abs() < 1e-12);
        // previous close of zero is guarded
        assert_eq!(result[4], 0.0);
    }
}
