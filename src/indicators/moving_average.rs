//! Simple and exponential moving averages over numeric sequences.
//!
//! Outputs always have the input length. Entries without enough history
//! (index `< period - 1`) are `0.0`, never `NaN`.

/// Simple moving average: mean of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut output = vec![0.0; values.len()];
    if period == 0 || values.len() < period {
        return output;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        output[i] = window.iter().sum::<f64>() / period as f64;
    }
    output
}

/// Exponential moving average seeded with the SMA of the first `period`
/// values, smoothing factor `2 / (period + 1)`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut output = vec![0.0; values.len()];
    if period == 0 || values.len() < period {
        return output;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed_index = period - 1;
    output[seed_index] = values[..period].iter().sum::<f64>() / period as f64;

    for i in period..values.len() {
        output[i] = values[i] * alpha + output[i - 1] * (1.0 - alpha);
    }
    output
}

/// Mean of the trailing `period` values, `None` when history is short.
pub fn latest_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}
