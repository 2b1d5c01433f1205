//! Directional movement: ±DI and the Average Directional Index.

use super::moving_average::{ema, sma};
use super::volatility::true_range;
use crate::bar::Bar;

/// Positive and negative directional movement per bar.
///
/// Bar 0 has no predecessor and carries no movement. A move counts only when
/// it is positive and strictly larger than the opposing move.
fn directional_movement<B: Bar>(bars: &[B]) -> (Vec<f64>, Vec<f64>) {
    let mut plus_dm = vec![0.0; bars.len()];
    let mut minus_dm = vec![0.0; bars.len()];

    for i in 1..bars.len() {
        let up_move = bars[i].high() - bars[i - 1].high();
        let down_move = bars[i - 1].low() - bars[i].low();

        if up_move > down_move && up_move > 0.0 {
            plus_dm[i] = up_move;
        }
        if down_move > up_move && down_move > 0.0 {
            minus_dm[i] = down_move;
        }
    }
    (plus_dm, minus_dm)
}

/// `+DI` and `-DI` aligned to the input length.
///
/// The value at bar `i` is `100 * SMA(DM) / SMA(TR)` over the `period` moves
/// ending at `i`, so the first non-zero entry is at `period`.
pub fn directional_indicators<B: Bar>(bars: &[B], period: usize) -> (Vec<f64>, Vec<f64>) {
    let n = bars.len();
    let mut plus_di = vec![0.0; n];
    let mut minus_di = vec![0.0; n];
    if period == 0 || n <= period {
        return (plus_di, minus_di);
    }

    let (plus_dm, minus_dm) = directional_movement(bars);
    let ranges = true_range(bars);

    // Moves start at bar 1, so smooth the shifted series and realign
    let smoothed_plus = sma(&plus_dm[1..], period);
    let smoothed_minus = sma(&minus_dm[1..], period);
    let smoothed_range = sma(&ranges[1..], period);

    for i in period..n {
        let range = smoothed_range[i - 1];
        if range == 0.0 {
            continue;
        }
        plus_di[i] = 100.0 * smoothed_plus[i - 1] / range;
        minus_di[i] = 100.0 * smoothed_minus[i - 1] / range;
    }
    (plus_di, minus_di)
}

/// Directional index per bar, 0 where both indicators are 0.
pub fn directional_index(plus_di: &[f64], minus_di: &[f64]) -> Vec<f64> {
    plus_di
        .iter()
        .zip(minus_di)
        .map(|(plus, minus)| {
            let sum = plus + minus;
            if sum == 0.0 {
                0.0
            } else {
                100.0 * (plus - minus).abs() / sum
            }
        })
        .collect()
}

/// ADX as the EMA of the directional index.
pub fn average_directional_index<B: Bar>(bars: &[B], period: usize) -> Vec<f64> {
    let (plus_di, minus_di) = directional_indicators(bars, period);
    ema(&directional_index(&plus_di, &minus_di), period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::test_support::{from_closes, ten_bar_fixture};

    #[test]
    fn test_directional_indicators_reference_fixture() {
        let (plus_di, minus_di) = directional_indicators(&ten_bar_fixture(), 5);

        assert_eq!(plus_di.len(), 10);
        assert_eq!(minus_di.len(), 10);

        let expected = [0.0, 0.0, 0.0, 0.0, 0.0, 17.647, 17.647, 17.647, 19.444, 13.514];
        for (i, (actual, expected)) in plus_di.iter().zip(expected).enumerate() {
            assert!(
                (actual - expected).abs() < 0.01,
                "+DI at {}: expected {}, got {}",
                i,
                expected,
                actual
            );
        }
        assert!(minus_di.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_directional_index_guards_zero_sum() {
        let dx = directional_index(&[0.0, 30.0, 20.0], &[0.0, 10.0, 20.0]);
        assert_eq!(dx, vec![0.0, 50.0, 0.0]);
    }

    #[test]
    fn test_adx_on_pure_uptrend_is_bounded() {
        let bars = ten_bar_fixture();
        let adx = average_directional_index(&bars, 5);

        assert_eq!(adx.len(), bars.len());
        assert!(adx.iter().all(|v| (0.0..=100.0).contains(v)));
        // DX is 100 from bar 5 onwards since -DI never moves
        assert!(adx[9] > adx[5]);
    }

    #[test]
    fn test_flat_series_has_no_direction() {
        let bars = from_closes(&[10.0; 12]);
        let (plus_di, minus_di) = directional_indicators(&bars, 3);
        assert!(plus_di.iter().chain(&minus_di).all(|&v| v == 0.0));
        assert!(average_directional_index(&bars, 3).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_short_series_is_zero_filled() {
        let bars = ten_bar_fixture();
        let (plus_di, _) = directional_indicators(&bars[..4], 5);
        assert_eq!(plus_di, vec![0.0; 4]);
        assert_eq!(average_directional_index(&bars[..4], 0), vec![0.0; 4]);
    }
}
