//! Volume-weighted indicators.

use crate::bar::Bar;

/// Typical price `(high + low + close) / 3`
pub fn typical_price<B: Bar>(bar: &B) -> f64 {
    (bar.high() + bar.low() + bar.close()) / 3.0
}

/// Cumulative VWAP from the start of the series.
///
/// Bars without volume (or with zero volume) are skipped and repeat the last
/// value; before the first traded bar the value is 0.
pub fn vwap<B: Bar>(bars: &[B]) -> Vec<f64> {
    let mut cumulative_value = 0.0;
    let mut cumulative_volume = 0.0;
    let mut current = 0.0;

    bars.iter()
        .map(|bar| {
            if let Some(volume) = bar.volume().filter(|v| *v > 0.0) {
                cumulative_value += typical_price(bar) * volume;
                cumulative_volume += volume;
                current = cumulative_value / cumulative_volume;
            }
            current
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::test_support::candles;

    #[test]
    fn test_vwap_weights_by_volume() {
        let bars: Vec<_> = candles(&[(10.0, 12.0, 9.0, 12.0), (12.0, 15.0, 12.0, 15.0)])
            .into_iter()
            .zip([100.0, 300.0])
            .map(|(c, v)| c.with_volume(v))
            .collect();

        let result = vwap(&bars);
        assert!((result[0] - 11.0).abs() < 1e-9);
        // (11 * 100 + 14 * 300) / 400
        assert!((result[1] - 13.25).abs() < 1e-9);
    }

    #[test]
    fn test_vwap_skips_bars_without_volume() {
        let mut bars = candles(&[
            (10.0, 10.0, 10.0, 10.0),
            (20.0, 20.0, 20.0, 20.0),
            (30.0, 30.0, 30.0, 30.0),
            (40.0, 40.0, 40.0, 40.0),
        ]);
        bars[1].volume = Some(50.0);
        bars[2].volume = Some(0.0);
        bars[3].volume = Some(50.0);

        let result = vwap(&bars);
        assert_eq!(result, vec![0.0, 20.0, 20.0, 30.0]);
    }

    #[test]
    fn test_vwap_without_any_volume_is_zero() {
        let bars = candles(&[(1.0, 2.0, 0.5, 1.5); 3]);
        assert_eq!(vwap(&bars), vec![0.0; 3]);
    }
}
