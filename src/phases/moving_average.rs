//! Phase segmentation relative to a moving average.

use super::{Phase, PhaseSegmenter, PhaseType, coalesce};
use crate::bar::{Bar, closes, price_range};
use crate::indicators::sma;
use log::debug;

/// Classifies each close as above, below, or within a band around its
/// moving average and turns the classification into stable phases.
#[derive(Debug, Clone)]
pub struct MovingAverageSegmenter {
    pub ma_period: usize,         // Reference SMA period (default 20)
    pub min_phase_length: usize,  // Shorter phases are merged away (default 14)
    pub sideways_band_ratio: f64, // Band as a share of the series price range (default 0.05)
}

impl Default for MovingAverageSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl MovingAverageSegmenter {
    pub fn new() -> Self {
        Self {
            ma_period: 20,
            min_phase_length: 14,
            sideways_band_ratio: 0.05,
        }
    }

    pub fn with_settings(
        ma_period: usize,
        min_phase_length: usize,
        sideways_band_ratio: f64,
    ) -> Self {
        Self {
            ma_period,
            min_phase_length,
            sideways_band_ratio,
        }
    }

    /// Bars a new classification must persist before it is accepted
    pub fn stability_buffer(&self) -> usize {
        (self.min_phase_length / 2).max(3)
    }

    /// Segment `closes` against a precomputed reference average.
    ///
    /// A close within `band_threshold` of its average is sideways. A change of
    /// classification opens a candidate phase at the bar where it first
    /// appeared; the candidate is accepted once it has held for the stability
    /// buffer. A closed phase shorter than `min_phase_length` is folded into
    /// the phase before it.
    pub fn segment_series(
        &self,
        closes: &[f64],
        reference: &[f64],
        band_threshold: f64,
    ) -> Vec<Phase> {
        let n = closes.len().min(reference.len());
        if n == 0 {
            return Vec::new();
        }

        let classify = |i: usize| {
            let distance = closes[i] - reference[i];
            if distance.abs() < band_threshold {
                PhaseType::Sideways
            } else if distance > 0.0 {
                PhaseType::Uptrend
            } else {
                PhaseType::Downtrend
            }
        };

        let buffer = self.stability_buffer();
        let mut phases: Vec<Phase> = Vec::new();
        let mut current = classify(0);
        let mut start = 0;
        let mut pending: Option<(PhaseType, usize)> = None;

        for i in 1..n {
            let kind = classify(i);
            if kind == current {
                pending = None;
                continue;
            }

            let since = match pending {
                Some((candidate, since)) if candidate == kind => since,
                _ => i,
            };
            pending = Some((kind, since));

            if i + 1 - since < buffer {
                continue;
            }

            let closed_len = since - start;
            match phases.last_mut() {
                Some(last) if closed_len < self.min_phase_length => last.extend_to(since - 1),
                _ => phases.push(Phase::new(current, start..=since - 1)),
            }
            start = since;
            current = kind;
            pending = None;
        }

        // Open tail runs to the end of the series
        let tail_len = n - start;
        match phases.last_mut() {
            Some(last) if tail_len < self.min_phase_length && last.kind == current => {
                last.extend_to(n - 1)
            }
            _ => phases.push(Phase::new(current, start..=n - 1)),
        }

        coalesce(phases)
    }

    /// SMA of the closes with the warm-up bars set to the first computed value.
    ///
    /// Series shorter than `ma_period` use the mean of every close.
    fn reference_average(&self, closes: &[f64]) -> Vec<f64> {
        let period = self.ma_period.clamp(1, closes.len().max(1));
        let mut reference = sma(closes, period);
        if let Some(&first) = reference.get(period - 1) {
            reference[..period - 1].fill(first);
        }
        reference
    }
}

impl PhaseSegmenter for MovingAverageSegmenter {
    fn name(&self) -> &'static str {
        "moving_average"
    }

    fn segment<B: Bar>(&self, bars: &[B]) -> Vec<Phase> {
        let Some((low, high)) = price_range(bars) else {
            return Vec::new();
        };

        let closes = closes(bars);
        let reference = self.reference_average(&closes);
        let band_threshold = self.sideways_band_ratio * (high - low);
        let phases = self.segment_series(&closes, &reference, band_threshold);

        debug!(
            "{} segmentation: {} phases over {} bars (band {:.4})",
            self.name(),
            phases.len(),
            bars.len(),
            band_threshold
        );
        phases
    }
}
