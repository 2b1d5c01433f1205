//! Phase segmentation from a composite range-bound signal.
//!
//! A bar is range-bound when at least two of three conditions hold: the
//! close sits inside the Bollinger envelope, ADX is below the trend
//! threshold, and RSI is inside the neutral band. Long enough runs of
//! range-bound bars become sideways phases. Every other bar takes its
//! direction from the alternating extrema around it.

use super::{Phase, PhaseSegmenter, PhaseType, coalesce};
use crate::bar::{Bar, closes};
use crate::extrema::{Extrema, ExtremaDetector, ExtremumKind};
use crate::indicators::{BollingerBands, BollingerCalculator, average_directional_index, rsi};
use log::debug;

#[derive(Debug, Clone)]
pub struct RangeBoundSegmenter {
    pub bollinger: BollingerCalculator,
    pub extrema: ExtremaDetector,
    pub adx_period: usize,
    pub rsi_period: usize,
    pub adx_trend_threshold: f64,   // ADX below this is trendless (default 25)
    pub rsi_neutral_low: f64,       // default 40
    pub rsi_neutral_high: f64,      // default 60
    pub min_sideways_length: usize, // default 5
    pub min_trend_length: usize,    // Shorter trend phases merge backward (default 6)
}

impl Default for RangeBoundSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeBoundSegmenter {
    pub fn new() -> Self {
        Self {
            bollinger: BollingerCalculator::new(),
            extrema: ExtremaDetector::new(),
            adx_period: 14,
            rsi_period: 14,
            adx_trend_threshold: 25.0,
            rsi_neutral_low: 40.0,
            rsi_neutral_high: 60.0,
            min_sideways_length: 5,
            min_trend_length: 6,
        }
    }

    /// Per-bar majority vote of the three range-bound conditions
    pub fn range_bound_mask<B: Bar>(&self, bars: &[B]) -> Vec<bool> {
        self.mask_with_closes(bars, &closes(bars))
    }

    fn mask_with_closes<B: Bar>(&self, bars: &[B], closes: &[f64]) -> Vec<bool> {
        let bands = self.bollinger.calculate_from_closes(closes);
        let adx = average_directional_index(bars, self.adx_period);
        let strength = rsi(closes, self.rsi_period);
        self.majority_vote(closes, &bands, &adx, &strength)
    }

    /// A bar is range-bound when at least two conditions hold. Warm-up bars
    /// fail the band and RSI conditions because both are still zero.
    fn majority_vote(
        &self,
        closes: &[f64],
        bands: &BollingerBands,
        adx: &[f64],
        strength: &[f64],
    ) -> Vec<bool> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let votes = [
                    bands.contains(i, close),
                    adx[i] < self.adx_trend_threshold,
                    strength[i] >= self.rsi_neutral_low && strength[i] <= self.rsi_neutral_high,
                ];
                votes.iter().filter(|&&v| v).count() >= 2
            })
            .collect()
    }

    /// Label each bar from the sideways mask and the extrema around it.
    fn label_bars(&self, closes: &[f64], sideways: &[bool], extrema: &Extrema) -> Vec<PhaseType> {
        let mut labels = vec![PhaseType::Sideways; closes.len()];
        let mut i = 0;
        while i < closes.len() {
            if sideways[i] {
                i += 1;
                continue;
            }
            let gap_start = i;
            while i < closes.len() && !sideways[i] {
                i += 1;
            }
            let gap_end = i - 1;

            // Without any extrema the gap follows its own net move
            let net_direction = if closes[gap_end] >= closes[gap_start] {
                PhaseType::Uptrend
            } else {
                PhaseType::Downtrend
            };
            for (index, label) in labels[gap_start..=gap_end].iter_mut().enumerate() {
                *label = direction_at(gap_start + index, extrema).unwrap_or(net_direction);
            }
        }
        labels
    }

    /// Keep only range-bound runs of at least `min_sideways_length` bars
    fn sideways_runs(&self, mask: &[bool]) -> Vec<bool> {
        let mut sideways = vec![false; mask.len()];
        let mut i = 0;
        while i < mask.len() {
            if !mask[i] {
                i += 1;
                continue;
            }
            let run_start = i;
            while i < mask.len() && mask[i] {
                i += 1;
            }
            if i - run_start >= self.min_sideways_length {
                sideways[run_start..i].fill(true);
            }
        }
        sideways
    }

    fn merge_short_trends(&self, phases: Vec<Phase>) -> Vec<Phase> {
        let mut merged: Vec<Phase> = Vec::with_capacity(phases.len());
        for phase in phases {
            match merged.last_mut() {
                Some(last) if phase.kind.is_trend() && phase.len() < self.min_trend_length => {
                    last.extend_to(phase.end())
                }
                _ => merged.push(phase),
            }
        }
        coalesce(merged)
    }
}

/// Direction implied by the extrema: rising after a minimum, falling after
/// a maximum. Before the first extremum the direction leads into it.
fn direction_at(index: usize, extrema: &Extrema) -> Option<PhaseType> {
    let kind = match extrema.last_at_or_before(index) {
        Some(point) => point.kind,
        None => extrema.first_after(index)?.kind.opposite(),
    };
    Some(match kind {
        ExtremumKind::Minimum => PhaseType::Uptrend,
        ExtremumKind::Maximum => PhaseType::Downtrend,
    })
}

fn group_labels(labels: &[PhaseType]) -> Vec<Phase> {
    let mut phases: Vec<Phase> = Vec::new();
    for (i, &kind) in labels.iter().enumerate() {
        match phases.last_mut() {
            Some(last) if last.kind == kind => last.extend_to(i),
            _ => phases.push(Phase::new(kind, i..=i)),
        }
    }
    phases
}

impl PhaseSegmenter for RangeBoundSegmenter {
    fn name(&self) -> &'static str {
        "range_bound"
    }

    fn segment<B: Bar>(&self, bars: &[B]) -> Vec<Phase> {
        if bars.is_empty() {
            return Vec::new();
        }

        let closes = closes(bars);
        let sideways = self.sideways_runs(&self.mask_with_closes(bars, &closes));
        let extrema = self.extrema.detect(&closes);
        let labels = self.label_bars(&closes, &sideways, &extrema);
        let phases = self.merge_short_trends(group_labels(&labels));

        debug!(
            "{} segmentation: {} phases, {} extrema over {} bars",
            self.name(),
            phases.len(),
            extrema.len(),
            bars.len()
        );
        phases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::test_support::from_closes;
    use crate::phases::{is_partition, phase_at, sideways_if_last};

    /// Thirty rising bars followed by sixty bars alternating in a narrow range.
    fn trend_then_range() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        closes.extend((0..60).map(|k| if k % 2 == 0 { 130.0 } else { 130.2 }));
        closes
    }

    #[test]
    fn test_two_of_three_conditions_mark_range_bound() {
        let segmenter = RangeBoundSegmenter::new();
        let bands = BollingerBands {
            upper_band: vec![0.0, 12.0, 12.0, 12.0, 12.0],
            middle_line: vec![0.0, 10.0, 10.0, 10.0, 10.0],
            lower_band: vec![0.0, 8.0, 8.0, 8.0, 8.0],
        };
        let closes = [10.0, 10.0, 15.0, 10.0, 15.0];
        let adx = [0.0, 30.0, 20.0, 30.0, 30.0];
        let strength = [0.0, 80.0, 50.0, 55.0, 50.0];

        let mask = segmenter.majority_vote(&closes, &bands, &adx, &strength);
        assert_eq!(
            mask,
            vec![
                false, // warm-up: only ADX (still 0) votes
                false, // inside the bands only
                true,  // trendless ADX and neutral RSI
                true,  // inside the bands and neutral RSI
                false, // neutral RSI only
            ]
        );
    }

    #[test]
    fn test_warm_up_bars_are_not_range_bound() {
        let bars = from_closes(&trend_then_range());
        let segmenter = RangeBoundSegmenter::new();
        let mask = segmenter.range_bound_mask(&bars);

        assert_eq!(mask.len(), bars.len());
        assert!(mask[..segmenter.rsi_period - 1].iter().all(|&m| !m));
    }

    #[test]
    fn test_sideways_runs_drop_short_runs() {
        let segmenter = RangeBoundSegmenter::new();
        let mask = [true, true, false, true, true, true, true, true, false];
        let runs = segmenter.sideways_runs(&mask);

        assert_eq!(
            runs,
            vec![false, false, false, true, true, true, true, true, false]
        );
    }

    #[test]
    fn test_direction_follows_last_extremum() {
        let detector = ExtremaDetector::with_settings(2, 0.01);
        let extrema = detector.detect(&[5.0, 4.0, 3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0]);

        assert_eq!(direction_at(2, &extrema), Some(PhaseType::Downtrend));
        assert_eq!(direction_at(5, &extrema), Some(PhaseType::Uptrend));
        assert_eq!(direction_at(9, &extrema), Some(PhaseType::Downtrend));
        assert_eq!(direction_at(0, &Extrema::default()), None);
    }

    #[test]
    fn test_gap_without_extrema_uses_close_change() {
        let segmenter = RangeBoundSegmenter::new();
        let closes = [1.0, 2.0, 3.0, 3.0, 3.0, 2.0, 1.0];
        let sideways = [false, false, false, true, true, false, false];

        let labels = segmenter.label_bars(&closes, &sideways, &Extrema::default());
        assert_eq!(
            labels,
            vec![
                PhaseType::Uptrend,
                PhaseType::Uptrend,
                PhaseType::Uptrend,
                PhaseType::Sideways,
                PhaseType::Sideways,
                PhaseType::Downtrend,
                PhaseType::Downtrend,
            ]
        );
    }

    #[test]
    fn test_short_trend_merges_into_previous_phase() {
        let segmenter = RangeBoundSegmenter::new();
        let phases = vec![
            Phase::new(PhaseType::Uptrend, 0..=9),
            Phase::new(PhaseType::Downtrend, 10..=11),
            Phase::new(PhaseType::Sideways, 12..=20),
        ];

        let merged = segmenter.merge_short_trends(phases);
        assert_eq!(
            merged,
            vec![
                Phase::new(PhaseType::Uptrend, 0..=11),
                Phase::new(PhaseType::Sideways, 12..=20),
            ]
        );
    }

    #[test]
    fn test_trend_then_range_segmentation() {
        let bars = from_closes(&trend_then_range());
        let phases = RangeBoundSegmenter::new().segment(&bars);

        assert!(is_partition(&phases, bars.len()));
        assert_eq!(phase_at(&phases, 10).map(|p| p.kind), Some(PhaseType::Uptrend));
        assert_eq!(phase_at(&phases, 85).map(|p| p.kind), Some(PhaseType::Sideways));
        assert!(sideways_if_last(&phases).is_some());
    }

    #[test]
    fn test_empty_series() {
        let bars = from_closes(&[]);
        assert!(RangeBoundSegmenter::new().segment(&bars).is_empty());
    }
}
