//! Market phase segmentation
//!
//! A segmentation partitions the bar indices `0..n` into contiguous,
//! non-overlapping [`Phase`]s. Two strategies implement [`PhaseSegmenter`]:
//! classification against a moving average, and a composite range-bound
//! signal whose gaps are labelled from alternating extrema.

pub mod moving_average;
pub mod range_bound;

pub use moving_average::MovingAverageSegmenter;
pub use range_bound::RangeBoundSegmenter;

use crate::bar::Bar;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseType {
    Uptrend,
    Downtrend,
    Sideways,
}

impl PhaseType {
    pub fn is_trend(self) -> bool {
        self != PhaseType::Sideways
    }
}

/// Contiguous run of bars sharing one phase type, inclusive bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseType,
    pub range: RangeInclusive<usize>,
}

impl Phase {
    pub fn new(kind: PhaseType, range: RangeInclusive<usize>) -> Self {
        Self { kind, range }
    }

    pub fn start(&self) -> usize {
        *self.range.start()
    }

    pub fn end(&self) -> usize {
        *self.range.end()
    }

    /// Number of bars covered, 0 for an inverted range
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end() - self.start() + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range.contains(&index)
    }

    pub(crate) fn extend_to(&mut self, end: usize) {
        self.range = self.start()..=end;
    }
}

/// Strategy splitting a bar series into phases.
pub trait PhaseSegmenter {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Partition `0..bars.len()` into phases; empty input yields no phases.
    fn segment<B: Bar>(&self, bars: &[B]) -> Vec<Phase>;
}

/// Last phase that is not sideways
pub fn last_trend_phase(phases: &[Phase]) -> Option<&Phase> {
    phases.iter().rev().find(|p| p.kind.is_trend())
}

/// The final phase, only when it is sideways
pub fn sideways_if_last(phases: &[Phase]) -> Option<&Phase> {
    phases.last().filter(|p| p.kind == PhaseType::Sideways)
}

pub fn phase_at(phases: &[Phase], index: usize) -> Option<&Phase> {
    phases.iter().find(|p| p.contains(index))
}

/// Merge adjacent phases of identical type.
pub fn coalesce(phases: Vec<Phase>) -> Vec<Phase> {
    let mut merged: Vec<Phase> = Vec::with_capacity(phases.len());
    for phase in phases {
        match merged.last_mut() {
            Some(last) if last.kind == phase.kind => last.extend_to(phase.end()),
            _ => merged.push(phase),
        }
    }
    merged
}

/// Whether the phases cover `0..n` exactly, in order, without gaps.
pub fn is_partition(phases: &[Phase], n: usize) -> bool {
    if n == 0 {
        return phases.is_empty();
    }
    let mut expected_start = 0;
    for phase in phases {
        if phase.start() != expected_start || phase.end() < phase.start() {
            return false;
        }
        expected_start = phase.end() + 1;
    }
    expected_start == n
}
