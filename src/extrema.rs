//! Alternating local minima and maxima detection.
//!
//! A sliding window of radius `window` moves over the sequence. The center
//! sample becomes an extremum when it is the window's minimum (or maximum),
//! it moves far enough away from the previously accepted extremum, and it
//! has the opposite kind of that extremum. After each acceptance the scan
//! jumps forward by `window` samples to skip noise around the turn.

use crate::bar::{Bar, closes};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremumKind {
    Minimum,
    Maximum,
}

impl ExtremumKind {
    pub fn opposite(self) -> Self {
        match self {
            ExtremumKind::Minimum => ExtremumKind::Maximum,
            ExtremumKind::Maximum => ExtremumKind::Minimum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    pub index: usize,
    pub kind: ExtremumKind,
    pub value: f64,
}

/// Accepted extrema in ascending index order, kinds strictly alternating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extrema {
    points: Vec<Extremum>,
}

impl Extrema {
    pub fn points(&self) -> &[Extremum] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn minima(&self) -> Vec<usize> {
        self.indices_of(ExtremumKind::Minimum)
    }

    pub fn maxima(&self) -> Vec<usize> {
        self.indices_of(ExtremumKind::Maximum)
    }

    /// Most recent extremum at or before `index`
    pub fn last_at_or_before(&self, index: usize) -> Option<&Extremum> {
        self.points.iter().take_while(|p| p.index <= index).last()
    }

    /// First extremum strictly after `index`
    pub fn first_after(&self, index: usize) -> Option<&Extremum> {
        self.points.iter().find(|p| p.index > index)
    }

    fn indices_of(&self, kind: ExtremumKind) -> Vec<usize> {
        self.points
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.index)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ExtremaDetector {
    pub window: usize,       // Half-window radius (default 6)
    pub significance: f64,   // Minimum relative move from the last extremum (default 0.01)
}

impl Default for ExtremaDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtremaDetector {
    pub fn new() -> Self {
        Self {
            window: 6,
            significance: 0.01,
        }
    }

    pub fn with_settings(window: usize, significance: f64) -> Self {
        Self {
            window,
            significance,
        }
    }

    /// Detect extrema over bar closes
    pub fn detect_closes<B: Bar>(&self, bars: &[B]) -> Extrema {
        self.detect(&closes(bars))
    }

    pub fn detect(&self, values: &[f64]) -> Extrema {
        let w = self.window;
        let n = values.len();
        if w == 0 || n <= 2 * w {
            return Extrema::default();
        }

        let mut looking_for = self.initial_direction(&values[..=2 * w]);
        let mut points: Vec<Extremum> = Vec::new();

        let mut i = w;
        while i < n - w {
            let window = &values[i - w..=i + w];
            let value = values[i];
            let target = match looking_for {
                ExtremumKind::Minimum => window_min(window),
                ExtremumKind::Maximum => window_max(window),
            };

            if value == target && self.is_significant(points.last(), value) {
                points.push(Extremum {
                    index: i,
                    kind: looking_for,
                    value,
                });
                looking_for = looking_for.opposite();
                i += w;
            } else {
                i += 1;
            }
        }

        debug!(
            "Detected {} extrema over {} samples (window {})",
            points.len(),
            n,
            w
        );
        Extrema { points }
    }

    /// Starting at a window minimum means the next turn is a maximum.
    fn initial_direction(&self, first_window: &[f64]) -> ExtremumKind {
        let first = first_window[0];
        if first == window_min(first_window) && first != window_max(first_window) {
            ExtremumKind::Maximum
        } else {
            ExtremumKind::Minimum
        }
    }

    fn is_significant(&self, last: Option<&Extremum>, value: f64) -> bool {
        match last {
            Some(last) => (value - last.value).abs() > self.significance * last.value.abs(),
            None => true,
        }
    }
}

fn window_min(window: &[f64]) -> f64 {
    window.iter().copied().fold(f64::INFINITY, f64::min)
}

fn window_max(window: &[f64]) -> f64 {
    window.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
