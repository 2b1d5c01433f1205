//! Support and resistance level detection
//!
//! Pivots are bars whose low (high) is the extreme of a symmetric window.
//! Each pivot collects touches: bars across the whole series whose low
//! (high) lies within a volatility-scaled relative tolerance of the pivot.
//! The tolerance factor is tuned by grid search, and supports are paired
//! with the first resistance that follows them.

use crate::bar::Bar;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

/// A bar corroborating a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub index: usize,
    pub time: DateTime<Utc>,
    pub price: f64, // Close of the touching bar
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub index: usize,       // Pivot bar
    pub time: DateTime<Utc>,
    pub price: f64,         // Touch price with the least total absolute deviation
    pub touches: Vec<Touch>,
}

impl Level {
    pub fn new(index: usize, time: DateTime<Utc>, touches: Vec<Touch>) -> Self {
        let price = representative_price(&touches);
        Self {
            index,
            time,
            price,
            touches,
        }
    }

    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }
}

/// Touch price minimizing the summed absolute deviation to all touches.
///
/// Every price inside the median interval of the sorted touch prices is a
/// minimizer, so the earliest touch in that interval wins ties. No touches
/// gives 0.
fn representative_price(touches: &[Touch]) -> f64 {
    if touches.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = touches.iter().map(|t| t.price).collect();
    sorted.sort_by(f64::total_cmp);
    let lower = sorted[(sorted.len() - 1) / 2];
    let upper = sorted[sorted.len() / 2];

    touches
        .iter()
        .map(|t| t.price)
        .find(|&price| price >= lower && price <= upper)
        .unwrap_or(lower)
}

/// Paired levels, oldest pair first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: Vec<Level>,
    pub resistance: Vec<Level>,
    pub factor: f64, // Tolerance factor chosen by tuning
}

impl SupportResistance {
    pub fn is_empty(&self) -> bool {
        self.support.is_empty() && self.resistance.is_empty()
    }

    /// Highest support at or below `price`
    pub fn nearest_support(&self, price: f64) -> Option<&Level> {
        self.support
            .iter()
            .filter(|l| l.price <= price)
            .max_by(|a, b| a.price.total_cmp(&b.price))
    }

    /// Lowest resistance at or above `price`
    pub fn nearest_resistance(&self, price: f64) -> Option<&Level> {
        self.resistance
            .iter()
            .filter(|l| l.price >= price)
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }
}

/// Pick the candidate with the lowest score; the first one wins ties.
///
/// Returns 0.5 when there are no candidates.
pub fn tune_factor<F>(candidates: &[f64], mut evaluate: F) -> f64
where
    F: FnMut(f64) -> f64,
{
    let mut best_factor = 0.5;
    let mut best_score = f64::MAX;
    for &factor in candidates {
        let score = evaluate(factor);
        if score < best_score {
            best_score = score;
            best_factor = factor;
        }
    }
    best_factor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Support,
    Resistance,
}

impl Side {
    fn price<B: Bar>(self, bar: &B) -> f64 {
        match self {
            Side::Support => bar.low(),
            Side::Resistance => bar.high(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LevelDetector {
    pub window: usize,     // Pivot window radius (default 12)
    pub num_pairs: usize,  // Most recent support/resistance pairs kept (default 3)
    pub factors: Vec<f64>, // Tolerance factors tried by tuning, in order
}

impl Default for LevelDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelDetector {
    pub fn new() -> Self {
        Self::with_settings(12, 3)
    }

    pub fn with_settings(window: usize, num_pairs: usize) -> Self {
        Self {
            window,
            num_pairs,
            factors: Self::candidate_factors(),
        }
    }

    pub fn with_factors(mut self, factors: Vec<f64>) -> Self {
        self.factors = factors;
        self
    }

    /// Default tolerance factor grid, 0.1 to 1.0 in steps of 0.1
    pub fn candidate_factors() -> Vec<f64> {
        (1..=10).map(|step| step as f64 / 10.0).collect()
    }

    /// Tune the factor, pair pivots and keep the most recent pairs.
    ///
    /// Touches are only collected for the pairs that are returned.
    pub fn detect<B: Bar>(&self, bars: &[B]) -> SupportResistance {
        let factor = self.tune(bars);
        let mut pairs = self.pair_indices(bars);
        pairs.truncate(self.num_pairs);
        pairs.reverse();

        let (support, resistance): (Vec<Level>, Vec<Level>) = pairs
            .into_iter()
            .map(|(s, r)| {
                (
                    self.level_at(bars, s, factor, Side::Support),
                    self.level_at(bars, r, factor, Side::Resistance),
                )
            })
            .unzip();
        debug!(
            "Detected {} support/resistance pairs over {} bars (factor {:.1})",
            support.len(),
            bars.len(),
            factor
        );
        SupportResistance {
            support,
            resistance,
            factor,
        }
    }

    pub fn tune<B: Bar>(&self, bars: &[B]) -> f64 {
        tune_factor(&self.factors, |factor| self.evaluate_factor(bars, factor))
    }

    /// Imbalance between support and resistance pivot counts.
    ///
    /// Pivot membership depends only on the window, so only the pivots are
    /// counted and no touches are collected.
    pub fn evaluate_factor<B: Bar>(&self, bars: &[B], _factor: f64) -> f64 {
        let supports = self.pivot_indices(bars, Side::Support).len() as f64;
        let resistances = self.pivot_indices(bars, Side::Resistance).len() as f64;
        (supports - resistances).abs()
    }

    pub fn support_pivots<B: Bar>(&self, bars: &[B], factor: f64) -> Vec<Level> {
        self.levels(bars, factor, Side::Support)
    }

    pub fn resistance_pivots<B: Bar>(&self, bars: &[B], factor: f64) -> Vec<Level> {
        self.levels(bars, factor, Side::Resistance)
    }

    /// Supports from most recent to oldest, each with the earliest
    /// resistance pivot that comes after it.
    pub fn pairs<B: Bar>(&self, bars: &[B], factor: f64) -> Vec<(Level, Level)> {
        self.pair_indices(bars)
            .into_iter()
            .map(|(s, r)| {
                (
                    self.level_at(bars, s, factor, Side::Support),
                    self.level_at(bars, r, factor, Side::Resistance),
                )
            })
            .collect()
    }

    fn pair_indices<B: Bar>(&self, bars: &[B]) -> Vec<(usize, usize)> {
        let supports = self.pivot_indices(bars, Side::Support);
        let resistances = self.pivot_indices(bars, Side::Resistance);

        supports
            .into_iter()
            .rev()
            .filter_map(|support| {
                let next = resistances.partition_point(|&r| r <= support);
                resistances.get(next).map(|&resistance| (support, resistance))
            })
            .collect()
    }

    fn levels<B: Bar>(&self, bars: &[B], factor: f64, side: Side) -> Vec<Level> {
        self.pivot_indices(bars, side)
            .into_iter()
            .map(|index| self.level_at(bars, index, factor, side))
            .collect()
    }

    /// Ascending indices of bars whose low (high) is the extreme of the
    /// window of radius `window` around them.
    fn pivot_indices<B: Bar>(&self, bars: &[B], side: Side) -> Vec<usize> {
        let w = self.window;
        let n = bars.len();
        if n <= 2 * w {
            return Vec::new();
        }

        (w..n - w)
            .filter(|&i| {
                let window = &bars[i - w..=i + w];
                let price = side.price(&bars[i]);
                match side {
                    Side::Support => window.iter().all(|b| price <= b.low()),
                    Side::Resistance => window.iter().all(|b| price >= b.high()),
                }
            })
            .collect()
    }

    /// Level for the pivot at `index` with its touches across the series
    fn level_at<B: Bar>(&self, bars: &[B], index: usize, factor: f64, side: Side) -> Level {
        let w = self.window;
        let window = &bars[index.saturating_sub(w)..(index + w + 1).min(bars.len())];
        let pivot = side.price(&bars[index]);
        let tolerance = factor * average_volatility(window, side);

        let touches = bars
            .iter()
            .enumerate()
            .filter(|(_, bar)| relative_distance(side.price(*bar), pivot) <= tolerance)
            .map(|(i, bar)| Touch {
                index: i,
                time: bar.open_time(),
                price: bar.close(),
            })
            .collect();
        Level::new(index, bars[index].open_time(), touches)
    }
}

/// Mean bar range relative to the low (supports) or high (resistances).
fn average_volatility<B: Bar>(window: &[B], side: Side) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let total: f64 = window
        .iter()
        .map(|bar| {
            let reference = side.price(bar);
            if reference == 0.0 {
                0.0
            } else {
                (bar.high() - bar.low()) / reference
            }
        })
        .sum();
    total / window.len() as f64
}

fn relative_distance(price: f64, pivot: f64) -> f64 {
    if pivot == 0.0 {
        if price == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        (price - pivot).abs() / pivot.abs()
    }
}
