use crate::bar::{Bar, closes};
use log::debug;
use statrs::statistics::Statistics;

/// Bollinger envelope aligned to the input series.
///
/// Entry `i` is computed from the `period` closes preceding bar `i`; entries
/// with `i < period` are 0 in all three bands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerBands {
    pub upper_band: Vec<f64>,  // Middle + (std_dev * multiplier)
    pub middle_line: Vec<f64>, // Simple moving average
    pub lower_band: Vec<f64>,  // Middle - (std_dev * multiplier)
}

impl BollingerBands {
    pub fn len(&self) -> usize {
        self.middle_line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middle_line.is_empty()
    }

    /// Whether the bands at `index` have enough history behind them
    pub fn is_computed(&self, index: usize) -> bool {
        self.middle_line.get(index).is_some_and(|&m| m != 0.0)
    }

    /// Price lies inside the computed envelope at `index`
    pub fn contains(&self, index: usize, price: f64) -> bool {
        self.is_computed(index)
            && price >= self.lower_band[index]
            && price <= self.upper_band[index]
    }

    /// (Upper - Lower) / Middle, 0 when the middle line is 0
    pub fn bandwidth(&self, index: usize) -> f64 {
        match self.middle_line.get(index) {
            Some(&middle) if middle != 0.0 => {
                (self.upper_band[index] - self.lower_band[index]) / middle
            }
            _ => 0.0,
        }
    }

    /// (Price - Lower) / (Upper - Lower), 0.5 when the bands are collapsed
    pub fn percent_b(&self, index: usize, price: f64) -> f64 {
        let (Some(&upper), Some(&lower)) =
            (self.upper_band.get(index), self.lower_band.get(index))
        else {
            return 0.5;
        };
        if upper != lower {
            (price - lower) / (upper - lower)
        } else {
            0.5
        }
    }
}

#[derive(Debug, Clone)]
pub struct BollingerCalculator {
    pub period: usize,       // Moving average period (default 20)
    pub std_multiplier: f64, // Standard deviation multiplier (default 2.0)
}

impl Default for BollingerCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl BollingerCalculator {
    pub fn new() -> Self {
        Self {
            period: 20,
            std_multiplier: 2.0,
        }
    }

    pub fn with_settings(period: usize, std_multiplier: f64) -> Self {
        Self {
            period,
            std_multiplier,
        }
    }

    /// Calculate the bands for every bar of the series
    pub fn calculate<B: Bar>(&self, bars: &[B]) -> BollingerBands {
        self.calculate_from_closes(&closes(bars))
    }

    pub fn calculate_from_closes(&self, closes: &[f64]) -> BollingerBands {
        let n = closes.len();
        let mut bands = BollingerBands {
            upper_band: vec![0.0; n],
            middle_line: vec![0.0; n],
            lower_band: vec![0.0; n],
        };
        if self.period == 0 {
            return bands;
        }

        for i in self.period..n {
            let window = &closes[i - self.period..i];

            // Population standard deviation of the preceding window
            let middle_line = window.mean();
            let std_deviation = window.population_std_dev();

            bands.middle_line[i] = middle_line;
            bands.upper_band[i] = middle_line + std_deviation * self.std_multiplier;
            bands.lower_band[i] = middle_line - std_deviation * self.std_multiplier;
        }

        debug!(
            "Bollinger bands over {} closes (period {}, multiplier {:.2})",
            n, self.period, self.std_multiplier
        );
        bands
    }
}
