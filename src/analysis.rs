//! One-call analysis of a bar series
//!
//! [`MarketAnalyzer`] runs every indicator, extrema detection, phase
//! segmentation and level detection with one [`AnalysisConfig`] and bundles
//! the results into a [`MarketSnapshot`] that a strategy can index by bar.

use crate::bar::{Bar, Candle, closes};
use crate::config::{AnalysisConfig, SegmenterKind};
use crate::extrema::Extrema;
use crate::indicators::{
    MacdOutput, average_directional_index, average_true_range, directional_indicators, ema, macd,
    rate_of_change, rsi, sma, vwap,
};
use crate::levels::SupportResistance;
use crate::phases::{Phase, PhaseSegmenter, last_trend_phase};
use crate::resample::aggregate_by_count;
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Keys of [`MarketSnapshot::indicators`]
pub mod indicator_names {
    pub const SMA: &str = "sma";
    pub const EMA: &str = "ema";
    pub const RSI: &str = "rsi";
    pub const ATR: &str = "atr";
    pub const PLUS_DI: &str = "plus_di";
    pub const MINUS_DI: &str = "minus_di";
    pub const ADX: &str = "adx";
    pub const BOLLINGER_UPPER: &str = "bollinger_upper";
    pub const BOLLINGER_MIDDLE: &str = "bollinger_middle";
    pub const BOLLINGER_LOWER: &str = "bollinger_lower";
    pub const ROC: &str = "roc";
    pub const VWAP: &str = "vwap";
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketSnapshot {
    /// Number of bars analyzed, after resampling
    pub bar_count: usize,
    pub indicators: BTreeMap<String, Vec<f64>>,
    pub macd: MacdOutput,
    pub extrema: Extrema,
    pub phases: Vec<Phase>,
    pub levels: SupportResistance,
}

impl MarketSnapshot {
    pub fn indicator(&self, name: &str) -> Option<&[f64]> {
        self.indicators.get(name).map(Vec::as_slice)
    }

    pub fn value_at(&self, name: &str, index: usize) -> Option<f64> {
        self.indicator(name)?.get(index).copied()
    }

    /// Value of an indicator at the last analyzed bar
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.indicator(name)?.last().copied()
    }

    pub fn latest_phase(&self) -> Option<&Phase> {
        self.phases.last()
    }

    pub fn latest_trend_phase(&self) -> Option<&Phase> {
        last_trend_phase(&self.phases)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarketAnalyzer {
    config: AnalysisConfig,
}

impl MarketAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze the series, resampling it first when configured.
    pub fn analyze<B: Bar>(&self, bars: &[B]) -> MarketSnapshot {
        match self.config.resample_by {
            Some(count) if count > 1 => {
                let resampled: Vec<Candle> = aggregate_by_count(bars, count);
                info!(
                    "Resampled {} bars by {} into {} bars",
                    bars.len(),
                    count,
                    resampled.len()
                );
                self.analyze_series(&resampled)
            }
            _ => self.analyze_series(bars),
        }
    }

    fn analyze_series<B: Bar>(&self, bars: &[B]) -> MarketSnapshot {
        let n = bars.len();
        if n <= 2 * self.config.levels.window {
            warn!(
                "Series of {} bars is too short for level detection (window {})",
                n, self.config.levels.window
            );
        }

        let closes = closes(bars);
        let indicators = self.compute_indicators(bars, &closes);
        let macd = macd(&closes, self.config.indicators.macd);
        let extrema = self.config.extrema.detector().detect(&closes);
        let phases = self.segment(bars);
        let levels = self.config.levels.detector().detect(bars);

        info!(
            "Analyzed {} bars: {} phases, {} extrema, {} support/resistance pairs",
            n,
            phases.len(),
            extrema.len(),
            levels.support.len()
        );

        MarketSnapshot {
            bar_count: n,
            indicators,
            macd,
            extrema,
            phases,
            levels,
        }
    }

    fn segment<B: Bar>(&self, bars: &[B]) -> Vec<Phase> {
        let phases = &self.config.phases;
        match phases.segmenter {
            SegmenterKind::MovingAverage => phases.moving_average_segmenter().segment(bars),
            SegmenterKind::RangeBound => phases
                .range_bound_segmenter(&self.config.indicators, &self.config.extrema)
                .segment(bars),
        }
    }

    fn compute_indicators<B: Bar>(
        &self,
        bars: &[B],
        closes: &[f64],
    ) -> BTreeMap<String, Vec<f64>> {
        use self::indicator_names::*;

        let settings = &self.config.indicators;
        let (plus_di, minus_di) = directional_indicators(bars, settings.adx_period);
        let bands = settings.bollinger_calculator().calculate_from_closes(closes);

        let mut indicators = BTreeMap::new();
        indicators.insert(SMA.to_string(), sma(closes, settings.sma_period));
        indicators.insert(EMA.to_string(), ema(closes, settings.ema_period));
        indicators.insert(RSI.to_string(), rsi(closes, settings.rsi_period));
        indicators.insert(ATR.to_string(), average_true_range(bars, settings.atr_period));
        indicators.insert(PLUS_DI.to_string(), plus_di);
        indicators.insert(MINUS_DI.to_string(), minus_di);
        indicators.insert(ADX.to_string(), average_directional_index(bars, settings.adx_period));
        indicators.insert(BOLLINGER_UPPER.to_string(), bands.upper_band);
        indicators.insert(BOLLINGER_MIDDLE.to_string(), bands.middle_line);
        indicators.insert(BOLLINGER_LOWER.to_string(), bands.lower_band);
        indicators.insert(ROC.to_string(), rate_of_change(closes, settings.roc_period));
        indicators.insert(VWAP.to_string(), vwap(bars));
        indicators
    }
}
