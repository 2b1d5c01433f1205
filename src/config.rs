use crate::extrema::ExtremaDetector;
use crate::indicators::{BollingerCalculator, MacdSettings};
use crate::levels::LevelDetector;
use crate::phases::{MovingAverageSegmenter, RangeBoundSegmenter};
use anyhow::{Result, anyhow};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub extrema: ExtremaConfig,
    #[serde(default)]
    pub phases: PhaseConfig,
    #[serde(default)]
    pub levels: LevelConfig,
    /// Group every N source bars before analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resample_by: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_sma_period")]
    pub sma_period: usize,
    #[serde(default = "default_ema_period")]
    pub ema_period: usize,
    #[serde(default = "default_indicator_period")]
    pub rsi_period: usize,
    #[serde(default = "default_indicator_period")]
    pub atr_period: usize,
    #[serde(default = "default_indicator_period")]
    pub adx_period: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_multiplier")]
    pub bollinger_multiplier: f64,
    #[serde(default)]
    pub macd: MacdSettings,
    #[serde(default = "default_roc_period")]
    pub roc_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_period: default_sma_period(),
            ema_period: default_ema_period(),
            rsi_period: default_indicator_period(),
            atr_period: default_indicator_period(),
            adx_period: default_indicator_period(),
            bollinger_period: default_bollinger_period(),
            bollinger_multiplier: default_bollinger_multiplier(),
            macd: MacdSettings::default(),
            roc_period: default_roc_period(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtremaConfig {
    #[serde(default = "default_extrema_window")]
    pub window: usize,
    #[serde(default = "default_significance")]
    pub significance: f64,
}

impl Default for ExtremaConfig {
    fn default() -> Self {
        Self {
            window: default_extrema_window(),
            significance: default_significance(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmenterKind {
    #[default]
    MovingAverage,
    RangeBound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    #[serde(default)]
    pub segmenter: SegmenterKind,
    #[serde(default = "default_sma_period")]
    pub ma_period: usize,
    #[serde(default = "default_min_phase_length")]
    pub min_phase_length: usize,
    #[serde(default = "default_sideways_band_ratio")]
    pub sideways_band_ratio: f64,
    #[serde(default = "default_adx_trend_threshold")]
    pub adx_trend_threshold: f64,
    #[serde(default = "default_rsi_neutral_low")]
    pub rsi_neutral_low: f64,
    #[serde(default = "default_rsi_neutral_high")]
    pub rsi_neutral_high: f64,
    #[serde(default = "default_min_sideways_length")]
    pub min_sideways_length: usize,
    #[serde(default = "default_min_trend_length")]
    pub min_trend_length: usize,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterKind::default(),
            ma_period: default_sma_period(),
            min_phase_length: default_min_phase_length(),
            sideways_band_ratio: default_sideways_band_ratio(),
            adx_trend_threshold: default_adx_trend_threshold(),
            rsi_neutral_low: default_rsi_neutral_low(),
            rsi_neutral_high: default_rsi_neutral_high(),
            min_sideways_length: default_min_sideways_length(),
            min_trend_length: default_min_trend_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default = "default_level_window")]
    pub window: usize,
    #[serde(default = "default_num_pairs")]
    pub num_pairs: usize,
    #[serde(default = "default_factor_grid")]
    pub factor_grid: Vec<f64>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            window: default_level_window(),
            num_pairs: default_num_pairs(),
            factor_grid: default_factor_grid(),
        }
    }
}

fn default_sma_period() -> usize {
    20
}

fn default_ema_period() -> usize {
    50
}

fn default_indicator_period() -> usize {
    14 // Wilder's RSI, ATR and ADX period
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_multiplier() -> f64 {
    2.0
}

fn default_roc_period() -> usize {
    10
}

fn default_extrema_window() -> usize {
    6
}

fn default_significance() -> f64 {
    0.01 // 1% move from the previous extremum
}

fn default_min_phase_length() -> usize {
    14
}

fn default_sideways_band_ratio() -> f64 {
    0.05 // 5% of the analyzed price range
}

fn default_adx_trend_threshold() -> f64 {
    25.0
}

fn default_rsi_neutral_low() -> f64 {
    40.0
}

fn default_rsi_neutral_high() -> f64 {
    60.0
}

fn default_min_sideways_length() -> usize {
    5
}

fn default_min_trend_length() -> usize {
    6
}

fn default_level_window() -> usize {
    12
}

fn default_num_pairs() -> usize {
    3
}

fn default_factor_grid() -> Vec<f64> {
    LevelDetector::candidate_factors()
}

impl AnalysisConfig {
    /// Load configuration from a JSON file, falling back to defaults when the
    /// file does not exist.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "Config file {} not found, using default analysis settings",
                path.display()
            );
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&config_str)?;
        config.validate()?;

        info!("Loaded analysis configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ind = &self.indicators;
        let periods = [
            ("indicators.sma_period", ind.sma_period),
            ("indicators.ema_period", ind.ema_period),
            ("indicators.rsi_period", ind.rsi_period),
            ("indicators.atr_period", ind.atr_period),
            ("indicators.adx_period", ind.adx_period),
            ("indicators.bollinger_period", ind.bollinger_period),
            ("indicators.macd.fast_period", ind.macd.fast_period),
            ("indicators.macd.slow_period", ind.macd.slow_period),
            ("indicators.macd.signal_period", ind.macd.signal_period),
            ("indicators.roc_period", ind.roc_period),
            ("extrema.window", self.extrema.window),
            ("phases.ma_period", self.phases.ma_period),
            ("phases.min_phase_length", self.phases.min_phase_length),
            ("levels.window", self.levels.window),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(anyhow!("{} must be greater than zero", name));
            }
        }

        if ind.macd.fast_period >= ind.macd.slow_period {
            return Err(anyhow!(
                "MACD fast period ({}) must be shorter than slow period ({})",
                ind.macd.fast_period,
                ind.macd.slow_period
            ));
        }
        if ind.bollinger_multiplier <= 0.0 {
            return Err(anyhow!("Bollinger multiplier must be positive"));
        }
        if self.extrema.significance < 0.0 {
            return Err(anyhow!("Extrema significance cannot be negative"));
        }
        if !(0.0..1.0).contains(&self.phases.sideways_band_ratio) {
            return Err(anyhow!(
                "Sideways band ratio must be in [0, 1), got {}",
                self.phases.sideways_band_ratio
            ));
        }
        if self.phases.rsi_neutral_low > self.phases.rsi_neutral_high {
            return Err(anyhow!(
                "RSI neutral band is inverted: {} > {}",
                self.phases.rsi_neutral_low,
                self.phases.rsi_neutral_high
            ));
        }
        if self.levels.factor_grid.is_empty() {
            return Err(anyhow!("levels.factor_grid must list at least one factor"));
        }
        let invalid_factor = self
            .levels
            .factor_grid
            .iter()
            .find(|f| f.is_nan() || **f <= 0.0);
        if let Some(factor) = invalid_factor {
            return Err(anyhow!("Tolerance factors must be positive, got {}", factor));
        }
        if self.resample_by == Some(0) {
            return Err(anyhow!("resample_by must be greater than zero"));
        }
        Ok(())
    }
}

impl IndicatorConfig {
    pub fn bollinger_calculator(&self) -> BollingerCalculator {
        BollingerCalculator::with_settings(self.bollinger_period, self.bollinger_multiplier)
    }
}

impl ExtremaConfig {
    pub fn detector(&self) -> ExtremaDetector {
        ExtremaDetector::with_settings(self.window, self.significance)
    }
}

impl LevelConfig {
    pub fn detector(&self) -> LevelDetector {
        LevelDetector::with_settings(self.window, self.num_pairs)
            .with_factors(self.factor_grid.clone())
    }
}

impl PhaseConfig {
    pub fn moving_average_segmenter(&self) -> MovingAverageSegmenter {
        MovingAverageSegmenter::with_settings(
            self.ma_period,
            self.min_phase_length,
            self.sideways_band_ratio,
        )
    }

    /// Range-bound segmenter sharing the indicator and extrema settings
    pub fn range_bound_segmenter(
        &self,
        indicators: &IndicatorConfig,
        extrema: &ExtremaConfig,
    ) -> RangeBoundSegmenter {
        RangeBoundSegmenter {
            bollinger: indicators.bollinger_calculator(),
            extrema: extrema.detector(),
            adx_period: indicators.adx_period,
            rsi_period: indicators.rsi_period,
            adx_trend_threshold: self.adx_trend_threshold,
            rsi_neutral_low: self.rsi_neutral_low,
            rsi_neutral_high: self.rsi_neutral_high,
            min_sideways_length: self.min_sideways_length,
            min_trend_length: self.min_trend_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = AnalysisConfig::default();

        assert_eq!(config.indicators.sma_period, 20);
        assert_eq!(config.indicators.ema_period, 50);
        assert_eq!(config.indicators.rsi_period, 14);
        assert_eq!(config.indicators.macd.slow_period, 26);
        assert_eq!(config.extrema.window, 6);
        assert_eq!(config.phases.min_phase_length, 14);
        assert_eq!(config.phases.segmenter, SegmenterKind::MovingAverage);
        assert_eq!(config.levels.window, 12);
        assert_eq!(config.levels.num_pairs, 3);
        assert_eq!(config.levels.factor_grid.len(), 10);
        assert!((config.levels.factor_grid[0] - 0.1).abs() < 1e-12);
        assert!(config.resample_by.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_named_defaults() {
        let json = r#"{
            "indicators": { "rsi_period": 7 },
            "phases": { "segmenter": "range_bound" },
            "resample_by": 5
        }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.indicators.rsi_period, 7);
        assert_eq!(config.indicators.atr_period, 14);
        assert_eq!(config.indicators.bollinger_multiplier, 2.0);
        assert_eq!(config.phases.segmenter, SegmenterKind::RangeBound);
        assert_eq!(config.phases.sideways_band_ratio, 0.05);
        assert_eq!(config.levels.num_pairs, 3);
        assert_eq!(config.resample_by, Some(5));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AnalysisConfig::load_from_file("does/not/exist.json").unwrap();
        assert_eq!(config.indicators.sma_period, 20);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = std::env::temp_dir().join("trendscope_malformed_config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(AnalysisConfig::load_from_file(&path).is_err());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_validation_rejects_bad_settings() {
        let mut config = AnalysisConfig::default();
        config.levels.window = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("levels.window"));

        let mut config = AnalysisConfig::default();
        config.phases.rsi_neutral_low = 70.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.indicators.macd.fast_period = 30;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.resample_by = Some(0);
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.levels.factor_grid = Vec::new();
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.levels.factor_grid = vec![0.2, -0.1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_factor_grid_from_json_reaches_detector() {
        let json = r#"{ "levels": { "factor_grid": [0.25, 0.75] } }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.levels.window, 12);
        assert_eq!(config.levels.detector().factors, vec![0.25, 0.75]);
    }

    #[test]
    fn test_components_follow_config() {
        let mut config = AnalysisConfig::default();
        config.phases.min_trend_length = 9;
        config.indicators.bollinger_period = 10;

        let segmenter = config
            .phases
            .range_bound_segmenter(&config.indicators, &config.extrema);
        assert_eq!(segmenter.min_trend_length, 9);
        assert_eq!(segmenter.bollinger.period, 10);
        assert_eq!(config.levels.detector().window, 12);
        assert_eq!(config.phases.moving_average_segmenter().min_phase_length, 14);
    }
}
