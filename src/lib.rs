//! Technical analysis over OHLC bar series.
//!
//! Indicators, alternating extrema, market phase segmentation, and
//! support/resistance levels, all computed as pure functions over a slice of
//! any type implementing [`Bar`].

pub mod analysis;
pub mod bar;
pub mod config;
pub mod extrema;
pub mod indicators;
pub mod levels;
pub mod phases;
pub mod resample;

pub use analysis::{MarketAnalyzer, MarketSnapshot};
pub use bar::{Bar, Candle};
pub use config::AnalysisConfig;
pub use extrema::{Extrema, ExtremaDetector, Extremum, ExtremumKind};
pub use levels::{Level, LevelDetector, SupportResistance, Touch};
pub use phases::{Phase, PhaseSegmenter, PhaseType};
