//! Stateless technical indicators.
//!
//! Every function returns a vector with the same length as its input.
//! Entries without enough history are `0.0` (or `None` for the MACD signal
//! line), so callers can index by bar position without length checks.

pub mod bollinger;
pub mod directional;
pub mod macd;
pub mod moving_average;
pub mod oscillators;
pub mod volatility;
pub mod volume;

pub use bollinger::{BollingerBands, BollingerCalculator};
pub use directional::{average_directional_index, directional_index, directional_indicators};
pub use macd::{MacdOutput, MacdSettings, macd};
pub use moving_average::{ema, latest_sma, sma};
pub use oscillators::{rate_of_change, rsi};
pub use volatility::{average_true_range, true_range};
pub use volume::{typical_price, vwap};
