//! MACD (Moving Average Convergence Divergence).

use super::moving_average::ema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdSettings {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for MacdSettings {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD lines aligned to the input series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacdOutput {
    /// Fast EMA minus slow EMA, 0 before the slow EMA is seeded.
    pub macd_line: Vec<f64>,
    /// EMA of the valid MACD values, `None` until it has enough history.
    pub signal_line: Vec<Option<f64>>,
    /// MACD minus signal, with a missing signal read as 0.
    pub histogram: Vec<f64>,
}

impl MacdOutput {
    pub fn len(&self) -> usize {
        self.macd_line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd_line.is_empty()
    }

    /// First index carrying a signal value
    pub fn signal_start(&self) -> Option<usize> {
        self.signal_line.iter().position(Option::is_some)
    }
}

pub fn macd(closes: &[f64], settings: MacdSettings) -> MacdOutput {
    let n = closes.len();
    let mut output = MacdOutput {
        macd_line: vec![0.0; n],
        signal_line: vec![None; n],
        histogram: vec![0.0; n],
    };

    let MacdSettings {
        fast_period,
        slow_period,
        signal_period,
    } = settings;
    if fast_period == 0 || slow_period == 0 {
        return output;
    }

    // Both EMAs must be seeded before the line is defined
    let macd_start = fast_period.max(slow_period) - 1;
    if n <= macd_start {
        return output;
    }

    let fast_ema = ema(closes, fast_period);
    let slow_ema = ema(closes, slow_period);
    for i in macd_start..n {
        output.macd_line[i] = fast_ema[i] - slow_ema[i];
    }

    if signal_period > 0 {
        let signal_ema = ema(&output.macd_line[macd_start..], signal_period);
        let signal_start = macd_start + signal_period - 1;
        for i in signal_start..n {
            output.signal_line[i] = Some(signal_ema[i - macd_start]);
        }
    }

    for i in 0..n {
        output.histogram[i] = output.macd_line[i] - output.signal_line[i].unwrap_or(0.0);
    }
    output
}
