//! Momentum indicators: RSI and simple moving average.
//!
//! Both return one value per input bar, `None` for the warm-up region where
//! the indicator is not yet reliable. Dependent logic (pattern confidence,
//! recommendations) checks series length before consuming these.

use crate::Ohlcv;

/// Default RSI period. RSI values are reliable only once this many bars exist.
pub const RSI_PERIOD: usize = 14;

/// Default SMA window used for the trend statement.
pub const SMA_WINDOW: usize = 50;

/// RSI threshold above which the aggregator flags a symbol as overbought.
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// RSI threshold below which the aggregator flags a symbol as oversold.
pub const RSI_OVERSOLD: f64 = 30.0;

/// Floor substituted for a zero average loss so `rs` stays finite.
const AVG_LOSS_FLOOR: f64 = 1e-10;

/// Relative Strength Index over closing prices.
///
/// Plain rolling means of gains and losses over the trailing `period` deltas
/// (not Wilder smoothing), `rs = avg_gain / avg_loss` with the zero-loss case
/// floored, `rsi = 100 - 100 / (1 + rs)`. The first `period - 1` indices are
/// `None`: their shrinking-window values are unreliable and nothing downstream
/// may consume them.
pub fn rsi<T: Ohlcv>(bars: &[T], period: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    if period == 0 {
        return vec![None; n];
    }

    // Per-bar gains/losses; delta at index 0 is taken as zero.
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let delta = bars[i].close() - bars[i - 1].close();
        gains[i] = delta.max(0.0);
        losses[i] = (-delta).max(0.0);
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        if i + 1 < period {
            out.push(None);
            continue;
        }
        let start = i + 1 - period;
        let avg_gain = gains[start..=i].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[start..=i].iter().sum::<f64>() / period as f64;
        let denom = if avg_loss == 0.0 {
            AVG_LOSS_FLOOR
        } else {
            avg_loss
        };
        let rs = avg_gain / denom;
        out.push(Some(100.0 - 100.0 / (1.0 + rs)));
    }

    out
}

/// Simple moving average of closing prices; `None` below `window - 1`.
pub fn sma<T: Ohlcv>(bars: &[T], window: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    if window == 0 {
        return vec![None; n];
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        let start = i + 1 - window;
        let mean = bars[start..=i].iter().map(|b| b.close()).sum::<f64>() / window as f64;
        out.push(Some(mean));
    }

    out
}
