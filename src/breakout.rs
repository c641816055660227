//! Support/resistance breakout detection.
//!
//! Compares the latest bar against a rolling high/low/volume envelope over the
//! most recent `lookback` bars (the envelope includes the latest bar itself:
//! it is computed first, then the last close is tested against it).

use crate::{Ohlcv, Signal, VolumeKind};

/// Default envelope length.
pub const BREAKOUT_LOOKBACK: usize = 20;

/// Envelope parameters for [`detect_breakout`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BreakoutParams {
    pub lookback: usize,
    /// Last-bar volume must exceed `volume_multiplier * avg_volume` for a
    /// breakout to count.
    pub volume_multiplier: f64,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self::for_kind(VolumeKind::Share)
    }
}

impl BreakoutParams {
    /// Default parameters for the given volume semantics: share volume uses a
    /// 1.5x multiplier, tick-count volume 2.0x.
    pub fn for_kind(kind: VolumeKind) -> Self {
        Self {
            lookback: BREAKOUT_LOOKBACK,
            volume_multiplier: kind.breakout_multiplier(),
        }
    }
}

/// A detected breakout: direction plus the level that was broken.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Breakout {
    pub direction: Signal,
    /// The broken resistance (bullish) or support (bearish) level.
    pub level: f64,
    /// Human-readable statement naming the broken level.
    pub detail: String,
}

/// Test the last bar against the trailing envelope. Returns `None` when the
/// series is shorter than `lookback` or no level was broken on elevated
/// volume.
pub fn detect_breakout<T: Ohlcv>(bars: &[T], params: &BreakoutParams) -> Option<Breakout> {
    let n = bars.len();
    if params.lookback == 0 || n < params.lookback {
        return None;
    }

    let window = &bars[n - params.lookback..];
    let resistance = window.iter().map(|b| b.high()).fold(f64::MIN, f64::max);
    let support = window.iter().map(|b| b.low()).fold(f64::MAX, f64::min);
    let avg_volume = window.iter().map(|b| b.volume()).sum::<f64>() / params.lookback as f64;

    let last = &bars[n - 1];
    let elevated = last.volume() > params.volume_multiplier * avg_volume;

    if last.close() > resistance && elevated {
        Some(Breakout {
            direction: Signal::Bullish,
            level: resistance,
            detail: format!("Price broke above resistance (${resistance:.2}) with high volume"),
        })
    } else if last.close() < support && elevated {
        Some(Breakout {
            direction: Signal::Bearish,
            level: support,
            detail: format!("Price broke below support (${support:.2}) with high volume"),
        })
    } else {
        None
    }
}
