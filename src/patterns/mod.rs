//! Candlestick pattern recognition.
//!
//! Scans a bar series for eleven named formations plus the two three-candle
//! continuation formations, attaching a heuristic confidence score blended
//! from a volume-spike component and RSI positioning.
//!
//! Two detection slots run per index:
//!
//! 1. the primary rule chain ([`rules::PRIMARY`]), first match wins;
//! 2. the continuation slot (Three White Soldiers / Three Black Crows),
//!    checked independently from index 3 on.
//!
//! A single bar can therefore contribute up to two findings. That mirrors the
//! dashboard this engine was extracted from; deduplicating here would change
//! the reported history.

pub mod rules;

use chrono::{DateTime, Utc};

use crate::{momentum, Ohlcv, Signal};
use rules::Candle;

/// Trailing window used for the volume-spike component of the confidence
/// score.
const VOLUME_WINDOW: usize = 20;

/// Volume above `VOLUME_SPIKE_FACTOR * avg` earns the full volume component.
const VOLUME_SPIKE_FACTOR: f64 = 1.5;

/// RSI substituted while fewer than `RSI_PERIOD` bars precede the index.
const NEUTRAL_RSI: f64 = 50.0;

// ============================================================
// PATTERN ENUM
// ============================================================

/// The fixed set of recognized candlestick formations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Pattern {
    BullishEngulfing,
    BearishEngulfing,
    Doji,
    Hammer,
    ShootingStar,
    MorningStar,
    EveningStar,
    BullishHarami,
    BearishHarami,
    BullishKicker,
    BearishKicker,
    PiercingLine,
    DarkCloudCover,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

impl Pattern {
    /// Display name, as rendered in tables and reports.
    pub fn name(self) -> &'static str {
        match self {
            Pattern::BullishEngulfing => "Bullish Engulfing",
            Pattern::BearishEngulfing => "Bearish Engulfing",
            Pattern::Doji => "Doji",
            Pattern::Hammer => "Hammer",
            Pattern::ShootingStar => "Shooting Star",
            Pattern::MorningStar => "Morning Star",
            Pattern::EveningStar => "Evening Star",
            Pattern::BullishHarami => "Bullish Harami",
            Pattern::BearishHarami => "Bearish Harami",
            Pattern::BullishKicker => "Bullish Kicker",
            Pattern::BearishKicker => "Bearish Kicker",
            Pattern::PiercingLine => "Piercing Line",
            Pattern::DarkCloudCover => "Dark Cloud Cover",
            Pattern::ThreeWhiteSoldiers => "Three White Soldiers",
            Pattern::ThreeBlackCrows => "Three Black Crows",
        }
    }

    /// Directional bias of the formation.
    pub fn signal(self) -> Signal {
        match self {
            Pattern::BullishEngulfing
            | Pattern::Hammer
            | Pattern::MorningStar
            | Pattern::BullishHarami
            | Pattern::BullishKicker
            | Pattern::PiercingLine
            | Pattern::ThreeWhiteSoldiers => Signal::Bullish,
            Pattern::Doji => Signal::Neutral,
            Pattern::BearishEngulfing
            | Pattern::ShootingStar
            | Pattern::EveningStar
            | Pattern::BearishHarami
            | Pattern::BearishKicker
            | Pattern::DarkCloudCover
            | Pattern::ThreeBlackCrows => Signal::Bearish,
        }
    }

    /// Fixed explanation string for this formation.
    pub fn detail(self) -> &'static str {
        match self {
            Pattern::BullishEngulfing => "Price may rise after engulfing prior bearish candle",
            Pattern::BearishEngulfing => "Price may fall after engulfing prior bullish candle",
            Pattern::Doji => "Market indecision; watch for breakout",
            Pattern::Hammer => "Potential reversal upward after downtrend",
            Pattern::ShootingStar => "Potential reversal downward after uptrend",
            Pattern::MorningStar => "Strong reversal upward after downtrend",
            Pattern::EveningStar => "Strong reversal downward after uptrend",
            Pattern::BullishHarami => {
                "Potential reversal upward; small bullish candle inside bearish candle"
            }
            Pattern::BearishHarami => {
                "Potential reversal downward; small bearish candle inside bullish candle"
            }
            Pattern::BullishKicker => "Strong bullish reversal with gap up after downtrend",
            Pattern::BearishKicker => "Strong bearish reversal with gap down after uptrend",
            Pattern::PiercingLine => "Bullish reversal; bullish candle pierces bearish candle midpoint",
            Pattern::DarkCloudCover => {
                "Bearish reversal; bearish candle covers bullish candle midpoint"
            }
            Pattern::ThreeWhiteSoldiers => {
                "Strong upward momentum with three consecutive bullish candles"
            }
            Pattern::ThreeBlackCrows => {
                "Strong downward momentum with three consecutive bearish candles"
            }
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================
// FINDING
// ============================================================

/// One detected formation: the bar at which the pattern completed plus the
/// formation's signal, explanation and confidence.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Finding {
    pub timestamp: DateTime<Utc>,
    pub pattern: Pattern,
    pub signal: Signal,
    pub detail: &'static str,
    /// Heuristic score in [0, 100], rounded to one decimal. Not a
    /// probability.
    pub confidence: f64,
}

// ============================================================
// DETECTION
// ============================================================

/// Scan the series for candlestick formations.
///
/// Pure and idempotent: identical input yields identical output, nothing is
/// cached between calls. Series shorter than 3 bars produce no findings.
pub fn detect_patterns<T: Ohlcv>(bars: &[T]) -> Vec<Finding> {
    let mut findings = Vec::new();
    if bars.len() < 3 {
        return findings;
    }

    // RSI of the prefix ending at i equals the full-series RSI at i (the
    // rolling mean only looks backwards), so one pass serves every index.
    let rsi_series = momentum::rsi(bars, momentum::RSI_PERIOD);

    for i in 2..bars.len() {
        let curr = Candle::of(&bars[i]);
        let prev = Candle::of(&bars[i - 1]);
        let prev2 = Candle::of(&bars[i - 2]);

        let vol_score = volume_score(bars, i);
        let rsi_at = rsi_series[i].unwrap_or(NEUTRAL_RSI);
        let timestamp = bars[i].timestamp();

        if let Some((pattern, _)) = rules::PRIMARY
            .iter()
            .find(|(_, predicate)| predicate(curr, prev, prev2))
        {
            findings.push(make_finding(timestamp, *pattern, vol_score, rsi_at));
        }

        // Continuation slot, independent of the primary chain.
        if i >= 3 {
            if rules::three_white_soldiers(curr, prev, prev2) {
                findings.push(make_finding(
                    timestamp,
                    Pattern::ThreeWhiteSoldiers,
                    vol_score,
                    rsi_at,
                ));
            } else if rules::three_black_crows(curr, prev, prev2) {
                findings.push(make_finding(
                    timestamp,
                    Pattern::ThreeBlackCrows,
                    vol_score,
                    rsi_at,
                ));
            }
        }
    }

    findings
}

/// Volume component of the confidence score: 50 when the bar's volume exceeds
/// 1.5x the trailing 20-bar average (ending just before the bar), else 0.
fn volume_score<T: Ohlcv>(bars: &[T], index: usize) -> f64 {
    let start = index.saturating_sub(VOLUME_WINDOW);
    let window = &bars[start..index];
    let avg = window.iter().map(|b| b.volume()).sum::<f64>() / window.len() as f64;
    if bars[index].volume() > VOLUME_SPIKE_FACTOR * avg {
        50.0
    } else {
        0.0
    }
}

fn make_finding(timestamp: DateTime<Utc>, pattern: Pattern, vol_score: f64, rsi: f64) -> Finding {
    let signal = pattern.signal();
    Finding {
        timestamp,
        pattern,
        signal,
        detail: pattern.detail(),
        confidence: confidence(signal, vol_score, rsi),
    }
}

/// Blend the volume component with RSI positioning. Bearish formations score
/// off the inverted RSI: a bearish signal in overbought territory is the
/// stronger one.
fn confidence(signal: Signal, vol_score: f64, rsi: f64) -> f64 {
    let rsi_score = match signal {
        Signal::Bearish => 50.0 * ((100.0 - rsi) / 100.0),
        Signal::Bullish | Signal::Neutral => 50.0 * (rsi / 100.0),
    };
    let raw = (vol_score + rsi_score).clamp(0.0, 100.0);
    (raw * 10.0).round() / 10.0
}
