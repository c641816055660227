//! Candle geometry predicates and the ordered rule table.
//!
//! Every predicate takes the candle under test plus its two predecessors
//! `(curr, prev, prev2)`, ignoring the ones it does not need, so the priority
//! order lives in one auditable table instead of control-flow fallthrough.

use super::Pattern;

/// Lightweight price view of one bar; detached from the `Ohlcv` trait so
/// predicates stay plain functions testable in isolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn of<T: crate::Ohlcv>(bar: &T) -> Self {
        Self {
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
        }
    }

    #[inline]
    pub fn body(self) -> f64 {
        (self.close - self.open).abs()
    }

    #[inline]
    pub fn range(self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn is_bullish(self) -> bool {
        self.close > self.open
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        self.close < self.open
    }

    /// Midpoint of the real body.
    #[inline]
    pub fn midpoint(self) -> f64 {
        (self.open + self.close) / 2.0
    }
}

pub type Predicate = fn(Candle, Candle, Candle) -> bool;

/// Primary rule chain. Evaluated top to bottom per index; the first matching
/// rule claims the bar. Several predicates can hold simultaneously for
/// ambiguous candles (a Doji inside Harami bounds, for instance); the fixed
/// order is the tie-break.
pub const PRIMARY: &[(Pattern, Predicate)] = &[
    (Pattern::BullishEngulfing, bullish_engulfing),
    (Pattern::BearishEngulfing, bearish_engulfing),
    (Pattern::Doji, doji),
    (Pattern::Hammer, hammer),
    (Pattern::ShootingStar, shooting_star),
    (Pattern::MorningStar, morning_star),
    (Pattern::EveningStar, evening_star),
    (Pattern::BullishHarami, bullish_harami),
    (Pattern::BearishHarami, bearish_harami),
    (Pattern::BullishKicker, bullish_kicker),
    (Pattern::BearishKicker, bearish_kicker),
    (Pattern::PiercingLine, piercing_line),
    (Pattern::DarkCloudCover, dark_cloud_cover),
];

/// Bullish candle fully engulfs the prior bearish body.
pub fn bullish_engulfing(curr: Candle, prev: Candle, _prev2: Candle) -> bool {
    prev.is_bearish() && curr.is_bullish() && curr.close > prev.open && curr.open < prev.close
}

/// Bearish candle fully engulfs the prior bullish body.
pub fn bearish_engulfing(curr: Candle, prev: Candle, _prev2: Candle) -> bool {
    prev.is_bullish() && curr.is_bearish() && curr.close < prev.open && curr.open > prev.close
}

/// Body no larger than a tenth of the bar's range.
pub fn doji(curr: Candle, _prev: Candle, _prev2: Candle) -> bool {
    curr.body() <= 0.1 * curr.range()
}

/// Small body at the top of a long lower shadow.
pub fn hammer(curr: Candle, _prev: Candle, _prev2: Candle) -> bool {
    let range = curr.range();
    range > 2.0 * curr.body()
        && (curr.close - curr.low) >= 0.7 * range
        && (curr.open - curr.low) >= 0.7 * range
}

/// Small body at the bottom of a long upper shadow.
pub fn shooting_star(curr: Candle, _prev: Candle, _prev2: Candle) -> bool {
    let range = curr.range();
    range > 2.0 * curr.body()
        && (curr.high - curr.close) >= 0.7 * range
        && (curr.high - curr.open) >= 0.7 * range
}

/// Short-bodied middle candle, bullish close above the first body's midpoint.
pub fn morning_star(curr: Candle, prev: Candle, prev2: Candle) -> bool {
    prev2.is_bullish()
        && prev.is_bearish()
        && prev.body() < 0.3 * prev.range()
        && curr.is_bullish()
        && curr.close > prev2.midpoint()
}

/// Mirror of [`morning_star`].
pub fn evening_star(curr: Candle, prev: Candle, prev2: Candle) -> bool {
    prev2.is_bearish()
        && prev.is_bullish()
        && prev.body() < 0.3 * prev.range()
        && curr.is_bearish()
        && curr.close < prev2.midpoint()
}

/// Small bullish body inside the prior bearish body.
pub fn bullish_harami(curr: Candle, prev: Candle, _prev2: Candle) -> bool {
    prev.is_bearish() && curr.is_bullish() && curr.open >= prev.close && curr.close <= prev.open
}

/// Small bearish body inside the prior bullish body.
pub fn bearish_harami(curr: Candle, prev: Candle, _prev2: Candle) -> bool {
    prev.is_bullish() && curr.is_bearish() && curr.open <= prev.close && curr.close >= prev.open
}

/// Bullish candle opening above the prior bearish candle's high.
pub fn bullish_kicker(curr: Candle, prev: Candle, _prev2: Candle) -> bool {
    prev.is_bearish() && curr.is_bullish() && curr.open > prev.high
}

/// Bearish candle opening below the prior bullish candle's low.
pub fn bearish_kicker(curr: Candle, prev: Candle, _prev2: Candle) -> bool {
    prev.is_bullish() && curr.is_bearish() && curr.open < prev.low
}

/// Bullish close above the prior bearish body's midpoint, opening below its
/// close.
pub fn piercing_line(curr: Candle, prev: Candle, _prev2: Candle) -> bool {
    prev.is_bearish()
        && curr.is_bullish()
        && curr.close > prev.midpoint()
        && curr.open < prev.close
}

/// Mirror of [`piercing_line`].
pub fn dark_cloud_cover(curr: Candle, prev: Candle, _prev2: Candle) -> bool {
    prev.is_bullish()
        && curr.is_bearish()
        && curr.close < prev.midpoint()
        && curr.open > prev.close
}

/// Three consecutive bullish candles, each body filling more than half of its
/// own range.
pub fn three_white_soldiers(curr: Candle, prev: Candle, prev2: Candle) -> bool {
    curr.is_bullish()
        && prev.is_bullish()
        && prev2.is_bullish()
        && (curr.close - curr.open) > 0.5 * curr.range()
        && (prev.close - prev.open) > 0.5 * prev.range()
        && (prev2.close - prev2.open) > 0.5 * prev2.range()
}

/// Mirror of [`three_white_soldiers`].
pub fn three_black_crows(curr: Candle, prev: Candle, prev2: Candle) -> bool {
    curr.is_bearish()
        && prev.is_bearish()
        && prev2.is_bearish()
        && (curr.open - curr.close) > 0.5 * curr.range()
        && (prev.open - prev.close) > 0.5 * prev.range()
        && (prev2.open - prev2.close) > 0.5 * prev2.range()
}
