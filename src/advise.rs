//! Recommendation and alert aggregation.
//!
//! Thin, pure layer over the detectors: combines breakout, volume-spike,
//! momentum, pattern, SMA-trend and RSI statements into ordered
//! human-readable lists. Rendering and delivery (tables, toasts, exports)
//! stay with the caller.

use crate::{
    breakout::{detect_breakout, BreakoutParams},
    momentum::{self, RSI_OVERBOUGHT, RSI_OVERSOLD, RSI_PERIOD, SMA_WINDOW},
    patterns::detect_patterns,
    Ohlcv, VolumeKind,
};

/// Appended to every recommendation list, always last.
pub const DISCLAIMER: &str = "Note: These are not financial advice; consult a professional.";

/// Bar-over-bar volume increase (in percent) that counts as a session spike.
const VOLUME_SPIKE_PCT: f64 = 50.0;

/// Absolute percent change that counts as significant price movement.
const PRICE_ALERT_PCT: f64 = 5.0;

/// Volume change (in percent) that counts as a significant spike alert.
const VOLUME_ALERT_PCT: f64 = 100.0;

/// Percent change classifying momentum as bullish/bearish rather than stable.
const MOMENTUM_PCT: f64 = 2.0;

/// How many of the most recent pattern findings are rendered.
const RECENT_FINDINGS: usize = 3;

/// Build the ordered recommendation list for one instrument.
///
/// `session_volume` is the (possibly separately sampled) series used for the
/// volume-spike statement; `bars` feeds the breakout, pattern, SMA and RSI
/// statements. `change_pct` is the session price change; `None` (or a
/// non-finite value) skips the momentum statement.
pub fn generate_recommendations<T: Ohlcv>(
    symbol: &str,
    session_volume: &[T],
    change_pct: Option<f64>,
    bars: &[T],
    kind: VolumeKind,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if let Some(b) = detect_breakout(bars, &BreakoutParams::for_kind(kind)) {
        recommendations.push(format!("{} breakout detected: {}", b.direction, b.detail));
    }

    let spikes = volume_spike_times(session_volume);
    if !spikes.is_empty() {
        recommendations.push(format!(
            "High {}volume spikes detected at {}, indicating strong buying/selling pressure.",
            kind.volume_word(),
            spikes.join(", ")
        ));
    }

    if let Some(change) = change_pct.filter(|c| c.is_finite()) {
        if change > MOMENTUM_PCT {
            recommendations.push(format!(
                "{symbol} (+{change:.3}%) shows bullish momentum; consider holding or buying on dips."
            ));
        } else if change < -MOMENTUM_PCT {
            recommendations.push(format!(
                "{symbol} ({change:+.3}%) shows bearish momentum; consider selling or waiting for a reversal."
            ));
        } else {
            recommendations.push(format!(
                "{symbol} ({change:+.3}%) is stable; monitor for breakout patterns or candlestick signals."
            ));
        }
    }

    let findings = detect_patterns(bars);
    for f in findings.iter().rev().take(RECENT_FINDINGS).rev() {
        recommendations.push(format!(
            "{} pattern detected at {}: {} ({}, Confidence: {:.1})",
            f.signal,
            f.timestamp.format("%Y-%m-%d %H:%M:%S %Z"),
            f.pattern.name(),
            f.detail,
            f.confidence
        ));
    }

    if bars.len() >= SMA_WINDOW {
        if let Some(sma) = momentum::sma(bars, SMA_WINDOW).last().copied().flatten() {
            let price = bars[bars.len() - 1].close();
            if price > sma {
                recommendations
                    .push("Price is above 50-period SMA; bullish trend indicated.".to_string());
            } else if price < sma {
                recommendations
                    .push("Price is below 50-period SMA; bearish trend indicated.".to_string());
            }
        }
    }

    if bars.len() >= RSI_PERIOD {
        if let Some(rsi) = momentum::rsi(bars, RSI_PERIOD).last().copied().flatten() {
            if rsi > RSI_OVERBOUGHT {
                recommendations.push(
                    "RSI above 70; symbol may be overbought, consider taking profits.".to_string(),
                );
            } else if rsi < RSI_OVERSOLD {
                recommendations.push(
                    "RSI below 30; symbol may be oversold, potential buying opportunity."
                        .to_string(),
                );
            }
        }
    }

    if recommendations.is_empty() {
        recommendations
            .push("No specific recommendations; monitor market conditions.".to_string());
    }
    recommendations.push(DISCLAIMER.to_string());

    recommendations
}

/// Build the short alert list for one instrument.
pub fn generate_alerts<T: Ohlcv>(
    symbol: &str,
    change_pct: Option<f64>,
    volume_change_pct: Option<f64>,
    bars: &[T],
    kind: VolumeKind,
) -> Vec<String> {
    let mut alerts = Vec::new();

    if let Some(change) = change_pct.filter(|c| c.is_finite()) {
        if change.abs() > PRICE_ALERT_PCT {
            alerts.push(format!(
                "Significant price movement in {symbol}: {change:+.3}%"
            ));
        }
    }

    if let Some(volume_change) = volume_change_pct.filter(|v| v.is_finite()) {
        if volume_change > VOLUME_ALERT_PCT {
            alerts.push(format!(
                "Significant {}volume spike in {symbol}: +{volume_change:.3}%",
                kind.volume_word()
            ));
        }
    }

    if let Some(b) = detect_breakout(bars, &BreakoutParams::for_kind(kind)) {
        alerts.push(format!(
            "{} breakout detected for {symbol}: {}",
            b.direction, b.detail
        ));
    }

    alerts
}

/// Times (HH:MM) at which the bar-over-bar volume change exceeded the spike
/// threshold. A jump from zero volume counts as a spike.
fn volume_spike_times<T: Ohlcv>(session_volume: &[T]) -> Vec<String> {
    let mut times = Vec::new();
    for pair in session_volume.windows(2) {
        let (prev, curr) = (pair[0].volume(), pair[1].volume());
        let spiked = if prev > 0.0 {
            (curr - prev) / prev * 100.0 > VOLUME_SPIKE_PCT
        } else {
            curr > 0.0
        };
        if spiked {
            times.push(pair[1].timestamp().format("%H:%M").to_string());
        }
    }
    times
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bar;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn ts(i: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap() + Duration::minutes(i as i64)
    }

    fn bar_v(i: usize, close: f64, volume: f64) -> Bar {
        Bar::new(ts(i), close, close + 1.0, close - 1.0, close, volume)
    }

    fn flat(n: usize) -> Vec<Bar> {
        (0..n).map(|i| bar_v(i, 100.0, 1_000.0)).collect()
    }

    #[test]
    fn test_alerts_volume_spike_only() {
        // |1| <= 5 so no price alert; 150 > 100 so the volume alert fires;
        // an empty series cannot break out.
        let bars: Vec<Bar> = Vec::new();
        let alerts = generate_alerts("AAPL", Some(1.0), Some(150.0), &bars, VolumeKind::Share);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0], "Significant volume spike in AAPL: +150.000%");
    }

    #[test]
    fn test_alerts_price_move() {
        let bars: Vec<Bar> = Vec::new();
        let alerts = generate_alerts("EURUSD", Some(-6.25), None, &bars, VolumeKind::Tick);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0], "Significant price movement in EURUSD: -6.250%");
    }

    #[test]
    fn test_alerts_tick_wording() {
        let bars: Vec<Bar> = Vec::new();
        let alerts = generate_alerts("EURUSD", None, Some(120.0), &bars, VolumeKind::Tick);
        assert_eq!(alerts[0], "Significant tick volume spike in EURUSD: +120.000%");
    }

    #[test]
    fn test_alerts_nan_is_skipped() {
        let bars: Vec<Bar> = Vec::new();
        let alerts = generate_alerts("X", Some(f64::NAN), Some(f64::NAN), &bars, VolumeKind::Share);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_recommendations_disclaimer_always_last() {
        let recs =
            generate_recommendations("AAPL", &flat(5), Some(1.0), &flat(5), VolumeKind::Share);
        assert_eq!(recs.last().unwrap(), DISCLAIMER);
    }

    #[test]
    fn test_recommendations_empty_content() {
        let bars: Vec<Bar> = Vec::new();
        let recs = generate_recommendations("AAPL", &bars, None, &bars, VolumeKind::Share);
        assert_eq!(
            recs,
            vec![
                "No specific recommendations; monitor market conditions.".to_string(),
                DISCLAIMER.to_string(),
            ]
        );
    }

    #[test]
    fn test_recommendations_stable_momentum_wording() {
        let recs =
            generate_recommendations("AAPL", &flat(2), Some(1.0), &flat(2), VolumeKind::Share);
        assert!(recs
            .iter()
            .any(|r| r == "AAPL (+1.000%) is stable; monitor for breakout patterns or candlestick signals."));
    }

    #[test]
    fn test_recommendations_bullish_momentum_wording() {
        let recs =
            generate_recommendations("AAPL", &flat(2), Some(3.5), &flat(2), VolumeKind::Share);
        assert!(recs.iter().any(|r| r.contains("(+3.500%) shows bullish momentum")));
    }

    #[test]
    fn test_volume_spike_times_listed() {
        let session = vec![
            bar_v(0, 100.0, 1_000.0),
            bar_v(1, 100.0, 1_200.0), // +20%, no spike
            bar_v(2, 100.0, 2_000.0), // +66%, spike at 14:02
            bar_v(3, 100.0, 2_100.0),
        ];
        let recs =
            generate_recommendations("AAPL", &session, None, &flat(2), VolumeKind::Share);
        let spike_line = recs
            .iter()
            .find(|r| r.contains("volume spikes detected"))
            .expect("spike statement");
        assert!(spike_line.contains("14:02"), "got: {spike_line}");
        assert!(!spike_line.contains("14:01"));
    }

    #[test]
    fn test_rsi_overbought_note() {
        let bars: Vec<Bar> = (0..20).map(|i| bar_v(i, 100.0 + i as f64, 1_000.0)).collect();
        let recs = generate_recommendations("AAPL", &[], None, &bars, VolumeKind::Share);
        assert!(recs
            .iter()
            .any(|r| r.contains("RSI above 70")), "recs: {recs:?}");
    }

    #[test]
    fn test_sma_trend_note() {
        let bars: Vec<Bar> = (0..60).map(|i| bar_v(i, 100.0 + i as f64 * 0.5, 1_000.0)).collect();
        let recs = generate_recommendations("AAPL", &[], None, &bars, VolumeKind::Share);
        assert!(recs
            .iter()
            .any(|r| r == "Price is above 50-period SMA; bullish trend indicated."));
    }

    #[test]
    fn test_recent_findings_capped_at_three() {
        // Alternating engulfing candles generate many findings.
        let mut bars = Vec::new();
        for i in 0..30 {
            if i % 2 == 0 {
                bars.push(Bar::new(ts(i), 102.0, 102.5, 99.4, 99.6, 1_000.0));
            } else {
                bars.push(Bar::new(ts(i), 99.5, 103.1, 99.0, 102.9, 1_000.0));
            }
        }
        assert!(detect_patterns(&bars).len() > 3);
        let recs = generate_recommendations("AAPL", &[], None, &bars, VolumeKind::Share);
        let pattern_lines = recs
            .iter()
            .filter(|r| r.contains("pattern detected at"))
            .count();
        assert_eq!(pattern_lines, 3);
    }
}
