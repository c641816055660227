//! # candlesig - Candlestick Signal-Detection Engine
//!
//! Pure technical-analysis library over OHLCV bar series: RSI and SMA momentum
//! indicators, support/resistance breakout detection, candlestick pattern
//! recognition with a heuristic confidence score, and a recommendation/alert
//! aggregator. No I/O, no timers, no shared state - every function is a pure
//! computation over an immutable slice of bars.
//!
//! ## Quick Start
//!
//! ```rust
//! use candlesig::prelude::*;
//! use chrono::{TimeZone, Utc};
//!
//! // Build a series (normally produced by your market-data adapter)
//! let bars: Vec<Bar> = (0..30)
//!     .map(|i| {
//!         let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
//!             + chrono::Duration::minutes(i);
//!         let base = 100.0 + i as f64 * 0.2;
//!         Bar::new(ts, base, base + 0.5, base - 0.5, base + 0.1, 10_000.0)
//!     })
//!     .collect();
//!
//! let analyzer = Analyzer::builder()
//!     .volume_kind(VolumeKind::Share)
//!     .build()
//!     .unwrap();
//!
//! let analysis = analyzer.analyze("DEMO", &bars).unwrap();
//! for finding in &analysis.findings {
//!     println!("{} {} ({:.1})", finding.pattern.name(), finding.signal, finding.confidence);
//! }
//! ```

pub mod advise;
pub mod breakout;
pub mod momentum;
pub mod patterns;
pub mod report;

pub mod prelude {
    pub use crate::{
        // Aggregator
        advise::{generate_alerts, generate_recommendations},
        // Breakout detector
        breakout::{detect_breakout, Breakout, BreakoutParams},
        // Momentum indicators
        momentum::{rsi, sma, RSI_PERIOD, SMA_WINDOW},
        // Pattern recognizer
        patterns::{detect_patterns, Finding, Pattern},
        // Report
        report::{findings_csv_string, write_findings_csv},
        // Parallel
        scan_parallel,
        // Engine
        Analysis,
        Analyzer,
        AnalyzerBuilder,
        AnalyzerConfig,
        // Types
        Bar,
        Ohlcv,
        OhlcvExt,
        Result,
        ScanError,
        Signal,
        SignalError,
        VolumeKind,
    };
}

use chrono::{DateTime, Utc};
use tracing::debug;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, SignalError>;

/// Errors surfaced at the analyzer boundary.
///
/// Insufficient data is never an error: indicators return `None`/empty output
/// below their minimum series length and dependent logic checks length first.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("malformed bar at index {index}: {reason}")]
    MalformedBar { index: usize, reason: &'static str },

    #[error("timestamps not strictly increasing at index {index}")]
    NonMonotonicTimestamps { index: usize },

    #[error("csv report: {0}")]
    Report(#[from] csv::Error),

    #[error("report io: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================
// CORE TYPES
// ============================================================

/// Directional bias of a signal or pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Signal {
    Bullish,
    Neutral,
    Bearish,
}

impl Signal {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Signal::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Signal::Bearish)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Signal::Bullish => "Bullish",
            Signal::Neutral => "Neutral",
            Signal::Bearish => "Bearish",
        })
    }
}

/// Semantics of the `volume` field of a series.
///
/// Quote-provider feeds report share volume; broker-terminal feeds report tick
/// counts. The two need different breakout thresholds and different wording in
/// rendered statements, so the kind travels with the series instead of a
/// stringly-typed data-source name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VolumeKind {
    #[default]
    Share,
    Tick,
}

impl VolumeKind {
    /// Default breakout volume multiplier for this kind of volume.
    #[inline]
    pub fn breakout_multiplier(self) -> f64 {
        match self {
            VolumeKind::Share => 1.5,
            VolumeKind::Tick => 2.0,
        }
    }

    /// Prefix used in human-readable volume statements ("tick volume" vs "volume").
    #[inline]
    pub(crate) fn volume_word(self) -> &'static str {
        match self {
            VolumeKind::Share => "",
            VolumeKind::Tick => "tick ",
        }
    }
}

// ============================================================
// OHLCV TRAITS + BAR
// ============================================================

/// Core OHLCV data trait - the seam between the engine and caller-owned bar
/// types. Adapters may feed their own structs without copying into [`Bar`].
pub trait Ohlcv {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Extension trait with computed candle geometry.
pub trait OhlcvExt: Ohlcv {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Midpoint of the real body.
    #[inline]
    fn midpoint(&self) -> f64 {
        (self.open() + self.close()) / 2.0
    }

    /// Validate OHLCV consistency for a single bar.
    fn validate(&self) -> Result<()> {
        let (o, h, l, c) = (self.open(), self.high(), self.low(), self.close());
        if o.is_nan() || h.is_nan() || l.is_nan() || c.is_nan() {
            return Err(SignalError::MalformedBar {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if o.is_infinite() || h.is_infinite() || l.is_infinite() || c.is_infinite() {
            return Err(SignalError::MalformedBar {
                index: 0,
                reason: "infinite value in OHLC",
            });
        }
        if h < l {
            return Err(SignalError::MalformedBar {
                index: 0,
                reason: "high < low",
            });
        }
        if o.min(c) < l || o.max(c) > h {
            return Err(SignalError::MalformedBar {
                index: 0,
                reason: "open/close outside high-low range",
            });
        }
        if !(self.volume() >= 0.0) || self.volume().is_infinite() {
            return Err(SignalError::MalformedBar {
                index: 0,
                reason: "volume negative or not finite",
            });
        }
        Ok(())
    }
}

impl<T: Ohlcv> OhlcvExt for T {}

/// One OHLCV observation for a fixed time interval.
///
/// Invariants expected from the adapter (checked by [`validate_series`], not
/// by the pure detector functions): `low <= min(open, close)`,
/// `max(open, close) <= high`, non-negative finite volume, strictly
/// increasing timestamps across a series.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl Ohlcv for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Validate a whole series: per-bar OHLC invariants plus strictly increasing
/// timestamps. The adapter owns well-formedness; this is the opt-in guard at
/// the analyzer boundary (`validate_data`).
pub fn validate_series<T: Ohlcv>(bars: &[T]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            SignalError::MalformedBar { reason, .. } => {
                SignalError::MalformedBar { index: i, reason }
            }
            other => other,
        })?;
        if i > 0 && bars[i - 1].timestamp() >= bar.timestamp() {
            return Err(SignalError::NonMonotonicTimestamps { index: i });
        }
    }
    Ok(())
}

// ============================================================
// ANALYZER
// ============================================================

/// Analyzer configuration. Everything here is caller-owned: the engine holds
/// no other state and never mutates an input series.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalyzerConfig {
    pub rsi_period: usize,
    pub sma_window: usize,
    pub breakout: breakout::BreakoutParams,
    pub volume_kind: VolumeKind,
    pub validate_data: bool,
    pub min_confidence: Option<f64>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rsi_period: momentum::RSI_PERIOD,
            sma_window: momentum::SMA_WINDOW,
            breakout: breakout::BreakoutParams::for_kind(VolumeKind::Share),
            volume_kind: VolumeKind::Share,
            validate_data: false,
            min_confidence: None,
        }
    }
}

impl AnalyzerConfig {
    fn validate(&self) -> Result<()> {
        if self.rsi_period == 0 {
            return Err(SignalError::InvalidConfig("rsi_period must be > 0".into()));
        }
        if self.sma_window == 0 {
            return Err(SignalError::InvalidConfig("sma_window must be > 0".into()));
        }
        if self.breakout.lookback == 0 {
            return Err(SignalError::InvalidConfig(
                "breakout lookback must be > 0".into(),
            ));
        }
        if !(self.breakout.volume_multiplier > 0.0) || self.breakout.volume_multiplier.is_infinite()
        {
            return Err(SignalError::InvalidConfig(
                "breakout volume_multiplier must be finite and > 0".into(),
            ));
        }
        if let Some(floor) = self.min_confidence {
            if !(0.0..=100.0).contains(&floor) {
                return Err(SignalError::InvalidConfig(format!(
                    "min_confidence {floor} out of range [0, 100]"
                )));
            }
        }
        Ok(())
    }
}

/// Combined output of one analysis pass over a series.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Analysis {
    pub symbol: String,
    pub findings: Vec<patterns::Finding>,
    pub breakout: Option<breakout::Breakout>,
    /// Latest RSI value, when the series is long enough.
    pub rsi: Option<f64>,
    /// Latest SMA value, when the series is long enough.
    pub sma: Option<f64>,
}

/// Stateless signal-detection engine.
///
/// Bundles the configuration the leaf functions take as parameters; safe to
/// share across threads and to call concurrently for different series.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Analyzer with default configuration (share volume).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Scan the series for candlestick patterns, applying the configured
    /// confidence floor.
    pub fn scan<T: Ohlcv>(&self, bars: &[T]) -> Result<Vec<patterns::Finding>> {
        if self.config.validate_data {
            validate_series(bars)?;
        }
        let mut findings = patterns::detect_patterns(bars);
        if let Some(floor) = self.config.min_confidence {
            findings.retain(|f| f.confidence >= floor);
        }
        Ok(findings)
    }

    /// Run the breakout detector with the configured envelope parameters.
    pub fn breakout<T: Ohlcv>(&self, bars: &[T]) -> Result<Option<breakout::Breakout>> {
        if self.config.validate_data {
            validate_series(bars)?;
        }
        Ok(breakout::detect_breakout(bars, &self.config.breakout))
    }

    /// Full pass: patterns, breakout and the latest momentum values.
    pub fn analyze<T: Ohlcv>(&self, symbol: &str, bars: &[T]) -> Result<Analysis> {
        if self.config.validate_data {
            validate_series(bars)?;
        }

        let mut findings = patterns::detect_patterns(bars);
        if let Some(floor) = self.config.min_confidence {
            findings.retain(|f| f.confidence >= floor);
        }
        let breakout = breakout::detect_breakout(bars, &self.config.breakout);
        let rsi = momentum::rsi(bars, self.config.rsi_period)
            .last()
            .copied()
            .flatten();
        let sma = momentum::sma(bars, self.config.sma_window)
            .last()
            .copied()
            .flatten();

        debug!(
            symbol,
            bars = bars.len(),
            findings = findings.len(),
            breakout = breakout.is_some(),
            "analysis pass complete"
        );

        Ok(Analysis {
            symbol: symbol.to_string(),
            findings,
            breakout,
            rsi,
            sma,
        })
    }

    /// Ordered recommendation statements for one instrument, worded for the
    /// configured volume semantics.
    pub fn recommendations<T: Ohlcv>(
        &self,
        symbol: &str,
        session_volume: &[T],
        change_pct: Option<f64>,
        bars: &[T],
    ) -> Vec<String> {
        advise::generate_recommendations(
            symbol,
            session_volume,
            change_pct,
            bars,
            self.config.volume_kind,
        )
    }

    /// Short alert list for one instrument.
    pub fn alerts<T: Ohlcv>(
        &self,
        symbol: &str,
        change_pct: Option<f64>,
        volume_change_pct: Option<f64>,
        bars: &[T],
    ) -> Vec<String> {
        advise::generate_alerts(
            symbol,
            change_pct,
            volume_change_pct,
            bars,
            self.config.volume_kind,
        )
    }
}

/// Builder for [`Analyzer`] instances.
pub struct AnalyzerBuilder {
    config: AnalyzerConfig,
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
        }
    }

    pub fn rsi_period(mut self, period: usize) -> Self {
        self.config.rsi_period = period;
        self
    }

    pub fn sma_window(mut self, window: usize) -> Self {
        self.config.sma_window = window;
        self
    }

    /// Set the volume semantics; also resets the breakout multiplier to the
    /// default for that kind.
    pub fn volume_kind(mut self, kind: VolumeKind) -> Self {
        self.config.volume_kind = kind;
        self.config.breakout = breakout::BreakoutParams {
            lookback: self.config.breakout.lookback,
            volume_multiplier: kind.breakout_multiplier(),
        };
        self
    }

    /// Override the breakout envelope parameters.
    pub fn breakout(mut self, params: breakout::BreakoutParams) -> Self {
        self.config.breakout = params;
        self
    }

    /// Enable/disable series validation before each analysis call.
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Drop findings below this confidence.
    pub fn min_confidence(mut self, floor: f64) -> Self {
        self.config.min_confidence = Some(floor);
        self
    }

    pub fn build(self) -> Result<Analyzer> {
        Analyzer::with_config(self.config)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Error from analyzing a single instrument.
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: SignalError,
}

/// Analyze multiple instruments in parallel. Failures are isolated per symbol:
/// one malformed series never aborts the rest of the watchlist.
pub fn scan_parallel<'a, T, I>(
    analyzer: &Analyzer,
    instruments: I,
) -> (Vec<Analysis>, Vec<ScanError>)
where
    T: Ohlcv + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            analyzer.analyze(symbol, bars).map_err(|error| ScanError {
                symbol: symbol.to_string(),
                error,
            })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(a) => successes.push(a),
            Err(e) => errors.push(e),
        }
    }

    debug!(
        ok = successes.len(),
        failed = errors.len(),
        "parallel scan complete"
    );

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(i: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap() + chrono::Duration::minutes(i as i64)
    }

    fn bar(i: usize, o: f64, h: f64, l: f64, c: f64) -> Bar {
        Bar::new(ts(i), o, h, l, c, 1_000.0)
    }

    fn flat_series(n: usize) -> Vec<Bar> {
        (0..n).map(|i| bar(i, 100.0, 102.0, 98.0, 101.0)).collect()
    }

    #[test]
    fn test_ohlcv_ext() {
        let b = bar(0, 100.0, 110.0, 90.0, 105.0);
        assert_eq!(b.body(), 5.0);
        assert_eq!(b.range(), 20.0);
        assert_eq!(b.upper_shadow(), 5.0);
        assert_eq!(b.lower_shadow(), 10.0);
        assert_eq!(b.midpoint(), 102.5);
        assert!(b.is_bullish());
        assert!(!b.is_bearish());
    }

    #[test]
    fn test_validate_series_accepts_well_formed() {
        assert!(validate_series(&flat_series(10)).is_ok());
    }

    #[test]
    fn test_validate_series_rejects_high_below_low() {
        let mut bars = flat_series(5);
        bars[3] = Bar::new(ts(3), 100.0, 95.0, 98.0, 97.0, 1_000.0);
        match validate_series(&bars) {
            Err(SignalError::MalformedBar { index: 3, .. }) => {}
            other => panic!("expected MalformedBar at 3, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_series_rejects_close_above_high() {
        let mut bars = flat_series(5);
        bars[2] = Bar::new(ts(2), 100.0, 101.0, 98.0, 103.0, 1_000.0);
        assert!(matches!(
            validate_series(&bars),
            Err(SignalError::MalformedBar { index: 2, .. })
        ));
    }

    #[test]
    fn test_validate_series_rejects_duplicate_timestamp() {
        let mut bars = flat_series(5);
        bars[4].timestamp = bars[3].timestamp;
        assert!(matches!(
            validate_series(&bars),
            Err(SignalError::NonMonotonicTimestamps { index: 4 })
        ));
    }

    #[test]
    fn test_builder_rejects_zero_period() {
        assert!(Analyzer::builder().rsi_period(0).build().is_err());
        assert!(Analyzer::builder().sma_window(0).build().is_err());
    }

    #[test]
    fn test_builder_rejects_bad_min_confidence() {
        assert!(Analyzer::builder().min_confidence(120.0).build().is_err());
        assert!(Analyzer::builder().min_confidence(-1.0).build().is_err());
    }

    #[test]
    fn test_volume_kind_defaults() {
        assert_eq!(VolumeKind::Share.breakout_multiplier(), 1.5);
        assert_eq!(VolumeKind::Tick.breakout_multiplier(), 2.0);
        let analyzer = Analyzer::builder()
            .volume_kind(VolumeKind::Tick)
            .build()
            .unwrap();
        assert_eq!(analyzer.config().breakout.volume_multiplier, 2.0);
    }

    #[test]
    fn test_analyze_short_series_degrades_gracefully() {
        let bars = flat_series(1);
        let analysis = Analyzer::new().analyze("DEMO", &bars).unwrap();
        assert!(analysis.findings.is_empty());
        assert!(analysis.breakout.is_none());
        assert!(analysis.rsi.is_none());
        assert!(analysis.sma.is_none());
    }

    #[test]
    fn test_analyze_validation_propagates() {
        let mut bars = flat_series(5);
        bars[1] = Bar::new(ts(1), 100.0, 99.0, 101.0, 100.0, 1_000.0);
        let analyzer = Analyzer::builder().validate_data(true).build().unwrap();
        assert!(analyzer.analyze("DEMO", &bars).is_err());
    }

    #[test]
    fn test_scan_parallel_isolates_failures() {
        let good = flat_series(10);
        let mut bad = flat_series(10);
        bad[0] = Bar::new(ts(0), 100.0, 90.0, 98.0, 95.0, 1_000.0);

        let analyzer = Analyzer::builder().validate_data(true).build().unwrap();
        let instruments: Vec<(&str, &[Bar])> = vec![("GOOD", &good), ("BAD", &bad)];
        let (ok, failed) = scan_parallel(&analyzer, instruments);

        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].symbol, "GOOD");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].symbol, "BAD");
    }

    #[test]
    fn test_alerts_use_configured_volume_kind() {
        let analyzer = Analyzer::builder()
            .volume_kind(VolumeKind::Tick)
            .build()
            .unwrap();
        let bars: Vec<Bar> = Vec::new();
        let alerts = analyzer.alerts("EURUSD", None, Some(150.0), &bars);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("tick volume spike"));
    }

    #[test]
    fn test_analysis_serializes() {
        let analysis = Analyzer::new().analyze("DEMO", &flat_series(3)).unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["symbol"], "DEMO");
        assert!(json["findings"].as_array().unwrap().is_empty());
    }
}
