//! Delimited-text findings report.
//!
//! Serializes pattern findings to CSV with a fixed preamble explaining the
//! confidence formula, for download/export surfaces. Columns: symbol,
//! timestamp, pattern, signal, detail, confidence.

use std::io;

use crate::{patterns::Finding, Result};

/// Comment lines written ahead of the CSV header.
pub const REPORT_PREAMBLE: &[&str] = &[
    "# Candlestick pattern findings report.",
    "# Confidence blends a volume-spike component (50 when the bar's volume",
    "# exceeds 1.5x the trailing 20-bar average, otherwise 0) with RSI",
    "# positioning (50 * RSI/100 for bullish and neutral patterns,",
    "# 50 * (100 - RSI)/100 for bearish). Scores lie in [0, 100] and are",
    "# heuristic, not probabilities.",
];

/// Write the findings report for one symbol to `writer`.
pub fn write_findings_csv<W: io::Write>(
    mut writer: W,
    symbol: &str,
    findings: &[Finding],
) -> Result<()> {
    for line in REPORT_PREAMBLE {
        writeln!(writer, "{line}")?;
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "symbol",
        "timestamp",
        "pattern",
        "signal",
        "detail",
        "confidence",
    ])?;

    for f in findings {
        let timestamp = f.timestamp.format("%Y-%m-%d %H:%M:%S %Z").to_string();
        let signal = f.signal.to_string();
        let confidence = format!("{:.1}", f.confidence);
        csv.write_record([
            symbol,
            timestamp.as_str(),
            f.pattern.name(),
            signal.as_str(),
            f.detail,
            confidence.as_str(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// In-memory convenience wrapper around [`write_findings_csv`].
pub fn findings_csv_string(symbol: &str, findings: &[Finding]) -> Result<String> {
    let mut buf = Vec::new();
    write_findings_csv(&mut buf, symbol, findings)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::detect_patterns;
    use crate::Bar;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn ts(i: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap() + Duration::minutes(i as i64)
    }

    fn engulfing_series() -> Vec<Bar> {
        vec![
            Bar::new(ts(0), 10.0, 10.6, 9.8, 10.5, 1_000.0),
            Bar::new(ts(1), 10.0, 10.2, 7.8, 8.0, 1_000.0),
            Bar::new(ts(2), 7.0, 11.3, 6.8, 11.0, 1_000.0),
        ]
    }

    #[test]
    fn test_report_preamble_and_header() {
        let report = findings_csv_string("AAPL", &detect_patterns(&engulfing_series())).unwrap();
        assert!(report.starts_with("# Candlestick pattern findings report."));
        assert!(report.contains("symbol,timestamp,pattern,signal,detail,confidence"));
    }

    #[test]
    fn test_report_row_contents() {
        let report = findings_csv_string("AAPL", &detect_patterns(&engulfing_series())).unwrap();
        let row = report
            .lines()
            .find(|l| l.starts_with("AAPL,"))
            .expect("data row");
        assert!(row.contains("Bullish Engulfing"));
        assert!(row.contains("2024-03-01 09:32:00 UTC"));
        assert!(row.ends_with("25.0"));
    }

    #[test]
    fn test_report_empty_findings_still_has_header() {
        let report = findings_csv_string("AAPL", &[]).unwrap();
        let data_rows = report
            .lines()
            .filter(|l| !l.starts_with('#') && !l.is_empty())
            .count();
        assert_eq!(data_rows, 1); // header only
    }
}
