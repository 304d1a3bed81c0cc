//! Candle loading for the runner.
//!
//! Reads an OHLCV CSV with header `timestamp,open,high,low,close,volume`
//! and validates the series (ascending timestamps, consistent OHLC) before
//! anything downstream sees it. Market-data acquisition itself is outside
//! this crate; the CSV is the hand-off point.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use edgelab_core::domain::{validate_series, Candle, CandleError};

/// Timestamp formats accepted in candle files, tried in order.
pub const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Format used when writing candles back out.
pub const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed candle row: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognized timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("invalid candle series: {0}")]
    Invalid(#[from] CandleError),
}

#[derive(Debug, Serialize, Deserialize)]
struct CandleRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Parse a timestamp in any of the accepted formats. A bare date is midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Read and validate candles from any CSV source.
pub fn read_candles<R: Read>(reader: R) -> Result<Vec<Candle>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut candles = Vec::new();
    for (i, row) in rdr.deserialize::<CandleRow>().enumerate() {
        let row = row?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
            row: i + 1,
            value: row.timestamp.clone(),
        })?;
        candles.push(Candle {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    validate_series(&candles)?;
    Ok(candles)
}

/// Load and validate candles from a CSV file.
pub fn load_candles_csv(path: &Path) -> Result<Vec<Candle>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let candles = read_candles(file)?;
    info!(
        path = %path.display(),
        candles = candles.len(),
        "loaded candles"
    );
    Ok(candles)
}

/// Write candles as CSV in the same layout `read_candles` accepts.
pub fn write_candles<W: Write>(writer: W, candles: &[Candle]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for c in candles {
        wtr.serialize(CandleRow {
            timestamp: c.timestamp.format(WRITE_FORMAT).to_string(),
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Dataset hash for fingerprinting (BLAKE3 over every candle field).
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in candles {
        hasher.update(c.timestamp.to_string().as_bytes());
        hasher.update(&c.open.to_le_bytes());
        hasher.update(&c.high.to_le_bytes());
        hasher.update(&c.low.to_le_bytes());
        hasher.update(&c.close.to_le_bytes());
        hasher.update(&c.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgelab_core::domain::candles_from_closes;

    const SAMPLE: &str = "\
timestamp,open,high,low,close,volume
2024-01-02 09:00:00,2000.0,2010.0,1995.0,2005.0,1500
2024-01-02T10:00:00,2005.0,2020.0,2001.0,2018.5,1700
2024-01-03,2018.5,2030.0,2015.0,2025.0,900
";

    #[test]
    fn reads_all_timestamp_formats() {
        let candles = read_candles(SAMPLE.as_bytes()).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[1].close, 2018.5);
        assert_eq!(
            candles[2].timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn rejects_bad_timestamp() {
        let data = "timestamp,open,high,low,close,volume\n01/02/2024,1,2,0.5,1.5,10\n";
        match read_candles(data.as_bytes()) {
            Err(LoadError::Timestamp { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "01/02/2024");
            }
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unordered_rows() {
        let data = "timestamp,open,high,low,close,volume\n\
2024-01-02,1,2,0.5,1.5,10\n\
2024-01-01,1,2,0.5,1.5,10\n";
        assert!(matches!(
            read_candles(data.as_bytes()),
            Err(LoadError::Invalid(CandleError::OutOfOrder { index: 1, .. }))
        ));
    }

    #[test]
    fn rejects_non_numeric_field() {
        let data = "timestamp,open,high,low,close,volume\n2024-01-02,abc,2,0.5,1.5,10\n";
        assert!(matches!(read_candles(data.as_bytes()), Err(LoadError::Csv(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_candles_csv(Path::new("/nonexistent/candles.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn write_then_read_preserves_candles() {
        let candles = candles_from_closes(&[100.0, 101.5, 99.25]);
        let mut buf = Vec::new();
        write_candles(&mut buf, &candles).unwrap();
        assert_eq!(read_candles(buf.as_slice()).unwrap(), candles);
    }

    #[test]
    fn dataset_hash_is_stable_and_sensitive() {
        let a = candles_from_closes(&[100.0, 101.0]);
        let mut b = a.clone();
        assert_eq!(dataset_hash(&a), dataset_hash(&b));
        b[1].close = 101.5;
        assert_ne!(dataset_hash(&a), dataset_hash(&b));
        assert_eq!(dataset_hash(&a).len(), 64);
    }
}
