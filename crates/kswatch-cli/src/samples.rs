//! CSV sample loading
//!
//! Expected columns, with a header row: `metric,timestamp,value`.
//! Timestamps are unix seconds or RFC 3339.

use std::io::Read;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use kswatch_detector::{DataPoint, MemorySampleReader, MetricId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SampleRecord {
    metric: String,
    timestamp: String,
    value: f64,
}

/// Parse unix seconds or an RFC 3339 timestamp
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(secs) = raw.parse::<i64>() {
        return Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| anyhow!("timestamp out of range: {}", secs));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp '{}'", raw))
}

/// Load every row of `input` into `reader`; returns the row count
pub fn read_samples<R: Read>(input: R, reader: &MemorySampleReader) -> Result<usize> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut rows = 0;
    for (index, record) in csv.deserialize::<SampleRecord>().enumerate() {
        // header is line 1
        let line = index + 2;
        let record = record.with_context(|| format!("invalid sample on line {}", line))?;
        let timestamp = parse_timestamp(&record.timestamp)
            .with_context(|| format!("invalid sample on line {}", line))?;
        reader.push(
            MetricId::new(record.metric),
            DataPoint::new(timestamp, record.value),
        );
        rows += 1;
    }
    tracing::debug!(rows, "Read samples");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unix_seconds() {
        assert_eq!(parse_timestamp("60").unwrap().timestamp(), 60);
    }

    #[test]
    fn test_parse_rfc3339() {
        let ts = parse_timestamp("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_read_samples() {
        let input = "metric,timestamp,value\ncpu, 0, 1.5\nmem,1,2\ncpu,2,3\n";
        let reader = MemorySampleReader::new();

        assert_eq!(read_samples(input.as_bytes(), &reader).unwrap(), 3);
        assert_eq!(
            reader.metrics(),
            vec![MetricId::from("cpu"), MetricId::from("mem")]
        );
        let (first, last) = reader.time_span(&"cpu".into()).unwrap();
        assert_eq!((first.timestamp(), last.timestamp()), (0, 2));
    }

    #[test]
    fn test_bad_row_reports_line() {
        let input = "metric,timestamp,value\ncpu,0,1\ncpu,1,high\n";
        let err = read_samples(input.as_bytes(), &MemorySampleReader::new()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }
}
