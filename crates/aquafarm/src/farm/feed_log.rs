//! CSV exchange of daily feeding logs.
//!
//! Exports use a fixed header; imports accept the same columns in any order
//! and only require `date` and `feed_kg`.

use std::io::Read;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{CageId, DailyRecord};
use super::requests::DailyRecordInput;

pub const FEED_LOG_HEADERS: [&str; 7] = [
    "date",
    "feed_kg",
    "feed_type",
    "mortality",
    "water_temp_c",
    "dissolved_oxygen_mg_l",
    "notes",
];

const REQUIRED_HEADERS: [&str; 2] = ["date", "feed_kg"];

#[derive(Debug, thiserror::Error)]
pub enum FeedLogError {
    #[error("failed to read feed log: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid feed log CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("feed log is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
    #[error("feed log output was not valid UTF-8")]
    Encoding,
}

#[derive(Debug, Serialize)]
struct FeedLogRow<'a> {
    date: NaiveDate,
    feed_kg: f64,
    feed_type: Option<&'a str>,
    mortality: u32,
    water_temp_c: Option<f64>,
    dissolved_oxygen_mg_l: Option<f64>,
    notes: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct FeedLogEntry {
    date: String,
    feed_kg: f64,
    #[serde(default)]
    feed_type: Option<String>,
    #[serde(default)]
    mortality: Option<u32>,
    #[serde(default)]
    water_temp_c: Option<f64>,
    #[serde(default)]
    dissolved_oxygen_mg_l: Option<f64>,
    #[serde(default)]
    notes: Option<String>,
}

/// Row parsed from an uploaded feed log, or the reason it was unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeedLogRow {
    pub line: u64,
    pub entry: Result<DailyRecordInput, String>,
}

/// Outcome of a feed log import.
#[derive(Debug, Clone, Serialize)]
pub struct FeedLogImport {
    pub cage_id: CageId,
    pub imported: Vec<DailyRecord>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub line: u64,
    pub reason: String,
}

/// Render daily records, oldest first, as CSV.
pub fn export_feed_log(records: &[DailyRecord]) -> Result<String, FeedLogError> {
    let mut ordered: Vec<&DailyRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.date);

    let mut writer = csv::Writer::from_writer(Vec::new());
    if ordered.is_empty() {
        writer.write_record(FEED_LOG_HEADERS)?;
    }
    for record in ordered {
        writer.serialize(FeedLogRow {
            date: record.date,
            feed_kg: record.feed_kg,
            feed_type: record.feed_type.as_deref(),
            mortality: record.mortality,
            water_temp_c: record.water_temp_c,
            dissolved_oxygen_mg_l: record.dissolved_oxygen_mg_l,
            notes: record.notes.as_deref(),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| FeedLogError::Io(err.into_error()))?;
    String::from_utf8(bytes).map_err(|_| FeedLogError::Encoding)
}

/// Parse an uploaded feed log. Structural problems fail the whole file;
/// bad values only fail their row.
pub fn parse_feed_log<R: Read>(reader: R) -> Result<Vec<ParsedFeedLogRow>, FeedLogError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let missing: Vec<&'static str> = REQUIRED_HEADERS
        .into_iter()
        .filter(|required| !headers.iter().any(|header| header.eq_ignore_ascii_case(required)))
        .collect();
    if !missing.is_empty() {
        return Err(FeedLogError::MissingColumns(missing));
    }
    let headers = csv::StringRecord::from(
        headers
            .iter()
            .map(|header| header.to_ascii_lowercase())
            .collect::<Vec<_>>(),
    );

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let line = record.position().map_or(0, |position| position.line());
        let entry = record
            .deserialize::<FeedLogEntry>(Some(&headers))
            .map_err(|err| describe_csv_error(&err))
            .and_then(FeedLogEntry::into_input);
        rows.push(ParsedFeedLogRow { line, entry });
    }
    Ok(rows)
}

impl FeedLogEntry {
    fn into_input(self) -> Result<DailyRecordInput, String> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|err| format!("failed to parse '{}' as YYYY-MM-DD ({err})", self.date))?;
        Ok(DailyRecordInput {
            date,
            feed_kg: self.feed_kg,
            feed_type: self.feed_type,
            mortality: self.mortality.unwrap_or(0),
            water_temp_c: self.water_temp_c,
            dissolved_oxygen_mg_l: self.dissolved_oxygen_mg_l,
            notes: self.notes,
        })
    }
}

fn describe_csv_error(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => match err.field() {
            Some(index) => format!(
                "column {} could not be read: {}",
                index + 1,
                err.kind()
            ),
            None => err.kind().to_string(),
        },
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farm::domain::{RecordId, StockingId, UserId};

    fn record(day: u32, feed: f64) -> DailyRecord {
        DailyRecord {
            id: RecordId(format!("rec-{day}")),
            cage_id: CageId::from("cage-1"),
            cycle: StockingId::from("stk-1"),
            date: NaiveDate::from_ymd_opt(2025, 4, day).expect("valid"),
            feed_kg: feed,
            feed_type: Some("Grower 3mm".to_string()),
            mortality: 2,
            water_temp_c: Some(27.5),
            dissolved_oxygen_mg_l: None,
            notes: None,
            recorded_by: UserId::from("usr-1"),
        }
    }

    #[test]
    fn export_writes_header_and_sorted_rows() {
        let csv = export_feed_log(&[record(3, 12.5), record(1, 10.0)]).expect("export");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(FEED_LOG_HEADERS.join(",").as_str()));
        assert_eq!(lines.next(), Some("2025-04-01,10.0,Grower 3mm,2,27.5,,"));
        assert_eq!(lines.next(), Some("2025-04-03,12.5,Grower 3mm,2,27.5,,"));
    }

    #[test]
    fn export_of_empty_log_is_header_only() {
        let csv = export_feed_log(&[]).expect("export");
        assert_eq!(csv.trim_end(), FEED_LOG_HEADERS.join(","));
    }

    #[test]
    fn parse_reports_bad_rows_without_failing_file() {
        let input = "Date,Feed_kg,mortality\n2025-04-01,10.5,3\nyesterday,4,0\n2025-04-03,lots,\n";
        let rows = parse_feed_log(input.as_bytes()).expect("file parses");
        assert_eq!(rows.len(), 3);

        let first = rows[0].entry.as_ref().expect("first row valid");
        assert_eq!(first.mortality, 3);
        assert!((first.feed_kg - 10.5).abs() < f64::EPSILON);

        assert_eq!(rows[1].line, 3);
        assert!(rows[1].entry.as_ref().unwrap_err().contains("yesterday"));
        assert!(rows[2].entry.is_err());
    }

    #[test]
    fn parse_requires_date_and_feed_columns() {
        let err = parse_feed_log("date,mortality\n2025-04-01,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FeedLogError::MissingColumns(ref cols) if cols == &vec!["feed_kg"]));
    }
}
