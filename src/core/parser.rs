use crate::core::presentation;
use crate::domain::model::{columns, ActivityRecord, RawRow};
use crate::utils::error::Result;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("float prefix pattern")
});

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%B %d %Y"];

/// Splits sheet text into header-keyed rows. Blank lines are skipped and
/// short rows simply lack the trailing keys.
pub fn parse_rows(text: &str) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                // 壞掉的列直接略過
                tracing::debug!("Skipping unreadable CSV row {}: {}", index + 1, e);
                continue;
            }
        };

        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Reads a coordinate the way a free-text float parse does: leading
/// whitespace is ignored and the longest numeric prefix wins. Returns `None`
/// for missing, non-numeric or non-finite values.
pub fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim_start();
    let matched = FLOAT_PREFIX.find(text)?;
    matched
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parses the sheet's free-text date column, reading naive values in the
/// local time zone.
pub fn parse_activity_date(text: &str) -> Option<DateTime<Utc>> {
    parse_activity_date_in(text, &Local)
}

/// Like [`parse_activity_date`], with an explicit zone for naive values.
/// Date-only ISO text (`2024-01-01`) is always UTC midnight.
pub fn parse_activity_date_in<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    // 夏令時間缺口內的時間視為無效
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

fn field(row: &RawRow, key: &str) -> String {
    row.get(key).cloned().unwrap_or_default()
}

/// Builds one record, or `None` when either coordinate is unusable.
pub fn normalize_row(row: &RawRow) -> Option<ActivityRecord> {
    let latitude = parse_coordinate(row.get(columns::LATITUDE).map(String::as_str))?;
    let longitude = parse_coordinate(row.get(columns::LONGITUDE).map(String::as_str))?;

    let date_text = field(row, columns::DATE);
    let occurred_at = parse_activity_date(&date_text);

    let agent_count_text = field(row, columns::AGENT_COUNT);
    let style = presentation::marker_style(Some(agent_count_text.as_str()));

    Some(ActivityRecord {
        latitude,
        longitude,
        occurred_at,
        date_text,
        time_of_day: field(row, columns::TIME),
        agent_count: style.agent_count,
        agent_count_text,
        location: field(row, columns::LOCATION),
        borough: field(row, columns::BOROUGH),
        description: field(row, columns::DESCRIPTION),
        marker_radius: style.radius,
        cluster_weight: style.weight,
    })
}

/// Normalizes rows in order, dropping the ones without coordinates.
pub fn normalize_rows(rows: &[RawRow]) -> Vec<ActivityRecord> {
    let records: Vec<ActivityRecord> = rows.iter().filter_map(normalize_row).collect();

    let dropped = rows.len() - records.len();
    if dropped > 0 {
        tracing::debug!("Dropped {} rows without usable coordinates", dropped);
    }

    records
}
