//! Column conversions shared by the repositories.
//!
//! Ids and timestamps are stored as TEXT. A malformed value surfaces as a
//! conversion error on the row instead of a panic.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use daybook_types::FollowStatus;
use rusqlite::types::Type;
use uuid::Uuid;

#[derive(Debug)]
struct UnknownStatus(String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown follow status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn uuid_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub fn datetime_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| conversion_error(idx, e))
}

pub fn date_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    raw.parse::<NaiveDate>().map_err(|e| conversion_error(idx, e))
}

pub fn time_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    raw.parse::<NaiveTime>().map_err(|e| conversion_error(idx, e))
}

pub fn optional_time_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| s.parse::<NaiveTime>().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub fn status_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<FollowStatus> {
    let raw: String = row.get(idx)?;
    FollowStatus::parse(&raw).ok_or_else(|| conversion_error(idx, UnknownStatus(raw)))
}

/// Stored form of a time of day (`HH:MM:SS`)
pub fn time_to_sql(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}
