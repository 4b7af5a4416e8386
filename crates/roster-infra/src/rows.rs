//! Column decoding shared by the repositories
//!
//! Dates and timestamps are stored as text so both dialects read them back
//! through the same `Any` driver types.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use roster_core::DomainResult;
use sqlx::any::{Any, AnyRow};
use sqlx::{Decode, Row, Type, ValueRef};

use crate::{InfraError, Result};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn date_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn now_text() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn date(row: &AnyRow, column: &'static str) -> Result<NaiveDate> {
    let raw: String = row.try_get(column)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|_| InfraError::Corrupt { column, value: raw })
}

/// Nullable column. The `Any` driver will not decode NULL into `Option<T>`,
/// so the raw value is checked first.
pub(crate) fn optional<'r, T>(row: &'r AnyRow, column: &'static str) -> Result<Option<T>>
where
    T: Decode<'r, Any> + Type<Any>,
{
    if row.try_get_raw(column)?.is_null() {
        return Ok(None);
    }
    Ok(Some(row.try_get(column)?))
}

pub(crate) fn opt_text(row: &AnyRow, column: &'static str) -> Result<Option<String>> {
    optional(row, column)
}

pub(crate) fn opt_date(row: &AnyRow, column: &'static str) -> Result<Option<NaiveDate>> {
    let raw = opt_text(row, column)?;
    raw.map(|raw| {
        NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map_err(|_| InfraError::Corrupt { column, value: raw })
    })
    .transpose()
}

pub(crate) fn timestamp(row: &AnyRow, column: &'static str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| InfraError::Corrupt { column, value: raw })
}

/// Decode a text enum column with its `parse` function
pub(crate) fn enumerated<T>(
    row: &AnyRow,
    column: &'static str,
    parse: fn(&str) -> DomainResult<T>,
) -> Result<T> {
    let raw: String = row.try_get(column)?;
    parse(&raw).map_err(|_| InfraError::Corrupt { column, value: raw })
}
