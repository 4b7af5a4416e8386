//! CSV exports for the admin panel

use chrono::NaiveDate;
use roster_core::{AttendanceStatus, DomainError, MemberFilter};
use serde::Serialize;
use sqlx::{AnyConnection, Row};

use crate::rows::{self, date_text};
use crate::{dues, members, Result};

#[derive(Debug, Serialize)]
struct MemberLine<'a> {
    id: i64,
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    phone: &'a str,
    status: &'static str,
    joined_on: String,
}

#[derive(Debug, Serialize)]
struct DuesLine<'a> {
    member_id: i64,
    member_name: &'a str,
    period: &'a str,
    paid: String,
    expected: String,
    outstanding: String,
}

#[derive(Debug, Serialize)]
struct AttendanceLine {
    meeting_date: String,
    member_id: i64,
    member_name: String,
    status: &'static str,
}

/// Render integer cents as a decimal amount, e.g. `12050` as `120.50`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

/// Writer with the header row already written, so empty reports still carry it
fn writer(headers: &[&str]) -> Result<csv::Writer<Vec<u8>>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    Ok(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()).into())
}

/// Full member roster ordered by name
pub async fn members_csv(conn: &mut AnyConnection) -> Result<Vec<u8>> {
    let roster = members::list(conn, &MemberFilter::default()).await?;

    let mut writer = writer(&[
        "id",
        "first_name",
        "last_name",
        "email",
        "phone",
        "status",
        "joined_on",
    ])?;
    for member in &roster {
        writer.serialize(MemberLine {
            id: member.id,
            first_name: &member.first_name,
            last_name: &member.last_name,
            email: &member.email,
            phone: member.phone.as_deref().unwrap_or_default(),
            status: member.status.as_str(),
            joined_on: member.joined_on.map(date_text).unwrap_or_default(),
        })?;
    }
    finish(writer)
}

pub async fn dues_csv(conn: &mut AnyConnection, period: &str, expected_cents: i64) -> Result<Vec<u8>> {
    let standing = dues::status(conn, period, expected_cents).await?;

    let mut writer = writer(&[
        "member_id",
        "member_name",
        "period",
        "paid",
        "expected",
        "outstanding",
    ])?;
    for status in &standing {
        writer.serialize(DuesLine {
            member_id: status.member_id,
            member_name: &status.member_name,
            period: &status.period,
            paid: format_cents(status.paid_cents),
            expected: format_cents(status.expected_cents),
            outstanding: format_cents(status.outstanding_cents),
        })?;
    }
    finish(writer)
}

/// Attendance between `from` and `to`, both inclusive
pub async fn attendance_csv(
    conn: &mut AnyConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<u8>> {
    if from > to {
        return Err(DomainError::Validation(format!(
            "range starts after it ends: {} > {}",
            from, to
        ))
        .into());
    }

    let records = sqlx::query(
        "SELECT a.meeting_date, a.member_id, a.status, m.first_name, m.last_name
         FROM attendance a
         JOIN members m ON m.id = a.member_id
         WHERE a.meeting_date >= $1 AND a.meeting_date <= $2
         ORDER BY a.meeting_date, m.last_name, m.first_name",
    )
    .bind(date_text(from))
    .bind(date_text(to))
    .fetch_all(&mut *conn)
    .await?;

    let mut writer = writer(&["meeting_date", "member_id", "member_name", "status"])?;
    for row in &records {
        let first: String = row.try_get("first_name")?;
        let last: String = row.try_get("last_name")?;
        writer.serialize(AttendanceLine {
            meeting_date: date_text(rows::date(row, "meeting_date")?),
            member_id: row.try_get("member_id")?,
            member_name: format!("{} {}", first, last).trim().to_string(),
            status: rows::enumerated(row, "status", AttendanceStatus::parse)?.as_str(),
        })?;
    }
    finish(writer)
}
