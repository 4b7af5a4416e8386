//! Meeting attendance

use chrono::NaiveDate;
use roster_core::{
    AttendanceForm, AttendanceRecord, AttendanceStatus, AttendanceSummary, CheckInForm, DomainError,
};
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Row};
use tracing::debug;

use crate::rows::{self, date_text};
use crate::{members, InfraError, Result};

const COLUMNS: &str = "id, member_id, meeting_date, status";

fn from_row(row: &AnyRow) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
        id: row.try_get("id")?,
        member_id: row.try_get("member_id")?,
        meeting_date: rows::date(row, "meeting_date")?,
        status: rows::enumerated(row, "status", AttendanceStatus::parse)?,
    })
}

/// Record attendance; recording the same member and date again replaces the status
pub async fn record(conn: &mut AnyConnection, form: &AttendanceForm) -> Result<AttendanceRecord> {
    if !members::exists(conn, form.member_id).await? {
        return Err(InfraError::not_found("member", form.member_id));
    }

    let row = sqlx::query(&format!(
        "INSERT INTO attendance (member_id, meeting_date, status)
         VALUES ($1, $2, $3)
         ON CONFLICT (member_id, meeting_date) DO UPDATE SET status = excluded.status
         RETURNING {}",
        COLUMNS
    ))
    .bind(form.member_id)
    .bind(date_text(form.meeting_date))
    .bind(form.status.as_str())
    .fetch_one(&mut *conn)
    .await?;

    let record = from_row(&row)?;
    debug!(
        member_id = record.member_id,
        meeting_date = %record.meeting_date,
        status = record.status.as_str(),
        "Attendance recorded"
    );
    Ok(record)
}

/// Member-facing check-in: marks the member with this email present
pub async fn check_in(conn: &mut AnyConnection, form: CheckInForm) -> Result<AttendanceRecord> {
    let form = form.cleaned()?;

    let member = members::find_by_email(conn, &form.email)
        .await?
        .ok_or_else(|| DomainError::Validation(format!("no member with email {}", form.email)))?;

    record(
        conn,
        &AttendanceForm {
            member_id: member.id,
            meeting_date: form.meeting_date,
            status: AttendanceStatus::Present,
        },
    )
    .await
}

pub async fn list_by_date(conn: &mut AnyConnection, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
    sqlx::query(&format!(
        "SELECT {} FROM attendance WHERE meeting_date = $1 ORDER BY member_id",
        COLUMNS
    ))
    .bind(date_text(date))
    .fetch_all(&mut *conn)
    .await?
    .iter()
    .map(from_row)
    .collect()
}

/// Counts by status across every recorded meeting of one member
pub async fn summary_for_member(conn: &mut AnyConnection, member_id: i64) -> Result<AttendanceSummary> {
    if !members::exists(conn, member_id).await? {
        return Err(InfraError::not_found("member", member_id));
    }

    let counts = sqlx::query(
        "SELECT status, COUNT(*) AS n FROM attendance WHERE member_id = $1 GROUP BY status",
    )
    .bind(member_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut summary = AttendanceSummary {
        member_id,
        ..Default::default()
    };
    for row in &counts {
        let count: i64 = row.try_get("n")?;
        match rows::enumerated(row, "status", AttendanceStatus::parse)? {
            AttendanceStatus::Present => summary.present = count,
            AttendanceStatus::Absent => summary.absent = count,
            AttendanceStatus::Excused => summary.excused = count,
        }
    }
    Ok(summary)
}
