//! Dues payments and per-period standing

use roster_core::{DuesPayment, DuesPaymentForm, DuesStatus, PaymentMethod};
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Row};
use tracing::debug;

use crate::rows::{self, date_text};
use crate::{members, InfraError, Result};

const COLUMNS: &str = "id, member_id, period, amount_cents, paid_on, method, note";

fn from_row(row: &AnyRow) -> Result<DuesPayment> {
    Ok(DuesPayment {
        id: row.try_get("id")?,
        member_id: row.try_get("member_id")?,
        period: row.try_get("period")?,
        amount_cents: row.try_get("amount_cents")?,
        paid_on: rows::date(row, "paid_on")?,
        method: rows::enumerated(row, "method", PaymentMethod::parse)?,
        note: rows::opt_text(row, "note")?,
    })
}

pub async fn record(
    conn: &mut AnyConnection,
    member_id: i64,
    form: DuesPaymentForm,
) -> Result<DuesPayment> {
    let form = form.cleaned()?;

    if !members::exists(conn, member_id).await? {
        return Err(InfraError::not_found("member", member_id));
    }

    let row = sqlx::query(&format!(
        "INSERT INTO dues_payments (member_id, period, amount_cents, paid_on, method, note)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {}",
        COLUMNS
    ))
    .bind(member_id)
    .bind(&form.period)
    .bind(form.amount_cents)
    .bind(date_text(form.paid_on))
    .bind(form.method.as_str())
    .bind(form.note.clone())
    .fetch_one(&mut *conn)
    .await?;

    let payment = from_row(&row)?;
    debug!(
        member_id,
        payment_id = payment.id,
        amount_cents = payment.amount_cents,
        "Dues payment recorded"
    );
    Ok(payment)
}

/// Payments of one member, newest first
pub async fn list_for_member(conn: &mut AnyConnection, member_id: i64) -> Result<Vec<DuesPayment>> {
    if !members::exists(conn, member_id).await? {
        return Err(InfraError::not_found("member", member_id));
    }

    sqlx::query(&format!(
        "SELECT {} FROM dues_payments WHERE member_id = $1 ORDER BY paid_on DESC, id DESC",
        COLUMNS
    ))
    .bind(member_id)
    .fetch_all(&mut *conn)
    .await?
    .iter()
    .map(from_row)
    .collect()
}

pub async fn delete(conn: &mut AnyConnection, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM dues_payments WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(InfraError::not_found("dues payment", id));
    }
    Ok(())
}

/// Standing of every active member for `period` against `expected_cents`
pub async fn status(
    conn: &mut AnyConnection,
    period: &str,
    expected_cents: i64,
) -> Result<Vec<DuesStatus>> {
    let period = period.trim();

    let rows = sqlx::query(
        "SELECT m.id, m.first_name, m.last_name,
                CAST(COALESCE(SUM(d.amount_cents), 0) AS BIGINT) AS paid_cents
         FROM members m
         LEFT JOIN dues_payments d ON d.member_id = m.id AND d.period = $1
         WHERE m.status = 'active'
         GROUP BY m.id, m.first_name, m.last_name
         ORDER BY m.last_name, m.first_name, m.id",
    )
    .bind(period)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| -> Result<DuesStatus> {
            let first: String = row.try_get("first_name")?;
            let last: String = row.try_get("last_name")?;
            Ok(DuesStatus::new(
                row.try_get("id")?,
                format!("{} {}", first, last).trim().to_string(),
                period,
                row.try_get("paid_cents")?,
                expected_cents,
            ))
        })
        .collect()
}
