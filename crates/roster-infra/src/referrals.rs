//! Referrals of prospective members

use roster_core::{
    split_name, DomainError, Member, MemberForm, MemberStatus, Referral, ReferralForm,
    ReferralStatus,
};
use serde::Serialize;
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Connection, Row};
use tracing::{debug, info};

use crate::rows;
use crate::{members, InfraError, Result};

const COLUMNS: &str =
    "id, referrer_id, candidate_name, candidate_email, candidate_phone, status, note, created_at";

fn from_row(row: &AnyRow) -> Result<Referral> {
    Ok(Referral {
        id: row.try_get("id")?,
        referrer_id: rows::optional(row, "referrer_id")?,
        candidate_name: row.try_get("candidate_name")?,
        candidate_email: row.try_get("candidate_email")?,
        candidate_phone: rows::opt_text(row, "candidate_phone")?,
        status: rows::enumerated(row, "status", ReferralStatus::parse)?,
        note: rows::opt_text(row, "note")?,
        created_at: rows::timestamp(row, "created_at")?,
    })
}

/// Outcome of a status change
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub referral: Referral,
    /// Prospect member created when the referral joined
    pub prospect: Option<Member>,
}

/// Member-facing submission; the referrer must be a known member
pub async fn submit(conn: &mut AnyConnection, form: ReferralForm) -> Result<Referral> {
    let form = form.cleaned()?;

    let referrer = members::find_by_email(conn, &form.referrer_email)
        .await?
        .ok_or_else(|| {
            DomainError::Validation(format!("no member with email {}", form.referrer_email))
        })?;

    let row = sqlx::query(&format!(
        "INSERT INTO referrals
            (referrer_id, candidate_name, candidate_email, candidate_phone, status, note, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {}",
        COLUMNS
    ))
    .bind(referrer.id)
    .bind(&form.candidate_name)
    .bind(&form.candidate_email)
    .bind(form.candidate_phone.clone())
    .bind(ReferralStatus::Pending.as_str())
    .bind(form.note.clone())
    .bind(rows::now_text())
    .fetch_one(&mut *conn)
    .await?;

    let referral = from_row(&row)?;
    debug!(referral_id = referral.id, referrer_id = referrer.id, "Referral submitted");
    Ok(referral)
}

pub async fn list(conn: &mut AnyConnection, status: Option<ReferralStatus>) -> Result<Vec<Referral>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(&format!(
                "SELECT {} FROM referrals WHERE status = $1 ORDER BY created_at DESC, id DESC",
                COLUMNS
            ))
            .bind(status.as_str())
            .fetch_all(&mut *conn)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM referrals ORDER BY created_at DESC, id DESC",
                COLUMNS
            ))
            .fetch_all(&mut *conn)
            .await?
        }
    };

    rows.iter().map(from_row).collect()
}

pub async fn get(conn: &mut AnyConnection, id: i64) -> Result<Referral> {
    let row = sqlx::query(&format!("SELECT {} FROM referrals WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| InfraError::not_found("referral", id))?;

    from_row(&row)
}

/// Move a referral to `status`.
///
/// Joined or declined referrals are final. Joining creates a prospect member
/// for the candidate unless one with that email already exists; the status
/// change and the new member commit together.
pub async fn update_status(
    conn: &mut AnyConnection,
    id: i64,
    status: ReferralStatus,
) -> Result<StatusChange> {
    let mut tx = conn.begin().await?;

    let current = get(&mut *tx, id).await?;
    if current.status == status {
        return Ok(StatusChange {
            referral: current,
            prospect: None,
        });
    }
    if current.status.is_closed() {
        return Err(DomainError::Validation(format!(
            "referral {} is already {}",
            id,
            current.status.as_str()
        ))
        .into());
    }

    let row = sqlx::query(&format!(
        "UPDATE referrals SET status = $1 WHERE id = $2 RETURNING {}",
        COLUMNS
    ))
    .bind(status.as_str())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    let referral = from_row(&row)?;

    let prospect = if status == ReferralStatus::Joined
        && members::find_by_email(&mut *tx, &referral.candidate_email)
            .await?
            .is_none()
    {
        let (first_name, last_name) = split_name(&referral.candidate_name);
        let form = MemberForm {
            first_name,
            last_name: if last_name.is_empty() { "-".to_string() } else { last_name },
            email: referral.candidate_email.clone(),
            phone: referral.candidate_phone.clone(),
            status: MemberStatus::Prospect,
            joined_on: None,
            notes: Some(format!("Joined through referral {}", referral.id)),
        };
        Some(members::create(&mut *tx, form).await?)
    } else {
        None
    };

    tx.commit().await?;

    info!(
        referral_id = id,
        status = status.as_str(),
        prospect_id = prospect.as_ref().map(|m| m.id),
        "Referral status changed"
    );

    Ok(StatusChange { referral, prospect })
}
