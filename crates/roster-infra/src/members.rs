//! Member repository

use roster_core::{Member, MemberFilter, MemberForm, MemberStatus};
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Row};
use tracing::debug;

use crate::rows::{self, date_text};
use crate::{InfraError, Result};

const COLUMNS: &str =
    "id, first_name, last_name, email, phone, status, joined_on, notes, created_at";

fn from_row(row: &AnyRow) -> Result<Member> {
    Ok(Member {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: rows::opt_text(row, "phone")?,
        status: rows::enumerated(row, "status", MemberStatus::parse)?,
        joined_on: rows::opt_date(row, "joined_on")?,
        notes: rows::opt_text(row, "notes")?,
        created_at: rows::timestamp(row, "created_at")?,
    })
}

fn duplicate_email(email: &str) -> String {
    format!("a member with email {} already exists", email)
}

pub async fn list(conn: &mut AnyConnection, filter: &MemberFilter) -> Result<Vec<Member>> {
    let mut clauses = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        params.push(status.as_str().to_string());
        clauses.push(format!("status = ${}", params.len()));
    }

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        let mut alternatives = Vec::new();
        for column in ["first_name", "last_name", "email"] {
            params.push(pattern.clone());
            alternatives.push(format!("LOWER({}) LIKE ${}", column, params.len()));
        }
        clauses.push(format!("({})", alternatives.join(" OR ")));
    }

    let mut sql = format!("SELECT {} FROM members", COLUMNS);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY last_name, first_name, id");

    let mut query = sqlx::query(&sql);
    for param in params {
        query = query.bind(param);
    }

    query
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(from_row)
        .collect()
}

pub async fn get(conn: &mut AnyConnection, id: i64) -> Result<Member> {
    let row = sqlx::query(&format!("SELECT {} FROM members WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| InfraError::not_found("member", id))?;

    from_row(&row)
}

pub async fn find_by_email(conn: &mut AnyConnection, email: &str) -> Result<Option<Member>> {
    let row = sqlx::query(&format!("SELECT {} FROM members WHERE email = $1", COLUMNS))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn exists(conn: &mut AnyConnection, id: i64) -> Result<bool> {
    let row = sqlx::query("SELECT id FROM members WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

pub async fn create(conn: &mut AnyConnection, form: MemberForm) -> Result<Member> {
    let form = form.cleaned()?;

    let row = sqlx::query(&format!(
        "INSERT INTO members (first_name, last_name, email, phone, status, joined_on, notes, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {}",
        COLUMNS
    ))
    .bind(&form.first_name)
    .bind(&form.last_name)
    .bind(&form.email)
    .bind(form.phone.clone())
    .bind(form.status.as_str())
    .bind(form.joined_on.map(date_text))
    .bind(form.notes.clone())
    .bind(rows::now_text())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| InfraError::on_unique(e, || duplicate_email(&form.email)))?;

    let member = from_row(&row)?;
    debug!(member_id = member.id, "Member created");
    Ok(member)
}

pub async fn update(conn: &mut AnyConnection, id: i64, form: MemberForm) -> Result<Member> {
    let form = form.cleaned()?;

    let row = sqlx::query(&format!(
        "UPDATE members
         SET first_name = $1, last_name = $2, email = $3, phone = $4, status = $5,
             joined_on = $6, notes = $7
         WHERE id = $8
         RETURNING {}",
        COLUMNS
    ))
    .bind(&form.first_name)
    .bind(&form.last_name)
    .bind(&form.email)
    .bind(form.phone.clone())
    .bind(form.status.as_str())
    .bind(form.joined_on.map(date_text))
    .bind(form.notes.clone())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| InfraError::on_unique(e, || duplicate_email(&form.email)))?
    .ok_or_else(|| InfraError::not_found("member", id))?;

    from_row(&row)
}

/// Delete a member together with their dues and attendance
pub async fn delete(conn: &mut AnyConnection, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM members WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(InfraError::not_found("member", id));
    }
    debug!(member_id = id, "Member deleted");
    Ok(())
}
