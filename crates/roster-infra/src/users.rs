//! Admin panel users

use chrono::{DateTime, Utc};
use roster_core::DomainError;
use roster_security::Role;
use serde::Serialize;
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Row};
use tracing::info;

use crate::rows;
use crate::{InfraError, Result};

const COLUMNS: &str = "id, username, password_hash, role, created_at";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

fn from_row(row: &AnyRow) -> Result<AdminUser> {
    let role: String = row.try_get("role")?;
    Ok(AdminUser {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: Role::parse(&role).map_err(|_| InfraError::Corrupt {
            column: "role",
            value: role.clone(),
        })?,
        created_at: rows::timestamp(row, "created_at")?,
    })
}

/// Lowercase and check a username: 3 to 64 of `a-z 0-9 . _ -`
pub fn normalize_username(username: &str) -> std::result::Result<String, DomainError> {
    let username = username.trim().to_lowercase();
    let valid = (3..=64).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(username)
    } else {
        Err(DomainError::invalid("username", username))
    }
}

/// Store a user; `password_hash` must already be an Argon2 PHC string
pub async fn create(
    conn: &mut AnyConnection,
    username: &str,
    password_hash: &str,
    role: Role,
) -> Result<AdminUser> {
    let username = normalize_username(username)?;

    let row = sqlx::query(&format!(
        "INSERT INTO admin_users (username, password_hash, role, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING {}",
        COLUMNS
    ))
    .bind(&username)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(rows::now_text())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| InfraError::on_unique(e, || format!("username {} is taken", username)))?;

    let user = from_row(&row)?;
    info!(user_id = user.id, username = %user.username, role = %user.role, "Admin user created");
    Ok(user)
}

pub async fn find_by_username(conn: &mut AnyConnection, username: &str) -> Result<Option<AdminUser>> {
    let row = sqlx::query(&format!("SELECT {} FROM admin_users WHERE username = $1", COLUMNS))
        .bind(username.trim().to_lowercase())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn list(conn: &mut AnyConnection) -> Result<Vec<AdminUser>> {
    sqlx::query(&format!("SELECT {} FROM admin_users ORDER BY username", COLUMNS))
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(from_row)
        .collect()
}

pub async fn count(conn: &mut AnyConnection) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM admin_users")
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.try_get("n")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  Treasurer ").unwrap(), "treasurer");
        assert_eq!(normalize_username("j.doe_2").unwrap(), "j.doe_2");
        assert!(normalize_username("ab").is_err());
        assert!(normalize_username("has space").is_err());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = AdminUser {
            id: 1,
            username: "admin".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"admin\""));
    }
}
