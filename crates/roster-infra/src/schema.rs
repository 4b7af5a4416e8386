//! Tenant database schema
//!
//! Every tenant database carries the same tables. The DDL is create-if-missing
//! so syncing an up-to-date database is a no-op.

use roster_tenant::{Dialect, SchemaSource};

/// Entity tables, in dependency order
pub const TABLES: [&str; 5] = [
    "members",
    "dues_payments",
    "attendance",
    "referrals",
    "admin_users",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct TenantSchema;

impl TenantSchema {
    fn id_column(dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::Sqlite => "INTEGER PRIMARY KEY",
            Dialect::Postgres => "BIGSERIAL PRIMARY KEY",
        }
    }
}

impl SchemaSource for TenantSchema {
    fn statements(&self, dialect: Dialect) -> Vec<String> {
        let id = Self::id_column(dialect);

        vec![
            format!(
                "CREATE TABLE IF NOT EXISTS members (
                    id {id},
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    phone TEXT,
                    status TEXT NOT NULL DEFAULT 'active',
                    joined_on TEXT,
                    notes TEXT,
                    created_at TEXT NOT NULL
                )"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS dues_payments (
                    id {id},
                    member_id BIGINT NOT NULL REFERENCES members (id) ON DELETE CASCADE,
                    period TEXT NOT NULL,
                    amount_cents BIGINT NOT NULL CHECK (amount_cents > 0),
                    paid_on TEXT NOT NULL,
                    method TEXT NOT NULL,
                    note TEXT
                )"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS attendance (
                    id {id},
                    member_id BIGINT NOT NULL REFERENCES members (id) ON DELETE CASCADE,
                    meeting_date TEXT NOT NULL,
                    status TEXT NOT NULL,
                    UNIQUE (member_id, meeting_date)
                )"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS referrals (
                    id {id},
                    referrer_id BIGINT REFERENCES members (id) ON DELETE SET NULL,
                    candidate_name TEXT NOT NULL,
                    candidate_email TEXT NOT NULL,
                    candidate_phone TEXT,
                    status TEXT NOT NULL DEFAULT 'pending',
                    note TEXT,
                    created_at TEXT NOT NULL
                )"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS admin_users (
                    id {id},
                    username TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    role TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )"
            ),
            "CREATE INDEX IF NOT EXISTS idx_dues_member_period ON dues_payments (member_id, period)"
                .to_string(),
            "CREATE INDEX IF NOT EXISTS idx_attendance_meeting_date ON attendance (meeting_date)"
                .to_string(),
            "CREATE INDEX IF NOT EXISTS idx_referrals_status ON referrals (status)".to_string(),
        ]
    }
}
