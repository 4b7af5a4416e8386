//! Role-Based Access Control (RBAC)
//!
//! Admin panel roles and the permissions route handlers check inline.

use crate::error::{Result, SecurityError};
use serde::{Deserialize, Serialize};

/// Admin panel roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including admin users and reports
    Admin,
    /// Day-to-day record keeping
    Officer,
    /// Read-only access
    Viewer,
}

impl Role {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrator" => Ok(Role::Admin),
            "officer" => Ok(Role::Officer),
            "viewer" | "readonly" => Ok(Role::Viewer),
            _ => Err(SecurityError::InvalidRole(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Officer => "officer",
            Role::Viewer => "viewer",
        }
    }

    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Admin => &[
                MembersRead,
                MembersWrite,
                DuesRead,
                DuesWrite,
                AttendanceRead,
                AttendanceWrite,
                ReferralsRead,
                ReferralsWrite,
                ReportsExport,
                UsersManage,
            ],
            Role::Officer => &[
                MembersRead,
                MembersWrite,
                DuesRead,
                DuesWrite,
                AttendanceRead,
                AttendanceWrite,
                ReferralsRead,
                ReferralsWrite,
            ],
            Role::Viewer => &[MembersRead, DuesRead, AttendanceRead, ReferralsRead],
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Fail with `AuthorizationFailed` unless the role grants `permission`
    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(SecurityError::AuthorizationFailed(format!(
                "role {} lacks {}",
                self.as_str(),
                permission.as_str()
            )))
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Permissions checked by route handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    MembersRead,
    MembersWrite,
    DuesRead,
    DuesWrite,
    AttendanceRead,
    AttendanceWrite,
    ReferralsRead,
    ReferralsWrite,
    ReportsExport,
    UsersManage,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::MembersRead => "members:read",
            Permission::MembersWrite => "members:write",
            Permission::DuesRead => "dues:read",
            Permission::DuesWrite => "dues:write",
            Permission::AttendanceRead => "attendance:read",
            Permission::AttendanceWrite => "attendance:write",
            Permission::ReferralsRead => "referrals:read",
            Permission::ReferralsWrite => "referrals:write",
            Permission::ReportsExport => "reports:export",
            Permission::UsersManage => "users:manage",
        }
    }
}
