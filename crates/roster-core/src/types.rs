//! Domain entities and form inputs shared by the repositories and the HTTP layer

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{DomainError, DomainResult};

/// Membership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
    /// Referred or applied, not yet admitted
    Prospect,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Prospect => "prospect",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "prospect" => Ok(Self::Prospect),
            _ => Err(DomainError::invalid("member status", s)),
        }
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: MemberStatus,
    pub joined_on: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Member form used for both creation and full updates
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MemberForm {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: MemberStatus,
    pub joined_on: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl MemberForm {
    /// Validate and normalize (trimmed names, lowercased email)
    pub fn cleaned(mut self) -> DomainResult<Self> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self.validate()?;
        Ok(self)
    }
}

/// Filters for the member list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberFilter {
    pub status: Option<MemberStatus>,
    /// Case-insensitive match on name or email
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Check,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Check => "check",
            Self::Card => "card",
            Self::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "check" | "cheque" => Ok(Self::Check),
            "card" => Ok(Self::Card),
            "transfer" => Ok(Self::Transfer),
            _ => Err(DomainError::invalid("payment method", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuesPayment {
    pub id: i64,
    pub member_id: i64,
    pub period: String,
    pub amount_cents: i64,
    pub paid_on: NaiveDate,
    pub method: PaymentMethod,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DuesPaymentForm {
    #[validate(length(min = 1, max = 20))]
    pub period: String,
    #[validate(range(min = 1))]
    pub amount_cents: i64,
    pub paid_on: NaiveDate,
    pub method: PaymentMethod,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

impl DuesPaymentForm {
    pub fn cleaned(mut self) -> DomainResult<Self> {
        self.period = self.period.trim().to_string();
        self.validate()?;
        Ok(self)
    }
}

/// Dues standing of one member for one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuesStatus {
    pub member_id: i64,
    pub member_name: String,
    pub period: String,
    pub paid_cents: i64,
    pub expected_cents: i64,
    pub outstanding_cents: i64,
}

impl DuesStatus {
    pub fn new(member_id: i64, member_name: String, period: &str, paid: i64, expected: i64) -> Self {
        Self {
            member_id,
            member_name,
            period: period.to_string(),
            paid_cents: paid,
            expected_cents: expected,
            outstanding_cents: (expected - paid).max(0),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.outstanding_cents == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Excused => "excused",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "excused" => Ok(Self::Excused),
            _ => Err(DomainError::invalid("attendance status", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub member_id: i64,
    pub meeting_date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceForm {
    pub member_id: i64,
    pub meeting_date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub member_id: i64,
    pub present: i64,
    pub absent: i64,
    pub excused: i64,
}

impl AttendanceSummary {
    pub fn total(&self) -> i64 {
        self.present + self.absent + self.excused
    }

    /// Share of recorded meetings attended, 0.0 when nothing is recorded
    pub fn attendance_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.present as f64 / total as f64,
        }
    }
}

/// Member-facing check-in form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckInForm {
    #[validate(email)]
    pub email: String,
    pub meeting_date: NaiveDate,
}

impl CheckInForm {
    pub fn cleaned(mut self) -> DomainResult<Self> {
        self.email = self.email.trim().to_lowercase();
        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    #[default]
    Pending,
    Contacted,
    Joined,
    Declined,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Contacted => "contacted",
            Self::Joined => "joined",
            Self::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "contacted" => Ok(Self::Contacted),
            "joined" => Ok(Self::Joined),
            "declined" => Ok(Self::Declined),
            _ => Err(DomainError::invalid("referral status", s)),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Joined | Self::Declined)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Referral {
    pub id: i64,
    pub referrer_id: Option<i64>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_phone: Option<String>,
    pub status: ReferralStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Member-facing referral form; the referrer identifies themselves by email
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReferralForm {
    #[validate(email)]
    pub referrer_email: String,
    #[validate(length(min = 1, max = 200))]
    pub candidate_name: String,
    #[validate(email)]
    pub candidate_email: String,
    #[validate(length(max = 32))]
    pub candidate_phone: Option<String>,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

impl ReferralForm {
    pub fn cleaned(mut self) -> DomainResult<Self> {
        self.referrer_email = self.referrer_email.trim().to_lowercase();
        self.candidate_email = self.candidate_email.trim().to_lowercase();
        self.candidate_name = self.candidate_name.trim().to_string();
        self.validate()?;
        Ok(self)
    }
}

/// Splits a candidate's display name into first and last name
pub fn split_name(full: &str) -> (String, String) {
    let full = full.trim();
    match full.rsplit_once(' ') {
        Some((first, last)) => (first.trim().to_string(), last.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}
