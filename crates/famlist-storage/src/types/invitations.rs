//! Invitation records and the expiry predicate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{FamilyId, InvitationId, Role, UserId};

/// How long an invitation stays acceptable after creation.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Stored invitation state. Expiry is NOT a stored state: it is derived from
/// `expires_at` at read/response time so no background sweeper is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseInvitationStatusError(pub String);

impl std::fmt::Display for ParseInvitationStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid invitation status: {}", self.0)
    }
}

impl std::error::Error for ParseInvitationStatusError {}

impl FromStr for InvitationStatus {
    type Err = ParseInvitationStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "rejected" => Ok(InvitationStatus::Rejected),
            _ => Err(ParseInvitationStatusError(s.to_string())),
        }
    }
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Rejected => "rejected",
        }
    }
}

/// Pending offer of membership at a given role, bound to an email and an
/// expiry. Email is stored case-normalized (lowercase).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FamilyInvitation {
    pub id: InvitationId,
    pub family_id: FamilyId,
    pub email: String,
    pub role: Role,
    pub status: InvitationStatus,
    pub invited_by: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl FamilyInvitation {
    /// The single expiry predicate. Takes the instant explicitly so tests can
    /// simulate expiry deterministically without sleeping.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Still acceptable: pending and not past its expiry.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired_at(now)
    }
}

/// Compute the expiry instant for an invitation created at `created_at`.
pub fn invitation_expiry(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::days(INVITATION_TTL_DAYS)
}

/// Parameters for creating an invitation. The backend normalizes the email,
/// stamps `created_at`, and derives `expires_at`.
#[derive(Clone, Debug)]
pub struct CreateInvitationParams {
    pub family_id: FamilyId,
    pub email: String,
    pub role: Role,
    pub invited_by: UserId,
}
