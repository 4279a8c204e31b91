//! Family group and membership records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FamilyId, Role, UserId};

/// Family group record. Owned collectively by its members; deletion cascades
/// to memberships and invitations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Family {
    pub id: FamilyId,
    pub name: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership row. `(family_id, user_id)` is unique.
///
/// `email` is a denormalized cache of the identity provider's email,
/// backfilled lazily; treat it as advisory, not authoritative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FamilyMember {
    pub family_id: FamilyId,
    pub user_id: UserId,
    pub role: Role,
    pub email: Option<String>,
    pub invited_by: Option<UserId>,
    pub joined_at: DateTime<Utc>,
}

/// Parameters for creating a family group.
///
/// The creator becomes the first admin member in the same transaction.
#[derive(Clone, Debug)]
pub struct CreateFamilyParams {
    pub name: String,
    pub created_by: UserId,
    pub creator_email: String,
}
