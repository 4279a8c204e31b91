//! Notification records written by the fanout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{FamilyId, NotificationId, UserId};

/// What kind of family event a notification describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    MemberJoined,
    MemberLeft,
    MemberRemoved,
    RoleChanged,
    FamilyUpdated,
    FamilyDeleted,
    InvitationCreated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNotificationKindError(pub String);

impl std::fmt::Display for ParseNotificationKindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid notification kind: {}", self.0)
    }
}

impl std::error::Error for ParseNotificationKindError {}

impl FromStr for NotificationKind {
    type Err = ParseNotificationKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member_joined" => Ok(NotificationKind::MemberJoined),
            "member_left" => Ok(NotificationKind::MemberLeft),
            "member_removed" => Ok(NotificationKind::MemberRemoved),
            "role_changed" => Ok(NotificationKind::RoleChanged),
            "family_updated" => Ok(NotificationKind::FamilyUpdated),
            "family_deleted" => Ok(NotificationKind::FamilyDeleted),
            "invitation_created" => Ok(NotificationKind::InvitationCreated),
            _ => Err(ParseNotificationKindError(s.to_string())),
        }
    }
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::MemberJoined => "member_joined",
            NotificationKind::MemberLeft => "member_left",
            NotificationKind::MemberRemoved => "member_removed",
            NotificationKind::RoleChanged => "role_changed",
            NotificationKind::FamilyUpdated => "family_updated",
            NotificationKind::FamilyDeleted => "family_deleted",
            NotificationKind::InvitationCreated => "invitation_created",
        }
    }
}

/// Notification record. Created only as a side effect of a family event,
/// never directly by a client. `sender_id = None` means system-originated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub family_id: FamilyId,
    pub sender_id: Option<UserId>,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row to insert during fanout (one per recipient).
#[derive(Clone, Debug)]
pub struct NewNotification {
    pub user_id: UserId,
    pub family_id: FamilyId,
    pub sender_id: Option<UserId>,
    pub kind: NotificationKind,
    pub message: String,
}
