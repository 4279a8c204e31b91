//! Role and capability model for family membership.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Capability level of a member within one family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

/// Named permissions checked by the authorization gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Rename or delete the family itself.
    ManageFamily,
    /// Change roles, remove members, cancel invitations.
    ManageMembers,
    /// Create invitations.
    Invite,
    /// Create, edit, or delete shared lists and their items.
    ManageLists,
    /// Read shared lists.
    ViewLists,
}

/// Error type for parsing Role from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl std::fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    /// The permission predicate. Total over the finite role x capability
    /// domain; unknown role strings are rejected at parse time and never
    /// reach this function.
    pub fn can(&self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::Editor => matches!(
                capability,
                Capability::ManageLists | Capability::ViewLists
            ),
            Role::Viewer => matches!(capability, Capability::ViewLists),
        }
    }
}
