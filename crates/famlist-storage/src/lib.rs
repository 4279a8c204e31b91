//! Storage abstraction for famlist.
//!
//! Backend crates (e.g., famlist-store-sqlite) implement the [`Store`] trait so
//! the server doesn't depend on any specific database engine or schema details.

mod store;
pub mod types;

pub use store::Store;
#[cfg(feature = "test-support")]
pub use store::MockStore;
pub use types::*;

use thiserror::Error;

/// Uniform error type for all storage backends.
///
/// Besides the generic variants, this carries the domain conflicts that
/// compare-and-swap transitions report, so callers never have to infer a
/// race outcome from row counts or error strings.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("the last admin of a family cannot be removed or demoted")]
    LastAdmin,
    #[error("email already belongs to a member of this family")]
    AlreadyMember,
    #[error("a pending invitation for this email already exists")]
    DuplicateInvitation,
    #[error("invitation has already been responded to")]
    AlreadyResponded,
    #[error("invitation has expired")]
    Expired,
    #[error("backend error: {0}")]
    Backend(String),
}
