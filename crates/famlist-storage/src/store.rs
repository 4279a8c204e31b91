//! The Store trait that backends implement.

use chrono::{DateTime, Utc};

use crate::types::*;
use crate::StoreError;

/// The storage trait the server depends on.
///
/// Every state-machine transition (invitation accept/reject, last-admin
/// guarded removal) must execute inside a single backend transaction with a
/// compare-and-swap guard on the mutable field, so exactly one of two
/// concurrent callers wins.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Families ───────────────────────────────────────

    /// Create a family and its creator's admin membership atomically.
    /// A failure on either insert rolls back both (no orphan families).
    async fn create_family(&self, params: &CreateFamilyParams) -> Result<Family, StoreError>;

    /// Get family by ID.
    async fn get_family(&self, family_id: &FamilyId) -> Result<Family, StoreError>;

    /// List all families where the user has a membership row.
    async fn list_families_for_user(&self, user_id: &UserId) -> Result<Vec<Family>, StoreError>;

    /// Rename a family.
    async fn update_family_name(&self, family_id: &FamilyId, name: &str)
        -> Result<(), StoreError>;

    /// Delete a family; cascades memberships and invitations. Notification
    /// rows survive as historical records.
    async fn delete_family(&self, family_id: &FamilyId) -> Result<(), StoreError>;

    // ───────────────────────────────────── Members ────────────────────────────────────────

    /// List all members of a family.
    async fn list_family_members(
        &self,
        family_id: &FamilyId,
    ) -> Result<Vec<FamilyMember>, StoreError>;

    /// Get a user's membership in a family.
    async fn get_family_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
    ) -> Result<FamilyMember, StoreError>;

    /// Get a membership by cached email (case-insensitive).
    async fn get_family_member_by_email(
        &self,
        family_id: &FamilyId,
        email: &str,
    ) -> Result<FamilyMember, StoreError>;

    /// Change a member's role. Fails with [`StoreError::LastAdmin`] when the
    /// target is the sole remaining admin and the new role is not admin.
    async fn update_member_role(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        role: Role,
    ) -> Result<(), StoreError>;

    /// Remove a member. Fails with [`StoreError::LastAdmin`] when the target
    /// is the sole remaining admin.
    async fn remove_family_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
    ) -> Result<(), StoreError>;

    /// Backfill a membership's denormalized email cache.
    async fn set_member_email(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        email: &str,
    ) -> Result<(), StoreError>;

    // ───────────────────────────────────── Invitations ────────────────────────────────────

    /// Create an invitation. Normalizes the email to lowercase, stamps
    /// `created_at = now` and `expires_at = now + 7 days`. Fails with
    /// [`StoreError::AlreadyMember`] when the email already belongs to a
    /// member, and [`StoreError::DuplicateInvitation`] when an open (pending,
    /// non-expired) invitation exists for the same `(family, email)`.
    async fn create_invitation(
        &self,
        params: &CreateInvitationParams,
        now: DateTime<Utc>,
    ) -> Result<FamilyInvitation, StoreError>;

    /// Get invitation by ID.
    async fn get_invitation(
        &self,
        invitation_id: &InvitationId,
    ) -> Result<FamilyInvitation, StoreError>;

    /// List invitations that are still open (pending and not expired at `now`).
    async fn list_pending_invitations(
        &self,
        family_id: &FamilyId,
        now: DateTime<Utc>,
    ) -> Result<Vec<FamilyInvitation>, StoreError>;

    /// Accept an invitation: compare-and-swap `status: pending → accepted`
    /// and insert the membership row at the invitation's role, both in one
    /// transaction. Returns the new membership. Fails with
    /// [`StoreError::Expired`] when past expiry, [`StoreError::AlreadyResponded`]
    /// when the status is no longer pending, and [`StoreError::AlreadyMember`]
    /// when the user gained membership between invite and accept.
    async fn accept_invitation(
        &self,
        invitation_id: &InvitationId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<FamilyMember, StoreError>;

    /// Reject an invitation: compare-and-swap `status: pending → rejected`.
    async fn reject_invitation(
        &self,
        invitation_id: &InvitationId,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Hard-delete a still-pending invitation (admin cancel). Fails with
    /// [`StoreError::AlreadyResponded`] when the invitation has terminated.
    async fn delete_invitation(&self, invitation_id: &InvitationId) -> Result<(), StoreError>;

    // ───────────────────────────────────── Notifications ──────────────────────────────────

    /// Insert one notification row per recipient in a single batch write.
    async fn insert_notifications(
        &self,
        rows: &[NewNotification],
    ) -> Result<Vec<Notification>, StoreError>;

    /// List a user's notifications, newest first.
    async fn list_notifications(&self, user_id: &UserId) -> Result<Vec<Notification>, StoreError>;

    /// Mark the given notifications read, scoped to `user_id`. Rows owned by
    /// other users simply don't match; returns the number of rows updated.
    async fn mark_notifications_read(
        &self,
        user_id: &UserId,
        ids: &[NotificationId],
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Delete a notification, scoped to `user_id`. Returns rows deleted;
    /// zero when the row belongs to someone else.
    async fn delete_notification(
        &self,
        user_id: &UserId,
        notification_id: &NotificationId,
    ) -> Result<u64, StoreError>;
}
