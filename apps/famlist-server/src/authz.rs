//! Authorization gate: membership and capability checks ahead of handlers.

use famlist_storage::{Capability, FamilyId, FamilyMember, Store, StoreError, UserId};

use crate::error::AppError;

/// Require that `user_id` is a member of `family_id`.
///
/// A missing family is 404; an existing family the caller is not a member of
/// is 403.
pub async fn require_member(
    store: &dyn Store,
    family_id: &FamilyId,
    user_id: &UserId,
) -> Result<FamilyMember, AppError> {
    match store.get_family_member(family_id, user_id).await {
        Ok(member) => Ok(member),
        Err(StoreError::NotFound) => match store.get_family(family_id).await {
            Ok(_) => Err(AppError::Forbidden),
            Err(StoreError::NotFound) => Err(AppError::NotFound),
            Err(e) => Err(e.into()),
        },
        Err(e) => Err(e.into()),
    }
}

/// Require membership plus a role capability.
pub async fn require_capability(
    store: &dyn Store,
    family_id: &FamilyId,
    user_id: &UserId,
    capability: Capability,
) -> Result<FamilyMember, AppError> {
    let member = require_member(store, family_id, user_id).await?;
    if !member.role.can(capability) {
        return Err(AppError::Forbidden);
    }
    Ok(member)
}
