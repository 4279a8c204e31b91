//! Membership management: listing, role changes, removal and leaving.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use famlist_storage::{Capability, FamilyId, FamilyMember, NotificationKind, Role, UserId};
use serde::Deserialize;

use crate::authz;
use crate::error::AppError;
use crate::extract::extract_json;
use crate::identity::Identity;
use crate::server::AppState;

pub async fn list(
    State(state): State<AppState>,
    identity: Identity,
    Path(family_id): Path<FamilyId>,
) -> Result<Json<Vec<FamilyMember>>, AppError> {
    let me = authz::require_member(state.store.as_ref(), &family_id, &identity.user_id).await?;

    // Opportunistic backfill of the caller's cached email, detached from the
    // request; stale or missing values are advisory only.
    let stale = me
        .email
        .as_deref()
        .map(|cached| !identity.email_matches(cached))
        .unwrap_or(true);
    if stale {
        let store = state.store.clone();
        let user_id = identity.user_id;
        let email = identity.email.clone();
        tokio::spawn(async move {
            let _ = store.set_member_email(&family_id, &user_id, &email).await;
        });
    }

    let members = state.store.list_family_members(&family_id).await?;
    Ok(Json(members))
}

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

pub async fn update_role(
    State(state): State<AppState>,
    identity: Identity,
    Path((family_id, user_id)): Path<(FamilyId, UserId)>,
    body: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> Result<Json<FamilyMember>, AppError> {
    authz::require_capability(
        state.store.as_ref(),
        &family_id,
        &identity.user_id,
        Capability::ManageMembers,
    )
    .await?;

    let req = extract_json(body)?;
    state
        .store
        .update_member_role(&family_id, &user_id, req.role)
        .await?;
    let member = state.store.get_family_member(&family_id, &user_id).await?;

    let fanout = state.fanout.clone();
    let sender = identity.user_id;
    let message = format!(
        "{} is now {}",
        member.email.as_deref().unwrap_or("a member"),
        member.role.as_str()
    );
    tokio::spawn(async move {
        fanout
            .notify_family(family_id, sender, NotificationKind::RoleChanged, &message)
            .await;
    });

    Ok(Json(member))
}

pub async fn remove(
    State(state): State<AppState>,
    identity: Identity,
    Path((family_id, user_id)): Path<(FamilyId, UserId)>,
) -> Result<StatusCode, AppError> {
    let leaving = identity.user_id == user_id;

    // Any member may leave; removing someone else takes ManageMembers.
    if leaving {
        authz::require_member(state.store.as_ref(), &family_id, &identity.user_id).await?;
    } else {
        authz::require_capability(
            state.store.as_ref(),
            &family_id,
            &identity.user_id,
            Capability::ManageMembers,
        )
        .await?;
    }

    // Collect recipients before the row disappears so a removed member is
    // told about their own removal.
    let members = state.store.list_family_members(&family_id).await?;
    let target = members
        .iter()
        .find(|m| m.user_id == user_id)
        .cloned()
        .ok_or(AppError::NotFound)?;

    state
        .store
        .remove_family_member(&family_id, &user_id)
        .await?;

    let (kind, message) = if leaving {
        (
            NotificationKind::MemberLeft,
            format!(
                "{} left the family",
                target.email.as_deref().unwrap_or("A member")
            ),
        )
    } else {
        (
            NotificationKind::MemberRemoved,
            format!(
                "{} was removed from the family",
                target.email.as_deref().unwrap_or("A member")
            ),
        )
    };
    let fanout = state.fanout.clone();
    let sender = identity.user_id;
    tokio::spawn(async move {
        fanout
            .notify_members(&members, family_id, sender, kind, &message)
            .await;
    });

    Ok(StatusCode::OK)
}
