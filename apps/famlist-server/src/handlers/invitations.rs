//! Invitation lifecycle: create, list, view, respond, cancel.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use famlist_storage::{
    Capability, CreateInvitationParams, FamilyId, FamilyInvitation, InvitationId,
    InvitationStatus, NotificationKind, Role, StoreError,
};
use serde::Deserialize;

use crate::authz;
use crate::email::InvitationEmailContent;
use crate::error::AppError;
use crate::extract::extract_json;
use crate::identity::Identity;
use crate::server::AppState;

const MAX_EMAIL_CHARS: usize = 254;

fn validate_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim();
    if !email.contains('@') || email.chars().count() > MAX_EMAIL_CHARS {
        return Err(AppError::Validation("invalid email address".into()));
    }
    Ok(email.to_string())
}

/// The invitee (by email match), or any member of the inviting family, may
/// look at an invitation. Everyone else gets 403 regardless of whether the
/// invitation exists for them.
async fn require_invitation_access(
    state: &AppState,
    identity: &Identity,
    invitation: &FamilyInvitation,
) -> Result<(), AppError> {
    if identity.email_matches(&invitation.email) {
        return Ok(());
    }
    match authz::require_member(
        state.store.as_ref(),
        &invitation.family_id,
        &identity.user_id,
    )
    .await
    {
        Ok(_) => Ok(()),
        Err(AppError::NotFound) => Err(AppError::Forbidden),
        Err(e) => Err(e),
    }
}

#[derive(Deserialize)]
pub struct CreateInvitationRequest {
    pub email: String,
    pub role: Role,
}

pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    Path(family_id): Path<FamilyId>,
    body: Result<Json<CreateInvitationRequest>, JsonRejection>,
) -> Result<Json<FamilyInvitation>, AppError> {
    authz::require_capability(
        state.store.as_ref(),
        &family_id,
        &identity.user_id,
        Capability::Invite,
    )
    .await?;

    // Fetched up front: once the invitation commits, nothing may fail the
    // request anymore.
    let family = state.store.get_family(&family_id).await?;

    let req = extract_json(body)?;
    let email = validate_email(&req.email)?;
    let invitation = state
        .store
        .create_invitation(
            &CreateInvitationParams {
                family_id,
                email,
                role: req.role,
                invited_by: identity.user_id,
            },
            Utc::now(),
        )
        .await?;

    tracing::info!(
        family = %family_id,
        invitation = %invitation.id,
        role = invitation.role.as_str(),
        "invitation created"
    );

    // The invitee has no user id yet, so delivery is by email only; no
    // notification rows are written for an invitation. Sending is detached
    // and best-effort.
    if let Some(email_sender) = &state.email {
        let email_sender = email_sender.clone();
        let to = invitation.email.clone();
        let invitation_id = invitation.id;
        let content = InvitationEmailContent::new(&family.name, &identity.email, invitation.role);
        tokio::spawn(async move {
            if let Err(e) = email_sender.send_invitation(&to, &content).await {
                tracing::warn!(invitation = %invitation_id, error = %e, "invitation email failed");
            }
        });
    }

    Ok(Json(invitation))
}

pub async fn list_pending(
    State(state): State<AppState>,
    identity: Identity,
    Path(family_id): Path<FamilyId>,
) -> Result<Json<Vec<FamilyInvitation>>, AppError> {
    authz::require_capability(
        state.store.as_ref(),
        &family_id,
        &identity.user_id,
        Capability::Invite,
    )
    .await?;

    let pending = state
        .store
        .list_pending_invitations(&family_id, Utc::now())
        .await?;
    Ok(Json(pending))
}

pub async fn get(
    State(state): State<AppState>,
    identity: Identity,
    Path(invitation_id): Path<InvitationId>,
) -> Result<Json<FamilyInvitation>, AppError> {
    let invitation = state.store.get_invitation(&invitation_id).await?;
    require_invitation_access(&state, &identity, &invitation).await?;

    // An expired pending invitation is gone, not merely pending; responded
    // ones stay viewable as history.
    if invitation.status == InvitationStatus::Pending && invitation.is_expired_at(Utc::now()) {
        return Err(AppError::Expired);
    }
    Ok(Json(invitation))
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RespondAction {
    Accept,
    Reject,
}

#[derive(Deserialize)]
pub struct RespondRequest {
    pub action: RespondAction,
}

pub async fn respond(
    State(state): State<AppState>,
    identity: Identity,
    Path(invitation_id): Path<InvitationId>,
    body: Result<Json<RespondRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let invitation = state.store.get_invitation(&invitation_id).await?;

    // Only the invited email may respond.
    if !identity.email_matches(&invitation.email) {
        return Err(AppError::Forbidden);
    }

    let req = extract_json(body)?;
    let now = Utc::now();
    match req.action {
        RespondAction::Accept => {
            let member = state
                .store
                .accept_invitation(&invitation_id, &identity.user_id, now)
                .await?;

            tracing::info!(
                family = %invitation.family_id,
                user = %identity.user_id,
                "invitation accepted"
            );

            let fanout = state.fanout.clone();
            let sender = identity.user_id;
            let family_id = invitation.family_id;
            let message = format!("{} joined the family", invitation.email);
            tokio::spawn(async move {
                fanout
                    .notify_family(family_id, sender, NotificationKind::MemberJoined, &message)
                    .await;
            });

            Ok(Json(member).into_response())
        }
        RespondAction::Reject => {
            state.store.reject_invitation(&invitation_id, now).await?;
            tracing::info!(invitation = %invitation_id, "invitation rejected");
            Ok(StatusCode::OK.into_response())
        }
    }
}

pub async fn cancel(
    State(state): State<AppState>,
    identity: Identity,
    Path((family_id, invitation_id)): Path<(FamilyId, InvitationId)>,
) -> Result<StatusCode, AppError> {
    authz::require_capability(
        state.store.as_ref(),
        &family_id,
        &identity.user_id,
        Capability::Invite,
    )
    .await?;

    // The route is family-scoped: an invitation id from another family is
    // simply not found here.
    let invitation = state.store.get_invitation(&invitation_id).await?;
    if invitation.family_id != family_id {
        return Err(AppError::NotFound);
    }

    match state.store.delete_invitation(&invitation_id).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(StoreError::AlreadyResponded) => Err(AppError::AlreadyResponded),
        Err(e) => Err(e.into()),
    }
}
