//! Family group CRUD.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use famlist_storage::{Capability, CreateFamilyParams, Family, FamilyId, NotificationKind};
use serde::Deserialize;

use crate::authz;
use crate::error::AppError;
use crate::extract::extract_json;
use crate::identity::Identity;
use crate::server::AppState;

const MAX_NAME_CHARS: usize = 100;

fn validate_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("family name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "family name must be at most {} characters",
            MAX_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

#[derive(Deserialize)]
pub struct CreateFamilyRequest {
    pub name: String,
}

pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    body: Result<Json<CreateFamilyRequest>, JsonRejection>,
) -> Result<Json<Family>, AppError> {
    let req = extract_json(body)?;
    let name = validate_name(&req.name)?;

    let family = state
        .store
        .create_family(&CreateFamilyParams {
            name,
            created_by: identity.user_id,
            creator_email: identity.email.clone(),
        })
        .await?;

    tracing::info!(family = %family.id, user = %identity.user_id, "family created");
    Ok(Json(family))
}

pub async fn list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Family>>, AppError> {
    let families = state.store.list_families_for_user(&identity.user_id).await?;
    Ok(Json(families))
}

pub async fn get(
    State(state): State<AppState>,
    identity: Identity,
    Path(family_id): Path<FamilyId>,
) -> Result<Json<Family>, AppError> {
    authz::require_member(state.store.as_ref(), &family_id, &identity.user_id).await?;
    let family = state.store.get_family(&family_id).await?;
    Ok(Json(family))
}

#[derive(Deserialize)]
pub struct UpdateFamilyRequest {
    pub name: String,
}

pub async fn update(
    State(state): State<AppState>,
    identity: Identity,
    Path(family_id): Path<FamilyId>,
    body: Result<Json<UpdateFamilyRequest>, JsonRejection>,
) -> Result<Json<Family>, AppError> {
    authz::require_capability(
        state.store.as_ref(),
        &family_id,
        &identity.user_id,
        Capability::ManageFamily,
    )
    .await?;

    let req = extract_json(body)?;
    let name = validate_name(&req.name)?;
    state.store.update_family_name(&family_id, &name).await?;
    let family = state.store.get_family(&family_id).await?;

    // Fanout runs detached; the rename has already committed.
    let fanout = state.fanout.clone();
    let sender = identity.user_id;
    let message = format!("The family was renamed to \"{}\"", family.name);
    tokio::spawn(async move {
        fanout
            .notify_family(family_id, sender, NotificationKind::FamilyUpdated, &message)
            .await;
    });

    Ok(Json(family))
}

pub async fn remove(
    State(state): State<AppState>,
    identity: Identity,
    Path(family_id): Path<FamilyId>,
) -> Result<StatusCode, AppError> {
    authz::require_capability(
        state.store.as_ref(),
        &family_id,
        &identity.user_id,
        Capability::ManageFamily,
    )
    .await?;

    // Membership rows cascade away with the family, so collect recipients
    // first; the notifications themselves survive deletion.
    let members = state.store.list_family_members(&family_id).await?;
    let family = state.store.get_family(&family_id).await?;

    state.store.delete_family(&family_id).await?;
    tracing::info!(family = %family_id, user = %identity.user_id, "family deleted");

    let fanout = state.fanout.clone();
    let sender = identity.user_id;
    let message = format!("The family \"{}\" was deleted", family.name);
    tokio::spawn(async move {
        fanout
            .notify_members(
                &members,
                family_id,
                sender,
                NotificationKind::FamilyDeleted,
                &message,
            )
            .await;
    });

    Ok(StatusCode::OK)
}
