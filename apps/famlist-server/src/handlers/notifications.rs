//! Per-user notification inbox.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use famlist_storage::{Notification, NotificationId};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::extract_json;
use crate::identity::Identity;
use crate::server::AppState;

pub async fn list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state.store.list_notifications(&identity.user_id).await?;
    Ok(Json(notifications))
}

#[derive(Deserialize)]
pub struct MarkReadRequest {
    pub ids: Vec<NotificationId>,
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

pub async fn mark_read(
    State(state): State<AppState>,
    identity: Identity,
    body: Result<Json<MarkReadRequest>, JsonRejection>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let req = extract_json(body)?;
    let updated = state
        .store
        .mark_notifications_read(&identity.user_id, &req.ids, Utc::now())
        .await?;
    Ok(Json(MarkReadResponse { updated }))
}

pub async fn remove(
    State(state): State<AppState>,
    identity: Identity,
    Path(notification_id): Path<NotificationId>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .store
        .delete_notification(&identity.user_id, &notification_id)
        .await?;

    // Someone else's row and a missing row look the same to the caller.
    if deleted == 0 {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::OK)
}
