//! HTTP handlers, one module per resource.

pub mod events;
pub mod families;
pub mod invitations;
pub mod members;
pub mod notifications;

use axum::extract::State;

use crate::server::AppState;

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
