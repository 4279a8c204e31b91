//! Shared application state and router assembly.

use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use famlist_events::RealtimeBroker;
use famlist_storage::Store;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use crate::email::{EmailError, EmailProvider, InvitationEmailContent};
use crate::fanout::NotificationFanout;
use crate::handlers;

/// Configured outbound email: provider plus sender identity.
pub struct EmailSender {
    pub provider: Box<dyn EmailProvider>,
    pub from_address: String,
    pub from_name: Option<String>,
}

impl EmailSender {
    pub async fn send_invitation(
        &self,
        to: &str,
        content: &InvitationEmailContent,
    ) -> Result<(), EmailError> {
        self.provider
            .send_invitation(to, content, &self.from_address, self.from_name.as_deref())
            .await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub broker: Arc<dyn RealtimeBroker>,
    pub fanout: Arc<NotificationFanout>,
    /// `None` disables invitation emails (in-app delivery only).
    pub email: Option<Arc<EmailSender>>,
    /// `None` in tests, where no global recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        broker: Arc<dyn RealtimeBroker>,
        email: Option<Arc<EmailSender>>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let fanout = Arc::new(NotificationFanout::new(store.clone(), broker.clone()));
        Self {
            store,
            broker,
            fanout,
            email,
            metrics,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/families",
            post(handlers::families::create).get(handlers::families::list),
        )
        .route(
            "/api/families/:family_id",
            get(handlers::families::get)
                .patch(handlers::families::update)
                .delete(handlers::families::remove),
        )
        .route(
            "/api/families/:family_id/members",
            get(handlers::members::list),
        )
        .route(
            "/api/families/:family_id/members/:user_id",
            patch(handlers::members::update_role).delete(handlers::members::remove),
        )
        .route(
            "/api/families/:family_id/invitations",
            post(handlers::invitations::create).get(handlers::invitations::list_pending),
        )
        .route(
            "/api/families/:family_id/invitations/:invitation_id",
            delete(handlers::invitations::cancel),
        )
        .route(
            "/api/invitations/:invitation_id",
            get(handlers::invitations::get),
        )
        .route(
            "/api/invitations/:invitation_id/respond",
            post(handlers::invitations::respond),
        )
        .route(
            "/api/notifications",
            get(handlers::notifications::list),
        )
        .route(
            "/api/notifications/read",
            post(handlers::notifications::mark_read),
        )
        .route(
            "/api/notifications/:notification_id",
            delete(handlers::notifications::remove),
        )
        .route(
            "/api/families/:family_id/events",
            get(handlers::events::family_events),
        )
        .route(
            "/api/notifications/events",
            get(handlers::events::notification_events),
        )
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn(crate::metrics::track_http))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
