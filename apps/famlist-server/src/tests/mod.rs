//! HTTP-level tests against an in-memory store and broker.

mod invitations;
mod members;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use famlist_events_memory::MemoryBroker;
use famlist_storage::{FamilyId, UserId};
use famlist_store_sqlite::SqliteStore;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::identity::{USER_EMAIL_HEADER, USER_ID_HEADER};
use crate::server::{self, AppState};

pub(crate) struct TestServer {
    pub app: Router,
    pub store: Arc<SqliteStore>,
    pub broker: Arc<MemoryBroker>,
}

pub(crate) async fn test_server() -> TestServer {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let broker = Arc::new(MemoryBroker::new());
    let state = AppState::new(store.clone(), broker.clone(), None, None);
    TestServer {
        app: server::router(state),
        store,
        broker,
    }
}

#[derive(Clone)]
pub(crate) struct TestUser {
    pub id: UserId,
    pub email: String,
}

pub(crate) fn user(email: &str) -> TestUser {
    TestUser {
        id: UserId(Uuid::new_v4()),
        email: email.to_string(),
    }
}

impl TestServer {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        as_user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(u) = as_user {
            builder = builder
                .header(USER_ID_HEADER, u.id.to_string())
                .header(USER_EMAIL_HEADER, u.email.as_str());
        }
        let request = match body {
            Some(payload) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Create a family via the API, returning its id.
    pub async fn create_family(&self, admin: &TestUser, name: &str) -> FamilyId {
        let (status, body) = self
            .request(
                "POST",
                "/api/families",
                Some(admin),
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create family: {body}");
        FamilyId(Uuid::try_parse(body["id"].as_str().unwrap()).unwrap())
    }

    /// Poll the inbox until `user` holds at least `count` notifications of
    /// `kind`. Fanout runs detached from the request, so rows land shortly
    /// after the response.
    pub async fn wait_for_notifications(
        &self,
        as_user: &TestUser,
        kind: &str,
        count: usize,
    ) -> Value {
        for _ in 0..50 {
            let (_, body) = self
                .request("GET", "/api/notifications", Some(as_user), None)
                .await;
            let seen = body
                .as_array()
                .map(|rows| rows.iter().filter(|n| n["kind"] == kind).count())
                .unwrap_or(0);
            if seen >= count {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {count} {kind} notification(s)");
    }

    /// Invite and accept via the API so `invitee` becomes a member.
    pub async fn join_family(
        &self,
        family_id: FamilyId,
        inviter: &TestUser,
        invitee: &TestUser,
        role: &str,
    ) {
        let (status, body) = self
            .request(
                "POST",
                &format!("/api/families/{}/invitations", family_id),
                Some(inviter),
                Some(json!({ "email": invitee.email, "role": role })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "invite: {body}");
        let invitation_id = body["id"].as_str().unwrap().to_string();

        let (status, body) = self
            .request(
                "POST",
                &format!("/api/invitations/{}/respond", invitation_id),
                Some(invitee),
                Some(json!({ "action": "accept" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "accept: {body}");
    }
}
