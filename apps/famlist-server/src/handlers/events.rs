//! Server-sent event streams backed by the realtime broker.
//!
//! Each stream holds a subscription registered under a (consumer, channel)
//! pair. Dropping the stream (client disconnect) releases the registry entry;
//! a reconnect under the same consumer id tears down the stale stream first.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use famlist_events::{
    BrokerEvent, Channel, ConsumerId, EventStream, RealtimeBroker, SubscriptionToken,
};
use famlist_storage::FamilyId;
use futures::Stream;
use serde::Deserialize;

use crate::authz;
use crate::error::AppError;
use crate::identity::Identity;
use crate::server::AppState;

#[derive(Deserialize)]
pub struct EventsQuery {
    /// Stable client session id. Defaults to the user id, which means one
    /// live stream per user per channel.
    pub session: Option<String>,
}

struct SubscriptionGuard {
    broker: Arc<dyn RealtimeBroker>,
    consumer: ConsumerId,
    channel: Channel,
    token: SubscriptionToken,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let broker = self.broker.clone();
        let consumer = self.consumer.clone();
        let channel = self.channel.clone();
        let token = self.token;
        tokio::spawn(async move {
            // Token-scoped: a guard dropped after a reconnect only removes
            // its own registry entry, never the replacement's.
            broker.unsubscribe(&consumer, &channel, token).await;
        });
    }
}

pub struct GuardedStream {
    inner: EventStream,
    _guard: SubscriptionGuard,
}

impl Stream for GuardedStream {
    type Item = Result<Event, axum::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(Some(to_sse(&event))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn to_sse(event: &BrokerEvent) -> Result<Event, axum::Error> {
    Event::default().json_data(event)
}

async fn subscribe(
    state: &AppState,
    identity: &Identity,
    session: Option<String>,
    channel: Channel,
) -> Result<Sse<GuardedStream>, AppError> {
    let consumer = ConsumerId(session.unwrap_or_else(|| identity.user_id.to_string()));

    let (token, inner) = state
        .broker
        .subscribe(&consumer, &channel)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let stream = GuardedStream {
        inner,
        _guard: SubscriptionGuard {
            broker: state.broker.clone(),
            consumer,
            channel,
            token,
        },
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// `GET /api/families/{id}/events` (members only).
pub async fn family_events(
    State(state): State<AppState>,
    identity: Identity,
    Path(family_id): Path<FamilyId>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<GuardedStream>, AppError> {
    authz::require_member(state.store.as_ref(), &family_id, &identity.user_id).await?;
    subscribe(&state, &identity, query.session, Channel::Family(family_id)).await
}

/// `GET /api/notifications/events`: the caller's own notification channel.
pub async fn notification_events(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<GuardedStream>, AppError> {
    let channel = Channel::UserNotifications(identity.user_id);
    subscribe(&state, &identity, query.session, channel).await
}
