//! Realtime broker abstraction for famlist change events.
//!
//! This crate defines the RealtimeBroker trait that allows different
//! implementations for event delivery across server replicas:
//! - Memory (single server, tokio broadcast channels)
//! - Redis or Postgres pub/sub for multi-server deployments
//!
//! Channel naming is part of the contract consumed by UI subscribers:
//! `family:{id}` for membership/list changes, `user:{id}:notifications`
//! for notification inserts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use famlist_storage::{FamilyId, NotificationId, UserId};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;

/// A logical broadcast channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Membership and shared-list change events for one family.
    Family(FamilyId),
    /// Notification inserts for one user.
    UserNotifications(UserId),
}

impl Channel {
    /// Wire name of the channel (`family:{id}` / `user:{id}:notifications`).
    pub fn name(&self) -> String {
        match self {
            Channel::Family(id) => format!("family:{}", id),
            Channel::UserNotifications(id) => format!("user:{}:notifications", id),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Identifies one consumer (e.g., one UI session). At most one active
/// subscription per (consumer, channel) is expected; a re-subscribe first
/// tears down the prior stream held by the same consumer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConsumerId(pub String);

/// Handle for one live subscription, issued by [`RealtimeBroker::subscribe`].
/// Teardown requires the token, so a guard outliving a reconnect can only
/// end the stream it was issued for, never the replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionToken(pub u64);

/// What changed within a family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyEventKind {
    MemberJoined,
    MemberLeft,
    MemberRemoved,
    RoleChanged,
    FamilyUpdated,
    FamilyDeleted,
    InvitationCreated,
    NotificationCreated,
}

/// Event published on a channel after a successful mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrokerEvent {
    pub kind: FamilyEventKind,
    pub family_id: FamilyId,
    /// The acting user; `None` for system-originated events.
    pub sender_id: Option<UserId>,
    /// Set on `user:{id}:notifications` channels: the inserted row.
    pub notification_id: Option<NotificationId>,
    pub occurred_at: DateTime<Utc>,
}

/// Error type for broker operations
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Stream of broker events
pub type EventStream = Pin<Box<dyn Stream<Item = BrokerEvent> + Send>>;

/// Broker trait for publishing and subscribing to family change events.
///
/// Publishing is fire-and-forget: slow or absent subscribers must never
/// back-pressure the mutation that triggered the event.
#[async_trait]
pub trait RealtimeBroker: Send + Sync {
    /// Publish an event to all subscribers of a channel.
    async fn publish(&self, channel: &Channel, event: BrokerEvent) -> Result<(), BrokerError>;

    /// Subscribe to a channel on behalf of a consumer.
    ///
    /// Any prior subscription held by the same (consumer, channel) pair is
    /// torn down first so events are never delivered twice to one consumer.
    async fn subscribe(
        &self,
        consumer: &ConsumerId,
        channel: &Channel,
    ) -> Result<(SubscriptionToken, EventStream), BrokerError>;

    /// Tear down the subscription identified by `token`. Unknown pairs and
    /// stale tokens (already replaced by a re-subscribe) are a no-op.
    async fn unsubscribe(&self, consumer: &ConsumerId, channel: &Channel, token: SubscriptionToken);
}
