//! Notification fanout: persist one row per recipient, then publish
//! realtime events.
//!
//! Fanout is best-effort. The triggering mutation has already committed, so
//! failures here are logged and swallowed rather than surfaced as request
//! errors.

use std::sync::Arc;

use chrono::Utc;
use famlist_events::{BrokerEvent, Channel, FamilyEventKind, RealtimeBroker};
use famlist_storage::{
    FamilyId, FamilyMember, NewNotification, NotificationKind, Store, UserId,
};

fn event_kind(kind: NotificationKind) -> FamilyEventKind {
    match kind {
        NotificationKind::MemberJoined => FamilyEventKind::MemberJoined,
        NotificationKind::MemberLeft => FamilyEventKind::MemberLeft,
        NotificationKind::MemberRemoved => FamilyEventKind::MemberRemoved,
        NotificationKind::RoleChanged => FamilyEventKind::RoleChanged,
        NotificationKind::FamilyUpdated => FamilyEventKind::FamilyUpdated,
        NotificationKind::FamilyDeleted => FamilyEventKind::FamilyDeleted,
        NotificationKind::InvitationCreated => FamilyEventKind::InvitationCreated,
    }
}

pub struct NotificationFanout {
    store: Arc<dyn Store>,
    broker: Arc<dyn RealtimeBroker>,
}

impl NotificationFanout {
    pub fn new(store: Arc<dyn Store>, broker: Arc<dyn RealtimeBroker>) -> Self {
        Self { store, broker }
    }

    /// Notify every current member of `family_id` except the sender.
    pub async fn notify_family(
        &self,
        family_id: FamilyId,
        sender: UserId,
        kind: NotificationKind,
        message: &str,
    ) {
        let members = match self.store.list_family_members(&family_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(family = %family_id, error = %e, "fanout: listing members failed");
                return;
            }
        };
        self.notify_members(&members, family_id, sender, kind, message)
            .await;
    }

    /// Notify a pre-collected member set. Used when the membership rows are
    /// already gone by publish time (family deletion).
    pub async fn notify_members(
        &self,
        members: &[FamilyMember],
        family_id: FamilyId,
        sender: UserId,
        kind: NotificationKind,
        message: &str,
    ) {
        let rows: Vec<NewNotification> = members
            .iter()
            .filter(|m| m.user_id != sender)
            .map(|m| NewNotification {
                user_id: m.user_id,
                family_id,
                sender_id: Some(sender),
                kind,
                message: message.to_string(),
            })
            .collect();

        let inserted = match self.store.insert_notifications(&rows).await {
            Ok(inserted) => inserted,
            Err(e) => {
                tracing::warn!(family = %family_id, error = %e, "fanout: notification insert failed");
                return;
            }
        };

        let occurred_at = Utc::now();

        // Family channel first, so list views refresh even for the sender.
        let family_event = BrokerEvent {
            kind: event_kind(kind),
            family_id,
            sender_id: Some(sender),
            notification_id: None,
            occurred_at,
        };
        if let Err(e) = self
            .broker
            .publish(&Channel::Family(family_id), family_event)
            .await
        {
            tracing::warn!(family = %family_id, error = %e, "fanout: family publish failed");
        }

        for notification in inserted {
            let event = BrokerEvent {
                kind: FamilyEventKind::NotificationCreated,
                family_id,
                sender_id: Some(sender),
                notification_id: Some(notification.id),
                occurred_at,
            };
            if let Err(e) = self
                .broker
                .publish(&Channel::UserNotifications(notification.user_id), event)
                .await
            {
                tracing::warn!(
                    user = %notification.user_id,
                    error = %e,
                    "fanout: notification publish failed"
                );
            }
        }
    }
}
