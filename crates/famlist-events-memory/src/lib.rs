//! In-memory realtime broker using tokio broadcast channels.
//!
//! Suitable for single-server deployments, development, and testing. Events
//! are only broadcast within one process; replicas will NOT receive each
//! other's events.
//!
//! The broker owns an explicit registry of active subscriptions keyed by
//! (consumer, channel). There is no process-wide singleton channel handle:
//! a second subscribe by the same consumer tears down the first stream, so a
//! consumer never receives duplicate deliveries. Each registry entry carries
//! the token issued at subscribe time; unsubscribe only removes the entry
//! whose token matches, so a stale guard cannot end a replacement stream.

use async_trait::async_trait;
use dashmap::DashMap;
use famlist_events::{
    BrokerError, BrokerEvent, Channel, ConsumerId, EventStream, RealtimeBroker, SubscriptionToken,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;

const CHANNEL_CAPACITY: usize = 100;

pub struct MemoryBroker {
    channels: Arc<DashMap<Channel, broadcast::Sender<BrokerEvent>>>,
    /// Kill switches for active subscriptions. Replacing or removing an entry
    /// drops the sender, which ends the matching forwarding task.
    subscriptions: Arc<DashMap<(ConsumerId, Channel), (SubscriptionToken, oneshot::Sender<()>)>>,
    next_token: AtomicU64,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            subscriptions: Arc::new(DashMap::new()),
            next_token: AtomicU64::new(0),
        }
    }

    /// Attach a broadcast receiver, creating the channel on first use. The
    /// receiver is taken while the map entry is held, so a concurrent reap
    /// cannot orphan the sender between creation and subscription.
    fn subscribe_channel(&self, channel: &Channel) -> broadcast::Receiver<BrokerEvent> {
        self.channels
            .entry(channel.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Number of live subscription registry entries (test visibility).
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    /// Number of broadcast channels currently held (test visibility).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeBroker for MemoryBroker {
    async fn publish(&self, channel: &Channel, event: BrokerEvent) -> Result<(), BrokerError> {
        let tx = match self.channels.get(channel) {
            Some(entry) => entry.clone(),
            // Nobody ever subscribed here; nothing to deliver.
            None => return Ok(()),
        };

        if tx.send(event).is_err() {
            // No live receivers: reap the idle channel entry. The guard
            // re-checks the count, so a racing subscriber is never dropped.
            self.channels
                .remove_if(channel, |_, tx| tx.receiver_count() == 0);
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        consumer: &ConsumerId,
        channel: &Channel,
    ) -> Result<(SubscriptionToken, EventStream), BrokerError> {
        let mut rx = self.subscribe_channel(channel);

        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();

        // Replacing an existing entry drops the old kill sender, which ends
        // the previous forwarding task for this (consumer, channel) pair.
        self.subscriptions
            .insert((consumer.clone(), channel.clone()), (token, kill_tx));

        let (out_tx, out_rx) = mpsc::channel::<BrokerEvent>(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut kill_rx => break,
                    recv = rx.recv() => match recv {
                        Ok(event) => {
                            // Consumer gone: stop forwarding.
                            if out_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        // Client fell behind, they should do a full resync.
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok((token, Box::pin(ReceiverStream::new(out_rx))))
    }

    async fn unsubscribe(
        &self,
        consumer: &ConsumerId,
        channel: &Channel,
        token: SubscriptionToken,
    ) {
        // Dropping the kill sender resolves the forwarding task's select arm.
        // A stale token (entry already replaced) matches nothing.
        self.subscriptions.remove_if(
            &(consumer.clone(), channel.clone()),
            |_, (current, _)| *current == token,
        );
    }
}
