//! Link Bus
//!
//! In-process implementation of the two host primitives the codec treats as
//! external collaborators:
//!
//! - point-to-point send ([`LinkSender`]): the payload is queued for whichever
//!   actor owns the routing slot in the [`StateRegistry`]
//! - broadcast/listen: actors register for numeric channels and every
//!   listener of a channel hears each broadcast on it
//!
//! ## Delivery Semantics
//!
//! Fire-and-forget. A payload for a slot nobody owns, or for an actor whose
//! mailbox has closed, is dropped with a warning and counted in
//! [`BusMetrics`]; the sender is never told. Payloads sent to one actor are
//! queued in send order, but nothing orders sends from different actors, so
//! state logic must not assume any arrival order beyond its own control
//! sequence.

use crate::registry::{ActorId, StateRegistry};
use linkchain_codec::{CorrelationToken, LinkSender, LinkTarget, StateId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// One queued message for an actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Point-to-point payload for routing slot `slot`
    Linked {
        slot: StateId,
        target: LinkTarget,
        payload: String,
        token: CorrelationToken,
    },
    /// Broadcast payload heard on `channel`
    Heard {
        channel: i32,
        payload: String,
        token: CorrelationToken,
    },
}

/// Sending half of an actor mailbox
pub type MailboxSender = mpsc::UnboundedSender<Delivery>;

/// Receiving half of an actor mailbox
pub type MailboxReceiver = mpsc::UnboundedReceiver<Delivery>;

/// Create a mailbox pair
pub fn mailbox() -> (MailboxSender, MailboxReceiver) {
    mpsc::unbounded_channel()
}

/// Bus counters
#[derive(Debug, Default)]
pub struct BusMetrics {
    /// Point-to-point sends accepted by the bus
    pub linked_sends: AtomicU64,
    /// Point-to-point payloads queued in a mailbox
    pub linked_deliveries: AtomicU64,
    /// Payloads for a slot no actor owns
    pub dropped_unowned: AtomicU64,
    /// Payloads for an actor without an open mailbox
    pub dropped_closed: AtomicU64,
    /// Broadcasts issued
    pub broadcasts: AtomicU64,
    /// Broadcast payloads queued in a listener's mailbox
    pub heard_deliveries: AtomicU64,
}

impl BusMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn stats(&self) -> BusStats {
        BusStats {
            linked_sends: self.linked_sends.load(Ordering::Relaxed),
            linked_deliveries: self.linked_deliveries.load(Ordering::Relaxed),
            dropped_unowned: self.dropped_unowned.load(Ordering::Relaxed),
            dropped_closed: self.dropped_closed.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            heard_deliveries: self.heard_deliveries.load(Ordering::Relaxed),
        }
    }
}

/// Bus statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusStats {
    pub linked_sends: u64,
    pub linked_deliveries: u64,
    pub dropped_unowned: u64,
    pub dropped_closed: u64,
    pub broadcasts: u64,
    pub heard_deliveries: u64,
}

impl BusStats {
    /// Total payloads that never reached a mailbox
    pub fn dropped(&self) -> u64 {
        self.dropped_unowned + self.dropped_closed
    }
}

/// Shared in-process message channel
#[derive(Debug)]
pub struct LinkBus {
    registry: Arc<StateRegistry>,
    mailboxes: RwLock<HashMap<ActorId, MailboxSender>>,
    listeners: RwLock<HashMap<i32, Vec<ActorId>>>,
    metrics: Arc<BusMetrics>,
}

impl LinkBus {
    pub fn new(registry: Arc<StateRegistry>) -> Self {
        Self {
            registry,
            mailboxes: RwLock::new(HashMap::new()),
            listeners: RwLock::new(HashMap::new()),
            metrics: BusMetrics::new(),
        }
    }

    /// Connect an actor's mailbox to the bus
    pub fn attach(&self, actor: ActorId, sender: MailboxSender) {
        debug!(actor = %actor, "Attaching mailbox to link bus");
        self.mailboxes.write().insert(actor, sender);
    }

    /// Disconnect an actor: drop its mailbox sender and every listen
    /// registration. Returns whether the actor was attached.
    pub fn detach(&self, actor: &ActorId) -> bool {
        let removed = self.mailboxes.write().remove(actor).is_some();
        let mut listeners = self.listeners.write();
        for actors in listeners.values_mut() {
            actors.retain(|a| a != actor);
        }
        listeners.retain(|_, actors| !actors.is_empty());
        if removed {
            debug!(actor = %actor, "Detached mailbox from link bus");
        }
        removed
    }

    /// Register `actor` as a listener on `channel`
    pub fn listen(&self, channel: i32, actor: ActorId) {
        let mut listeners = self.listeners.write();
        let actors = listeners.entry(channel).or_default();
        if !actors.contains(&actor) {
            debug!(actor = %actor, channel, "Listening on channel");
            actors.push(actor);
        }
    }

    /// Remove a listen registration
    pub fn forget(&self, channel: i32, actor: &ActorId) {
        let mut listeners = self.listeners.write();
        if let Some(actors) = listeners.get_mut(&channel) {
            actors.retain(|a| a != actor);
            if actors.is_empty() {
                listeners.remove(&channel);
            }
        }
    }

    /// Actors currently listening on `channel`
    pub fn listeners_of(&self, channel: i32) -> Vec<ActorId> {
        self.listeners
            .read()
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }

    /// Deliver `payload` to every listener of `channel`
    ///
    /// Returns how many mailboxes accepted it.
    pub fn broadcast(&self, channel: i32, payload: impl Into<String>, token: &CorrelationToken) -> usize {
        self.metrics.broadcasts.fetch_add(1, Ordering::Relaxed);
        let payload = payload.into();
        let listeners = self.listeners_of(channel);
        if listeners.is_empty() {
            trace!(channel, "Broadcast with no listeners");
            return 0;
        }

        let mut reached = 0;
        for actor in &listeners {
            let delivery = Delivery::Heard {
                channel,
                payload: payload.clone(),
                token: token.clone(),
            };
            if self.deliver(actor, delivery) {
                self.metrics.heard_deliveries.fetch_add(1, Ordering::Relaxed);
                reached += 1;
            }
        }
        reached
    }

    pub fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> Arc<BusMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Number of attached mailboxes
    pub fn attached(&self) -> usize {
        self.mailboxes.read().len()
    }

    fn deliver(&self, actor: &ActorId, delivery: Delivery) -> bool {
        let sender = self.mailboxes.read().get(actor).cloned();
        match sender {
            Some(sender) if sender.send(delivery).is_ok() => true,
            _ => {
                warn!(actor = %actor, "Mailbox closed, dropping payload");
                self.metrics.dropped_closed.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }
}

impl LinkSender for LinkBus {
    fn send_linked(
        &self,
        target: LinkTarget,
        slot: StateId,
        payload: String,
        token: &CorrelationToken,
    ) {
        self.metrics.linked_sends.fetch_add(1, Ordering::Relaxed);

        let Some(owner) = self.registry.owner(slot) else {
            warn!(slot = %slot, payload = %payload, "No actor owns slot, dropping payload");
            self.metrics.dropped_unowned.fetch_add(1, Ordering::Relaxed);
            return;
        };

        trace!(slot = %slot, actor = %owner, "Queueing linked payload");
        let delivery = Delivery::Linked {
            slot,
            target,
            payload,
            token: token.clone(),
        };
        if self.deliver(&owner, delivery) {
            self.metrics.linked_deliveries.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(raw: i32) -> StateId {
        StateId::new(raw).unwrap()
    }

    #[test]
    fn test_linked_send_reaches_owner() {
        let registry = Arc::new(StateRegistry::new());
        let bus = LinkBus::new(Arc::clone(&registry));
        let actor = ActorId::new();
        let (tx, mut rx) = mailbox();
        bus.attach(actor.clone(), tx);
        registry.claim(&actor, &[slot(10)]).unwrap();

        let token = CorrelationToken::new("t");
        bus.send_linked(LinkTarget::This, slot(10), "12|x".to_string(), &token);

        assert_eq!(
            rx.try_recv().unwrap(),
            Delivery::Linked {
                slot: slot(10),
                target: LinkTarget::This,
                payload: "12|x".to_string(),
                token,
            }
        );
        assert_eq!(bus.metrics().stats().linked_deliveries, 1);
    }

    #[test]
    fn test_unowned_slot_is_dropped_and_counted() {
        let bus = LinkBus::new(Arc::new(StateRegistry::new()));
        bus.send_linked(LinkTarget::This, slot(99), "|".to_string(), &CorrelationToken::default());

        let stats = bus.metrics().stats();
        assert_eq!(stats.linked_sends, 1);
        assert_eq!(stats.dropped_unowned, 1);
        assert_eq!(stats.dropped(), 1);
    }

    #[test]
    fn test_closed_mailbox_is_dropped_and_counted() {
        let registry = Arc::new(StateRegistry::new());
        let bus = LinkBus::new(Arc::clone(&registry));
        let actor = ActorId::new();
        let (tx, rx) = mailbox();
        bus.attach(actor.clone(), tx);
        registry.claim(&actor, &[slot(1)]).unwrap();
        drop(rx);

        bus.send_linked(LinkTarget::This, slot(1), "|".to_string(), &CorrelationToken::default());
        assert_eq!(bus.metrics().stats().dropped_closed, 1);
    }

    #[test]
    fn test_broadcast_reaches_every_listener() {
        let bus = LinkBus::new(Arc::new(StateRegistry::new()));
        let (a, b) = (ActorId::new(), ActorId::new());
        let (tx_a, mut rx_a) = mailbox();
        let (tx_b, mut rx_b) = mailbox();
        bus.attach(a.clone(), tx_a);
        bus.attach(b.clone(), tx_b);
        bus.listen(-5, a.clone());
        bus.listen(-5, b.clone());
        bus.listen(-5, b.clone());

        let reached = bus.broadcast(-5, "-5|hi", &CorrelationToken::default());
        assert_eq!(reached, 2);
        assert!(matches!(rx_a.try_recv().unwrap(), Delivery::Heard { channel: -5, .. }));
        assert!(matches!(rx_b.try_recv().unwrap(), Delivery::Heard { channel: -5, .. }));
        assert!(rx_b.try_recv().is_err());

        bus.forget(-5, &a);
        assert_eq!(bus.listeners_of(-5), vec![b.clone()]);
        assert_eq!(bus.broadcast(-6, "x", &CorrelationToken::default()), 0);
    }

    #[test]
    fn test_detach_removes_listen_registrations() {
        let bus = LinkBus::new(Arc::new(StateRegistry::new()));
        let actor = ActorId::new();
        let (tx, _rx) = mailbox();
        bus.attach(actor.clone(), tx);
        bus.listen(3, actor.clone());

        assert!(bus.detach(&actor));
        assert!(bus.listeners_of(3).is_empty());
        assert_eq!(bus.attached(), 0);
        assert!(!bus.detach(&actor));
    }
}
