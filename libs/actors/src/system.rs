//! Actor System Core
//!
//! Run-to-completion state actors on top of the [`LinkBus`]. Each actor owns a
//! set of state ids and optionally listens on broadcast channels; each queued
//! delivery becomes one hop:
//!
//! ```text
//! Delivery::Linked ──► WorkingState::decode ─────┐
//!                                                ├─► on_state ─► advance_or_stop ─► LinkBus
//! Delivery::Heard  ──► WorkingState::decode_listen┘      │
//!                                                        └─ Hold: nothing sent
//! ```
//!
//! An actor processes its mailbox strictly one delivery at a time and its
//! working state lives only for that hop. Nothing is shared between hops
//! except what the behavior keeps in `self`.
//!
//! # Lock Ordering
//!
//! `tasks` is never held across an `.await` or while touching the bus. The bus
//! takes `mailboxes` and `listeners` one at a time.

use crate::registry::{ActorId, StateRegistry};
use crate::transport::{mailbox, Delivery, LinkBus, MailboxReceiver};
use crate::{ActorError, Result};

use async_trait::async_trait;
use linkchain_codec::{
    advance_or_stop, CorrelationToken, Dispatch, LinkSender, LinkTarget, StateId, WorkingState,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// How long `stop_actor` waits for a task to drain before aborting it
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Where the current hop came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopEntry {
    /// Point-to-point delivery to one of the actor's state ids
    Linked { slot: StateId, target: LinkTarget },
    /// Broadcast heard on a listen channel
    Heard { channel: i32 },
}

impl fmt::Display for HopEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linked { slot, .. } => write!(f, "state {}", slot),
            Self::Heard { channel } => write!(f, "channel {}", channel),
        }
    }
}

/// Per-hop context handed to state logic
#[derive(Debug, Clone)]
pub struct HopContext {
    pub actor: ActorId,
    pub entry: HopEntry,
    pub token: CorrelationToken,
    bus: Arc<LinkBus>,
}

impl HopContext {
    /// The state id this hop entered, if it arrived point-to-point
    pub fn slot(&self) -> Option<StateId> {
        match self.entry {
            HopEntry::Linked { slot, .. } => Some(slot),
            HopEntry::Heard { .. } => None,
        }
    }

    /// Broadcast on `channel`, forwarding this hop's correlation token
    pub fn broadcast(&self, channel: i32, payload: impl Into<String>) -> usize {
        self.bus.broadcast(channel, payload, &self.token)
    }

    pub fn bus(&self) -> &Arc<LinkBus> {
        &self.bus
    }
}

/// What the actor does after state logic returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopOutcome {
    /// `advance_or_stop` with the system's link target
    Advance,
    /// `advance_or_stop` with an explicit link target
    AdvanceTo(LinkTarget),
    /// Send nothing; the pipeline waits for some other trigger
    Hold,
}

/// Supervision directive for error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorDirective {
    /// Drop the failed hop and keep processing
    Resume,
    /// Stop the actor and release its states
    Stop,
}

/// Local logic of one actor
#[async_trait]
pub trait StateBehavior: Send + 'static {
    /// State ids this actor answers for
    fn states(&self) -> Vec<StateId>;

    /// Broadcast channels this actor listens on
    fn channels(&self) -> Vec<i32> {
        Vec::new()
    }

    /// Process one hop, mutating the working state in place
    async fn on_state(&mut self, ctx: &HopContext, state: &mut WorkingState) -> Result<HopOutcome>;

    /// Called when actor starts
    async fn on_start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called before actor stops
    async fn on_stop(&mut self) -> Result<()> {
        Ok(())
    }

    /// Handle failure - return supervision directive
    async fn on_error(&mut self, _error: &ActorError) -> SupervisorDirective {
        SupervisorDirective::Resume
    }
}

/// System-wide hop counters
#[derive(Debug, Default)]
pub struct SystemMetrics {
    pub actors_spawned: AtomicU64,
    pub actors_stopped: AtomicU64,
    pub hops_processed: AtomicU64,
    pub hops_advanced: AtomicU64,
    pub terminal_stops: AtomicU64,
    pub holds: AtomicU64,
    pub handler_failures: AtomicU64,
    pub total_processing_time_ns: AtomicU64,
}

impl SystemMetrics {
    pub fn record_hop(&self, duration: Duration) {
        self.hops_processed.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .total_processing_time_ns
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
                Some(total.saturating_add(nanos))
            });
    }

    pub fn avg_processing_time_ns(&self) -> f64 {
        let count = self.hops_processed.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.total_processing_time_ns.load(Ordering::Relaxed) as f64 / count as f64
    }

    pub fn stats(&self) -> SystemStats {
        SystemStats {
            actors_spawned: self.actors_spawned.load(Ordering::Relaxed),
            actors_stopped: self.actors_stopped.load(Ordering::Relaxed),
            hops_processed: self.hops_processed.load(Ordering::Relaxed),
            hops_advanced: self.hops_advanced.load(Ordering::Relaxed),
            terminal_stops: self.terminal_stops.load(Ordering::Relaxed),
            holds: self.holds.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            avg_processing_time_ns: self.avg_processing_time_ns(),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemStats {
    pub actors_spawned: u64,
    pub actors_stopped: u64,
    pub hops_processed: u64,
    pub hops_advanced: u64,
    pub terminal_stops: u64,
    pub holds: u64,
    pub handler_failures: u64,
    pub avg_processing_time_ns: f64,
}

/// Core actor system managing actor lifecycles and hop dispatch
#[derive(Debug, Clone)]
pub struct ActorSystem {
    system_id: String,
    registry: Arc<StateRegistry>,
    bus: Arc<LinkBus>,
    tasks: Arc<Mutex<HashMap<ActorId, JoinHandle<()>>>>,
    metrics: Arc<SystemMetrics>,
    link_target: LinkTarget,
}

impl ActorSystem {
    /// Create new actor system
    pub fn new(name: impl Into<String>) -> Self {
        let system_id = name.into();
        info!(system_id = %system_id, "Creating actor system");

        let registry = Arc::new(StateRegistry::new());
        Self {
            system_id,
            bus: Arc::new(LinkBus::new(Arc::clone(&registry))),
            registry,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            metrics: Arc::new(SystemMetrics::default()),
            link_target: LinkTarget::default(),
        }
    }

    /// Link target used for `HopOutcome::Advance` and `inject`
    pub fn with_link_target(mut self, target: LinkTarget) -> Self {
        self.link_target = target;
        self
    }

    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    pub fn link_target(&self) -> LinkTarget {
        self.link_target
    }

    /// Spawn an actor: claim its states, register its listen channels and
    /// start its task
    pub async fn spawn<B>(&self, behavior: B) -> Result<ActorId>
    where
        B: StateBehavior,
    {
        let states = behavior.states();
        let channels = behavior.channels();
        if states.is_empty() && channels.is_empty() {
            return Err(ActorError::configuration(
                "Actor owns no states and listens on no channels",
                Some("states"),
            ));
        }

        let actor_id = ActorId::new();
        let (sender, receiver) = mailbox();
        self.bus.attach(actor_id.clone(), sender);
        if let Err(e) = self.registry.claim(&actor_id, &states) {
            self.bus.detach(&actor_id);
            return Err(e);
        }
        for channel in &channels {
            self.bus.listen(*channel, actor_id.clone());
        }

        let task = ActorTask {
            id: actor_id.clone(),
            behavior: Box::new(behavior),
            receiver,
            bus: Arc::clone(&self.bus),
            metrics: Arc::clone(&self.metrics),
            link_target: self.link_target,
        };
        let handle = tokio::spawn(task.run());
        self.tasks.lock().insert(actor_id.clone(), handle);
        self.metrics.actors_spawned.fetch_add(1, Ordering::Relaxed);

        info!(
            actor_id = %actor_id,
            system_id = %self.system_id,
            actor_type = std::any::type_name::<B>(),
            states = ?states,
            channels = ?channels,
            "Actor spawned"
        );
        Ok(actor_id)
    }

    /// Deliver `raw` to the owner of `slot`, starting a pipeline there
    ///
    /// `raw` is what the owner decodes, so its head is the hop after `slot`.
    pub fn inject(&self, slot: StateId, raw: impl Into<String>, token: &CorrelationToken) -> Result<()> {
        if self.registry.owner(slot).is_none() {
            return Err(ActorError::UnknownState { state: slot });
        }
        self.bus.send_linked(self.link_target, slot, raw.into(), token);
        Ok(())
    }

    /// Start a pipeline from a full message whose head is the first hop
    pub fn start(&self, raw: &str, token: &CorrelationToken) -> Result<Dispatch> {
        let state = WorkingState::decode(raw);
        if let Some(slot) = state.next_state() {
            if self.registry.owner(slot).is_none() {
                return Err(ActorError::UnknownState { state: slot });
            }
        }
        Ok(advance_or_stop(&state, self.link_target, token, &*self.bus))
    }

    /// Broadcast to every listener of `channel`
    pub fn broadcast(&self, channel: i32, payload: impl Into<String>, token: &CorrelationToken) -> usize {
        self.bus.broadcast(channel, payload, token)
    }

    /// Stop an actor: close its mailbox, release its states and wait for the
    /// queued hops to drain
    pub async fn stop_actor(&self, actor_id: &ActorId) -> Result<()> {
        let handle = self.tasks.lock().remove(actor_id);
        let Some(mut handle) = handle else {
            warn!(actor_id = %actor_id, "Attempted to stop unknown actor");
            return Err(ActorError::UnknownActor {
                actor: actor_id.clone(),
            });
        };

        debug!(actor_id = %actor_id, "Stopping actor");
        self.bus.detach(actor_id);
        self.registry.release(actor_id);

        match tokio::time::timeout(STOP_GRACE_PERIOD, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(actor_id = %actor_id, error = %e, "Actor task finished with error"),
            Err(_) => {
                warn!(actor_id = %actor_id, "Actor did not drain in time, aborting");
                handle.abort();
            }
        }
        info!(actor_id = %actor_id, "Actor stopped and cleaned up");
        Ok(())
    }

    /// Stop every actor
    pub async fn shutdown(&self) -> Result<()> {
        info!(system_id = %self.system_id, "Shutting down actor system");

        let actor_ids = self.actors();
        let stops: Vec<_> = actor_ids.iter().map(|id| self.stop_actor(id)).collect();
        for (id, result) in actor_ids.iter().zip(futures::future::join_all(stops).await) {
            if let Err(e) = result {
                warn!(actor_id = %id, error = %e, "Error stopping actor");
            }
        }

        info!(system_id = %self.system_id, "Actor system shutdown complete");
        Ok(())
    }

    /// Actors with a live task handle
    ///
    /// Tasks that ended on their own (a `Stop` directive or a failed
    /// `on_start`) are pruned here.
    pub fn actors(&self) -> Vec<ActorId> {
        let mut tasks = self.tasks.lock();
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.keys().cloned().collect()
    }

    pub fn metrics(&self) -> Arc<SystemMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }

    pub fn bus(&self) -> &Arc<LinkBus> {
        &self.bus
    }
}

struct ActorTask {
    id: ActorId,
    behavior: Box<dyn StateBehavior>,
    receiver: MailboxReceiver,
    bus: Arc<LinkBus>,
    metrics: Arc<SystemMetrics>,
    link_target: LinkTarget,
}

impl ActorTask {
    async fn run(mut self) {
        let task_start = Instant::now();

        if let Err(e) = self.behavior.on_start().await {
            error!(actor_id = %self.id, error = %e, "Actor failed to start");
            self.release();
            return;
        }
        debug!(actor_id = %self.id, "Actor started, entering hop loop");

        while let Some(delivery) = self.receiver.recv().await {
            let (ctx, mut state) = self.enter(delivery);
            let start = Instant::now();

            let outcome = self.behavior.on_state(&ctx, &mut state).await;
            self.metrics.record_hop(start.elapsed());

            match outcome {
                Ok(outcome) => self.complete(&ctx, &state, outcome),
                Err(e) => {
                    self.metrics.handler_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        actor_id = %self.id,
                        entry = %ctx.entry,
                        error = %e,
                        error_category = e.category(),
                        "State logic failed"
                    );
                    match self.behavior.on_error(&e).await {
                        SupervisorDirective::Resume => continue,
                        SupervisorDirective::Stop => {
                            warn!(actor_id = %self.id, entry = %ctx.entry, "Stopping actor after failure");
                            break;
                        }
                    }
                }
            }
        }

        if let Err(e) = self.behavior.on_stop().await {
            error!(actor_id = %self.id, error = %e, "Actor failed to stop cleanly");
        }
        self.release();
        info!(
            actor_id = %self.id,
            total_runtime_ms = task_start.elapsed().as_millis(),
            "Actor task completed"
        );
    }

    fn enter(&self, delivery: Delivery) -> (HopContext, WorkingState) {
        let (entry, state, token) = match delivery {
            Delivery::Linked {
                slot,
                target,
                payload,
                token,
            } => (
                HopEntry::Linked { slot, target },
                WorkingState::decode(&payload),
                token,
            ),
            Delivery::Heard {
                channel,
                payload,
                token,
            } => (
                HopEntry::Heard { channel },
                WorkingState::decode_listen(&payload),
                token,
            ),
        };
        let ctx = HopContext {
            actor: self.id.clone(),
            entry,
            token,
            bus: Arc::clone(&self.bus),
        };
        (ctx, state)
    }

    fn complete(&self, ctx: &HopContext, state: &WorkingState, outcome: HopOutcome) {
        let target = match outcome {
            HopOutcome::Advance => self.link_target,
            HopOutcome::AdvanceTo(target) => target,
            HopOutcome::Hold => {
                self.metrics.holds.fetch_add(1, Ordering::Relaxed);
                debug!(actor_id = %self.id, entry = %ctx.entry, "Holding, nothing dispatched");
                return;
            }
        };

        match advance_or_stop(state, target, &ctx.token, &*self.bus) {
            Dispatch::Sent { slot } => {
                self.metrics.hops_advanced.fetch_add(1, Ordering::Relaxed);
                debug!(actor_id = %self.id, entry = %ctx.entry, next = %slot, "Advanced");
            }
            Dispatch::Stopped => {
                self.metrics.terminal_stops.fetch_add(1, Ordering::Relaxed);
                debug!(actor_id = %self.id, entry = %ctx.entry, "Pipeline reached terminal hop");
            }
        }
    }

    /// Leave the bus and the namespace; idempotent with `stop_actor`
    fn release(&self) {
        self.metrics.actors_stopped.fetch_add(1, Ordering::Relaxed);
        self.bus.detach(&self.id);
        self.bus.registry().release(&self.id);
    }
}
