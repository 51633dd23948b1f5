//! Dry-run a pipeline against a configuration
//!
//! Every configured actor is replaced by a tracer that logs the hop and
//! advances unchanged, so the run shows the route a message takes through the
//! namespace without any real state logic.

use anyhow::{bail, Result};
use async_trait::async_trait;
use linkchain_actors::{ActorSystem, HopContext, HopEntry, HopOutcome, StateBehavior};
use linkchain_codec::{CorrelationToken, StateId, WorkingState};
use linkchain_config::{defaults, ChainConfig};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::info;

/// One hop seen by a tracer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracedHop {
    pub actor: String,
    pub entry: HopEntry,
    pub next: i32,
    pub data: String,
}

/// How the traced pipeline ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEnd {
    /// A hop with `next == 0` was reached
    Terminal,
    /// A hop was sent to a slot no actor owns
    Dropped,
}

#[derive(Debug)]
pub struct TraceReport {
    pub hops: Vec<TracedHop>,
    pub end: TraceEnd,
}

struct Tracer {
    name: String,
    states: Vec<StateId>,
    channels: Vec<i32>,
    hops: mpsc::UnboundedSender<TracedHop>,
}

#[async_trait]
impl StateBehavior for Tracer {
    fn states(&self) -> Vec<StateId> {
        self.states.clone()
    }

    fn channels(&self) -> Vec<i32> {
        self.channels.clone()
    }

    async fn on_state(
        &mut self,
        ctx: &HopContext,
        state: &mut WorkingState,
    ) -> linkchain_actors::Result<HopOutcome> {
        info!(
            actor = %self.name,
            entry = %ctx.entry,
            next = state.next(),
            data = %state.data(),
            "Hop"
        );
        let _ = self.hops.send(TracedHop {
            actor: self.name.clone(),
            entry: ctx.entry.clone(),
            next: state.next(),
            data: state.data().to_string(),
        });
        Ok(HopOutcome::Advance)
    }
}

/// Inject `message` at `slot` and wait for the pipeline to stop
pub async fn run_trace(
    config: &ChainConfig,
    slot: StateId,
    message: &str,
    timeout: Duration,
) -> Result<TraceReport> {
    let assignments = config.validate()?;
    let system = ActorSystem::new(defaults::runtime::DEFAULT_SYSTEM_NAME)
        .with_link_target(config.global.link_target);

    let (tx, mut rx) = mpsc::unbounded_channel();
    for (actor, states) in &assignments.actors {
        system
            .spawn(Tracer {
                name: actor.clone(),
                states: states.clone(),
                channels: assignments.channels_of(actor).to_vec(),
                hops: tx.clone(),
            })
            .await?;
    }
    drop(tx);

    system.inject(slot, message, &CorrelationToken::new("linkctl-trace"))?;

    let metrics = system.metrics();
    let bus_metrics = system.bus().metrics();
    let deadline = Instant::now() + timeout;
    let end = loop {
        if metrics.stats().terminal_stops > 0 {
            break TraceEnd::Terminal;
        }
        if bus_metrics.stats().dropped() > 0 {
            break TraceEnd::Dropped;
        }
        if Instant::now() >= deadline {
            system.shutdown().await?;
            bail!("Pipeline did not stop within {:?}", timeout);
        }
        sleep(Duration::from_millis(5)).await;
    };

    system.shutdown().await?;

    let mut hops = Vec::new();
    while let Ok(hop) = rx.try_recv() {
        hops.push(hop);
    }
    Ok(TraceReport { hops, end })
}
