//! Multi-actor pipelines over the in-process link bus

use async_trait::async_trait;
use linkchain_actors::{
    ActorError, ActorSystem, HopContext, HopEntry, HopOutcome, Result, StateBehavior,
    SupervisorDirective,
};
use linkchain_codec::{lenient_int, CorrelationToken, StateId, WorkingState};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

fn id(raw: i32) -> StateId {
    StateId::new(raw).expect("non-zero test id")
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !condition() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Pops two integers, pushes their sum
struct Adder;

#[async_trait]
impl StateBehavior for Adder {
    fn states(&self) -> Vec<StateId> {
        vec![id(10)]
    }

    async fn on_state(&mut self, _ctx: &HopContext, state: &mut WorkingState) -> Result<HopOutcome> {
        let a = lenient_int(&state.pop());
        let b = lenient_int(&state.pop());
        state.push(a + b);
        Ok(HopOutcome::Advance)
    }
}

/// Doubles the top of the stack
struct Doubler;

#[async_trait]
impl StateBehavior for Doubler {
    fn states(&self) -> Vec<StateId> {
        vec![id(12)]
    }

    async fn on_state(&mut self, _ctx: &HopContext, state: &mut WorkingState) -> Result<HopOutcome> {
        let value = lenient_int(&state.pop());
        state.push(value * 2);
        Ok(HopOutcome::Advance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Collected {
    entry: HopEntry,
    next: i32,
    data: String,
    token: CorrelationToken,
}

/// Reports every hop it sees, then advances or holds
struct Collector {
    states: Vec<StateId>,
    channels: Vec<i32>,
    outcome: HopOutcome,
    seen: mpsc::UnboundedSender<Collected>,
}

impl Collector {
    fn at(state: i32, seen: mpsc::UnboundedSender<Collected>) -> Self {
        Self {
            states: vec![id(state)],
            channels: Vec::new(),
            outcome: HopOutcome::Advance,
            seen,
        }
    }
}

#[async_trait]
impl StateBehavior for Collector {
    fn states(&self) -> Vec<StateId> {
        self.states.clone()
    }

    fn channels(&self) -> Vec<i32> {
        self.channels.clone()
    }

    async fn on_state(&mut self, ctx: &HopContext, state: &mut WorkingState) -> Result<HopOutcome> {
        let _ = self.seen.send(Collected {
            entry: ctx.entry.clone(),
            next: state.next(),
            data: state.data().to_string(),
            token: ctx.token.clone(),
        });
        Ok(self.outcome)
    }
}

/// Fails on "bad", forwards anything else
struct Picky {
    directive: SupervisorDirective,
}

#[async_trait]
impl StateBehavior for Picky {
    fn states(&self) -> Vec<StateId> {
        vec![id(30)]
    }

    async fn on_state(&mut self, ctx: &HopContext, state: &mut WorkingState) -> Result<HopOutcome> {
        if state.peek() == "bad" {
            return Err(ActorError::handler(ctx.entry.to_string(), "refusing bad input"));
        }
        Ok(HopOutcome::Advance)
    }

    async fn on_error(&mut self, _error: &ActorError) -> SupervisorDirective {
        self.directive
    }
}

#[tokio::test]
async fn test_three_actor_pipeline() {
    let system = ActorSystem::new("pipeline");
    let (tx, mut rx) = mpsc::unbounded_channel();
    system.spawn(Adder).await.unwrap();
    system.spawn(Doubler).await.unwrap();
    system.spawn(Collector::at(11, tx)).await.unwrap();

    let token = CorrelationToken::new("req-42");
    system.inject(id(10), "12+11|3|4", &token).unwrap();

    let seen = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    assert_eq!(
        seen,
        Collected {
            entry: HopEntry::Linked {
                slot: id(11),
                target: system.link_target(),
            },
            next: 0,
            data: "14".to_string(),
            token,
        }
    );

    let metrics = system.metrics();
    wait_until(|| metrics.stats().terminal_stops == 1).await;
    let stats = metrics.stats();
    assert_eq!(stats.hops_processed, 3);
    assert_eq!(stats.hops_advanced, 2);
    assert_eq!(system.bus().metrics().stats().dropped(), 0);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_start_routes_on_message_head() {
    let system = ActorSystem::new("start");
    let (tx, mut rx) = mpsc::unbounded_channel();
    system.spawn(Doubler).await.unwrap();
    system.spawn(Collector::at(11, tx)).await.unwrap();

    system.start("12+11|21", &CorrelationToken::default()).unwrap();

    let seen = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    assert_eq!(seen.data, "42");
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_overlapping_states_are_rejected() {
    let system = ActorSystem::new("dupes");
    let first = system.spawn(Adder).await.unwrap();

    let err = system.spawn(Adder).await.unwrap_err();
    match err {
        ActorError::DuplicateState { state, owner } => {
            assert_eq!(state, id(10));
            assert_eq!(owner, first);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(system.bus().attached(), 1);
    assert_eq!(system.actors().len(), 1);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_inject_to_unowned_slot_fails() {
    let system = ActorSystem::new("unknown");
    let err = system
        .inject(id(77), "|x", &CorrelationToken::default())
        .unwrap_err();
    assert!(matches!(err, ActorError::UnknownState { state } if state == id(77)));
    assert!(system.start("77|x", &CorrelationToken::default()).is_err());
}

#[tokio::test]
async fn test_hop_to_unowned_slot_is_dropped() {
    let system = ActorSystem::new("drops");
    system.spawn(Doubler).await.unwrap();

    // Doubler forwards to 99, which nobody owns
    system.inject(id(12), "99|5", &CorrelationToken::default()).unwrap();

    let metrics = system.metrics();
    wait_until(|| metrics.stats().hops_advanced == 1).await;
    assert_eq!(system.bus().metrics().stats().dropped_unowned, 1);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_listener_hears_broadcast_and_holds() {
    let system = ActorSystem::new("listen");
    let (tx, mut rx) = mpsc::unbounded_channel();
    system
        .spawn(Collector {
            states: Vec::new(),
            channels: vec![-7001],
            outcome: HopOutcome::Hold,
            seen: tx,
        })
        .await
        .unwrap();

    let reached = system.broadcast(-7001, "-7001+5|ping", &CorrelationToken::new("b"));
    assert_eq!(reached, 1);

    let seen = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    assert_eq!(seen.entry, HopEntry::Heard { channel: -7001 });
    assert_eq!(seen.next, 5);
    assert_eq!(seen.data, "ping");

    let metrics = system.metrics();
    wait_until(|| metrics.stats().holds == 1).await;
    assert_eq!(system.bus().metrics().stats().linked_sends, 0);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_broadcast_joins_linked_pipeline() {
    let system = ActorSystem::new("listen-advance");
    let (listener_tx, mut listener_rx) = mpsc::unbounded_channel();
    let (sink_tx, mut sink_rx) = mpsc::unbounded_channel();
    system
        .spawn(Collector {
            states: Vec::new(),
            channels: vec![3],
            outcome: HopOutcome::Advance,
            seen: listener_tx,
        })
        .await
        .unwrap();
    system.spawn(Collector::at(11, sink_tx)).await.unwrap();

    system.broadcast(3, "3+11|hello", &CorrelationToken::default());

    let heard = timeout(Duration::from_secs(2), listener_rx.recv()).await.unwrap().unwrap();
    assert_eq!(heard.next, 11);
    let sunk = timeout(Duration::from_secs(2), sink_rx.recv()).await.unwrap().unwrap();
    assert_eq!(sunk.data, "hello");
    assert!(matches!(sunk.entry, HopEntry::Linked { slot, .. } if slot == id(11)));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_hop_resumes_by_default() {
    let system = ActorSystem::new("resume");
    let (tx, mut rx) = mpsc::unbounded_channel();
    system
        .spawn(Picky {
            directive: SupervisorDirective::Resume,
        })
        .await
        .unwrap();
    system.spawn(Collector::at(11, tx)).await.unwrap();

    let token = CorrelationToken::default();
    system.inject(id(30), "11|bad", &token).unwrap();
    system.inject(id(30), "11|good", &token).unwrap();

    let seen = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    assert_eq!(seen.data, "good");
    assert_eq!(system.metrics().stats().handler_failures, 1);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stop_directive_releases_states() {
    let system = ActorSystem::new("stop");
    let actor = system
        .spawn(Picky {
            directive: SupervisorDirective::Stop,
        })
        .await
        .unwrap();
    assert_eq!(system.actors(), vec![actor]);

    system.inject(id(30), "|bad", &CorrelationToken::default()).unwrap();

    let registry = std::sync::Arc::clone(system.registry());
    wait_until(|| registry.owner(id(30)).is_none()).await;
    let stats = system.metrics().stats();
    assert_eq!(stats.handler_failures, 1);
    assert_eq!(stats.actors_stopped, 1);
    assert!(system.inject(id(30), "|again", &CorrelationToken::default()).is_err());

    wait_until(|| system.actors().is_empty()).await;
}

#[tokio::test]
async fn test_stop_actor_releases_states() {
    let system = ActorSystem::new("stop-actor");
    let actor = system.spawn(Adder).await.unwrap();

    system.stop_actor(&actor).await.unwrap();
    assert_eq!(system.registry().owner(id(10)), None);
    assert_eq!(system.bus().attached(), 0);
    assert!(system.actors().is_empty());

    let err = system.stop_actor(&actor).await.unwrap_err();
    assert!(matches!(err, ActorError::UnknownActor { .. }));

    // the id is free again
    system.spawn(Adder).await.unwrap();
    system.shutdown().await.unwrap();
}
