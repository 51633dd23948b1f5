//! Actor runtime for linkchain pipelines
//!
//! Hosts state actors in one process and gives the codec the two primitives it
//! assumes from its host: a point-to-point send addressed by state id, and
//! broadcast/listen on numeric channels.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐       ┌──────────────────────────┐
//! │     ActorSystem      │       │         LinkBus          │
//! │                      │ send  │                          │
//! │  ┌────────────────┐  │──────►│  StateRegistry lookup    │
//! │  │ actor (10, 12) │  │       │  slot ──► owning actor   │
//! │  └────────────────┘  │◄──────│  mailbox (unbounded)     │
//! │  ┌────────────────┐  │       │                          │
//! │  │ actor (11)     │  │◄──────│  channel ──► listeners   │
//! │  └────────────────┘  │ heard │                          │
//! └──────────────────────┘       └──────────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use linkchain_actors::{ActorSystem, HopContext, HopOutcome, Result, StateBehavior};
//! use linkchain_codec::{CorrelationToken, StateId, WorkingState};
//!
//! struct Greeter;
//!
//! #[async_trait]
//! impl StateBehavior for Greeter {
//!     fn states(&self) -> Vec<StateId> {
//!         StateId::new(7).into_iter().collect()
//!     }
//!
//!     async fn on_state(&mut self, _ctx: &HopContext, state: &mut WorkingState) -> Result<HopOutcome> {
//!         let name = state.pop();
//!         state.push(format!("hello {name}"));
//!         Ok(HopOutcome::Advance)
//!     }
//! }
//!
//! # async fn run() -> Result<()> {
//! let system = ActorSystem::new("demo");
//! system.spawn(Greeter).await?;
//! let slot = StateId::new(7).expect("non-zero");
//! system.inject(slot, "|world", &CorrelationToken::new("req-1"))?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod registry;
pub mod system;
pub mod transport;

pub use error::{ActorError, Result};
pub use registry::{ActorId, StateRegistry};
pub use system::{
    ActorSystem, HopContext, HopEntry, HopOutcome, StateBehavior, SupervisorDirective,
    SystemMetrics, SystemStats, STOP_GRACE_PERIOD,
};
pub use transport::{mailbox, BusMetrics, BusStats, Delivery, LinkBus, MailboxReceiver, MailboxSender};
