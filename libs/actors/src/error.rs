//! Actor runtime errors
//!
//! Errors raised while wiring actors to the link bus or while running state
//! logic. Delivery failures are deliberately absent: the send primitive has no
//! way to report them, so the bus only counts and logs dropped payloads.

use crate::registry::ActorId;
use linkchain_codec::{StateId, WireError};
use thiserror::Error;

/// Main actor runtime error type
#[derive(Error, Debug)]
pub enum ActorError {
    /// Two actors tried to own the same state id
    #[error("State {state} is already owned by {owner}")]
    DuplicateState { state: StateId, owner: ActorId },

    /// No actor owns the requested state id
    #[error("No actor owns state {state}")]
    UnknownState { state: StateId },

    /// Actor id is not registered with this system
    #[error("Unknown actor {actor}")]
    UnknownActor { actor: ActorId },

    /// The actor's mailbox is gone (actor stopped)
    #[error("Mailbox closed for {actor}")]
    MailboxClosed { actor: ActorId },

    /// State logic reported a failure while processing a hop
    #[error("State logic failed in {entry}: {message}")]
    Handler { entry: String, message: String },

    /// Invalid runtime configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// Strict wire validation failed
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),
}

/// Result type alias for actor runtime operations
pub type Result<T> = std::result::Result<T, ActorError>;

impl ActorError {
    /// Create a state logic failure
    pub fn handler(entry: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            entry: entry.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }

    /// Short category label for structured logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::DuplicateState { .. } | Self::UnknownState { .. } => "registry",
            Self::UnknownActor { .. } | Self::MailboxClosed { .. } => "lifecycle",
            Self::Handler { .. } => "state_logic",
            Self::Configuration { .. } => "configuration",
            Self::Wire(_) => "wire",
        }
    }
}
