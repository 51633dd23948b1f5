//! # Hop Dispatch
//!
//! ## Purpose
//!
//! Hands the mutated [`WorkingState`] to the host's point-to-point send
//! primitive, or does nothing when the pipeline has reached its terminal hop.
//! The send primitive is abstracted as [`LinkSender`]; this crate never knows
//! how, or whether, the payload is delivered.
//!
//! ## Delivery Model
//!
//! - No acknowledgement, retry or timeout. A lost payload stalls the pipeline
//!   until something outside this crate notices.
//! - No ordering between independently triggered sends.
//! - The correlation token is forwarded untouched.

use crate::control::StateId;
use crate::state::WorkingState;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Routing scope handed to the send primitive alongside the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTarget {
    /// Only the sender's own unit
    #[default]
    This,
    /// Every unit in the set
    Set,
    /// The root unit
    Root,
    /// Every unit except the sender
    AllOthers,
    /// Every unit except the root
    AllChildren,
    /// One numbered unit
    Link(i32),
}

/// Opaque value passed through every hop unexamined
///
/// Callers use it to match requests with responses; the codec only copies it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The host's point-to-point send primitive
///
/// Implementations must not block on delivery and have no way to report
/// failure back to the dispatching actor.
pub trait LinkSender {
    fn send_linked(
        &self,
        target: LinkTarget,
        slot: StateId,
        payload: String,
        token: &CorrelationToken,
    );
}

impl<S: LinkSender + ?Sized> LinkSender for &S {
    fn send_linked(&self, target: LinkTarget, slot: StateId, payload: String, token: &CorrelationToken) {
        (**self).send_linked(target, slot, payload, token)
    }
}

impl<S: LinkSender + ?Sized> LinkSender for Arc<S> {
    fn send_linked(&self, target: LinkTarget, slot: StateId, payload: String, token: &CorrelationToken) {
        (**self).send_linked(target, slot, payload, token)
    }
}

/// What [`advance_or_stop`] did; says nothing about delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Payload handed to the sender for `slot`
    Sent { slot: StateId },
    /// `next` was 0, nothing was sent
    Stopped,
}

/// Send the encoded state to its next hop, or stop if it is terminal
///
/// The payload is `rest|data`; the routing slot is `next`.
pub fn advance_or_stop<S>(
    state: &WorkingState,
    target: LinkTarget,
    token: &CorrelationToken,
    sender: &S,
) -> Dispatch
where
    S: LinkSender + ?Sized,
{
    let Some(slot) = state.next_state() else {
        trace!("Terminal hop reached, nothing to dispatch");
        return Dispatch::Stopped;
    };

    let payload = state.encode();
    trace!(slot = %slot, target = ?target, payload = %payload, "Dispatching to next hop");
    sender.send_linked(target, slot, payload, token);
    Dispatch::Sent { slot }
}

/// One send captured by [`RecordingSender`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentHop {
    pub target: LinkTarget,
    pub slot: StateId,
    pub payload: String,
    pub token: CorrelationToken,
}

/// In-memory [`LinkSender`] that records every send, for exercising state
/// logic without a transport
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SentHop>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far
    pub fn take(&self) -> Vec<SentHop> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

impl LinkSender for RecordingSender {
    fn send_linked(&self, target: LinkTarget, slot: StateId, payload: String, token: &CorrelationToken) {
        self.sent.lock().push(SentHop {
            target,
            slot,
            payload,
            token: token.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_sends_rest_and_data_to_next() {
        let sender = RecordingSender::new();
        let state = WorkingState::decode("10+12+11|data 1||data 3");
        let token = CorrelationToken::new("req-1");

        let outcome = advance_or_stop(&state, LinkTarget::This, &token, &sender);

        let slot = StateId::new(10).unwrap();
        assert_eq!(outcome, Dispatch::Sent { slot });
        let sent = sender.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].slot, slot);
        assert_eq!(sent[0].payload, "12+11|data 1||data 3");
        assert_eq!(sent[0].token, token);
        assert_eq!(sent[0].target, LinkTarget::This);
    }

    #[test]
    fn test_terminal_state_is_noop() {
        let sender = RecordingSender::new();
        let state = WorkingState::decode("0|a|b");
        let outcome = advance_or_stop(&state, LinkTarget::Set, &CorrelationToken::default(), &sender);
        assert_eq!(outcome, Dispatch::Stopped);
        assert!(sender.is_empty());
    }

    #[test]
    fn test_sender_through_arc_and_reference() {
        let sender = Arc::new(RecordingSender::new());
        let state = WorkingState::decode("3|x");
        advance_or_stop(&state, LinkTarget::Link(2), &CorrelationToken::default(), &sender);
        advance_or_stop(&state, LinkTarget::Link(2), &CorrelationToken::default(), &&*sender);
        assert_eq!(sender.len(), 2);
    }
}
