//! # Working State - Per-Hop Decode and Encode
//!
//! ## Purpose
//!
//! [`WorkingState`] is the single value an actor owns while it processes one
//! inbound message. It is created by [`WorkingState::decode`] (or
//! [`WorkingState::decode_listen`] for the listener entry point), mutated in
//! place by the data and control stack operations, and consumed by
//! [`crate::advance_or_stop`], which ships [`WorkingState::encode`] to the
//! next hop.
//!
//! ## Fields
//!
//! - `next`: head of the control sequence, `0` when terminal
//! - `rest`: control text after the head
//! - `seq`: control text including the head
//! - `data`: data stack text
//! - `channel`: routing id, only set on the listener path
//!
//! Invariant: whenever `next != 0`, `seq` is `next` joined to `rest` with `+`
//! (just `next` when `rest` is empty). Every mutating operation preserves it.
//!
//! ## Leniency
//!
//! Decoding never fails. A non-numeric or empty head becomes `0`, which makes
//! the message terminal. Callers cannot tell a corrupt head from an intended
//! stop; use [`crate::Message::parse`] when that distinction matters.

mod control_ops;
mod data_ops;

use crate::cast::lenient_int;
use crate::constants::{DATA_SEPARATOR, TERMINAL};
use crate::control::{join_control, split_head, StateId};
use crate::data_stack::DataStack;
use crate::message::{split_message, Message};
use std::fmt;
use tracing::debug;

/// Mutable per-message view of control and data, owned by one actor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingState {
    next: i32,
    rest: String,
    seq: String,
    data: String,
    channel: Option<i32>,
}

impl WorkingState {
    /// Decode a message received on the point-to-point (linked) entry point
    ///
    /// The routing slot the message arrived on is not part of the text: it
    /// was the sender's `next`. The head of the text is therefore the hop
    /// *after* this one.
    pub fn decode(raw: &str) -> Self {
        let (control, data) = split_message(raw);
        let (head, rest) = split_head(control);

        let next = if head.is_empty() {
            TERMINAL
        } else {
            lenient_int(head)
        };
        if next == TERMINAL && !head.is_empty() && head != "0" {
            debug!(head = %head, "Control head is not a state id, treating message as terminal");
        }

        // Terminal messages keep their control text verbatim; empty stays empty
        let seq = if next == TERMINAL {
            control.to_string()
        } else {
            join_control(&next.to_string(), rest)
        };

        Self {
            next,
            rest: rest.to_string(),
            seq,
            data: data.unwrap_or_default().to_string(),
            channel: None,
        }
    }

    /// Decode a message heard on a listen channel
    ///
    /// Listener messages carry their own destination: the head text names the
    /// routing channel (the state being entered), and the control proper
    /// starts after it. The channel is read from the same substring the linked
    /// path would read as `next`, which keeps existing senders compatible.
    pub fn decode_listen(raw: &str) -> Self {
        let mut state = Self::decode(raw);
        let (head, _) = split_head(split_message(raw).0);

        if head.is_empty() {
            state.channel = Some(TERMINAL);
            state.next = TERMINAL;
            return state;
        }

        state.channel = Some(lenient_int(head));
        state.pop_head();
        state
    }

    /// Build the working state a receiver would see for `message`
    pub fn from_message(message: &Message) -> Self {
        Self::decode(&message.to_wire())
    }

    /// Outbound text for the next hop: `rest|data`
    ///
    /// The head is dropped because it only selects the destination slot.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.rest, DATA_SEPARATOR, self.data)
    }

    /// Next state id, `0` when the pipeline ends here
    pub fn next(&self) -> i32 {
        self.next
    }

    pub fn next_state(&self) -> Option<StateId> {
        StateId::new(self.next)
    }

    pub fn is_terminal(&self) -> bool {
        self.next == TERMINAL
    }

    pub fn rest(&self) -> &str {
        &self.rest
    }

    pub fn seq(&self) -> &str {
        &self.seq
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Routing channel, only present for messages decoded on the listener path
    pub fn channel(&self) -> Option<i32> {
        self.channel
    }

    /// Typed copy of the current data stack
    pub fn data_stack(&self) -> DataStack {
        DataStack::from_wire(&self.data)
    }

    /// Recompute `seq` from `next` and `rest` after a control mutation
    fn resync_seq(&mut self) {
        self.seq = if self.next == TERMINAL {
            self.rest.clone()
        } else {
            join_control(&self.next.to_string(), &self.rest)
        };
    }
}

impl fmt::Display for WorkingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
