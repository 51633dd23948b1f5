//! # Linkchain Codec - Control/Data Stack Wire Protocol
//!
//! ## Purpose
//!
//! Independent state-machine actors share one narrow string channel with
//! unordered delivery. This crate encodes "what happens next" (an ordered trail
//! of state ids) and "what data travels with it" (an ordered stack of strings)
//! into a single string, decodes it on receipt, lets a state's local logic
//! rewrite both stacks, and dispatches the result to the next hop.
//!
//! ## Wire Format
//!
//! ```text
//! CONTROL|DATA
//! CONTROL = s1+s2+...+sn     non-zero integers, or empty
//! DATA    = d1|d2|...|dm     possibly-empty strings, or empty
//!
//! "10+12+11|data 1||data 3"  =>  control [10, 12, 11]
//!                                data    ["data 1", "", "data 3"]
//! ```
//!
//! ## Architecture Role
//!
//! ```text
//! inbound text ──► WorkingState::decode ──► state logic ──► advance_or_stop ──► LinkSender
//!                         │                 push/pop/peek          │
//!                         └── lenient: never fails                 └── rest|data to slot `next`
//! ```
//!
//! ## What This Crate Contains
//! - [`WorkingState`] with the data stack operations (`peek`, `pop`, `pop_or`,
//!   `pop_list`, `push`, `push_known_non_empty`) and the control operations
//!   (`push_head`, `append_tail`, `pop_head`, `replace_head`)
//! - [`advance_or_stop`] and the [`LinkSender`] abstraction of the host's
//!   send primitive
//! - Strict typed codecs: [`Message`], [`ControlSequence`], [`DataStack`],
//!   [`StateId`], plus the validating [`MessageBuilder`]
//!
//! ## What This Crate Does NOT Contain
//! - Transport, mailboxes or listener registration (see `linkchain-actors`)
//! - The state-id registry and its configuration (see `linkchain-config`)
//! - Escaping of `|` or `+` inside values: the format has none
//!
//! ## Failure Model
//!
//! The lenient path degrades instead of failing: a malformed head becomes `0`
//! (terminal), a missing element becomes `""`. [`WireError`] is only returned
//! by the strict constructors and parsers.

pub mod builder;
pub mod cast;
pub mod constants;
pub mod control;
pub mod data_stack;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod state;

pub use builder::{validate_control_safe, MessageBuilder};
pub use cast::lenient_int;
pub use constants::*;
pub use control::{split_head, ControlSequence, StateId};
pub use data_stack::{validate_element, DataStack};
pub use dispatch::{
    advance_or_stop, CorrelationToken, Dispatch, LinkSender, LinkTarget, RecordingSender, SentHop,
};
pub use error::{WireError, WireResult};
pub use message::{split_message, Message};
pub use state::WorkingState;
