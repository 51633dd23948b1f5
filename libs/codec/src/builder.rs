//! # Message Builder - Validated Construction of Outbound Messages
//!
//! ## Purpose
//!
//! Fluent builder for the first message of a pipeline, or for any message
//! assembled outside a running hop. Unlike the stack operations on
//! [`crate::WorkingState`], the builder validates what it is given: a zero or
//! reserved state id and a data value containing `|` are reported at
//! [`MessageBuilder::build`] instead of silently corrupting the next decode.
//!
//! ```
//! use linkchain_codec::MessageBuilder;
//!
//! let wire = MessageBuilder::new()
//!     .then(10)
//!     .then(12)
//!     .then(11)
//!     .arg("data 1")
//!     .arg("")
//!     .arg("data 3")
//!     .build()
//!     .unwrap();
//! assert_eq!(wire, "10+12+11|data 1||data 3");
//! ```

use crate::control::{ControlSequence, StateId};
use crate::data_stack::{validate_element, DataStack};
use crate::error::{WireError, WireResult};
use crate::message::Message;

/// Builder for validated linkchain messages
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    control: Vec<i32>,
    args: Vec<String>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hop to the control sequence
    pub fn then(mut self, state: impl Into<i32>) -> Self {
        self.control.push(state.into());
        self
    }

    /// Append several hops in order
    pub fn then_all<I>(mut self, states: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<i32>,
    {
        self.control.extend(states.into_iter().map(Into::into));
        self
    }

    /// Append an argument below the ones already added (the first `arg` ends up
    /// on top of the stack)
    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push(value.to_string());
        self
    }

    pub fn args<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.args.extend(values.into_iter().map(|v| v.to_string()));
        self
    }

    /// Validate and assemble the typed message
    pub fn build_message(self) -> WireResult<Message> {
        let control = ControlSequence::from_raw(self.control)?;
        let data = DataStack::from_elements(self.args)?;
        Ok(Message::new(control, data))
    }

    /// Validate and encode as `CONTROL|DATA`
    pub fn build(self) -> WireResult<String> {
        self.build_message().map(|message| message.to_wire())
    }
}

/// Check a free-form value against both separators, for callers that embed
/// values in control text (e.g. list elements later split on `+`)
pub fn validate_control_safe(value: &str) -> WireResult<()> {
    validate_element(value)?;
    if value.contains(crate::constants::CONTROL_SEPARATOR) {
        return Err(WireError::reserved_in_control(
            crate::constants::CONTROL_SEPARATOR,
            value,
        ));
    }
    Ok(())
}

impl From<StateId> for MessageBuilder {
    /// Start a builder whose first hop is `state`
    fn from(state: StateId) -> Self {
        Self::new().then(state)
    }
}
