//! # Message Codec
//!
//! ## Purpose
//!
//! Composes the control and data codecs around the first top-level `|`:
//!
//! ```text
//! CONTROL|DATA
//! CONTROL = s1+s2+...+sn   (non-zero integers, or empty)
//! DATA    = d1|d2|...|dm   (possibly-empty strings, or empty)
//! ```
//!
//! A message without any `|` is all control with an empty data stack.
//! [`Message`] is the strict, fully typed form; running actors decode into a
//! [`crate::WorkingState`] instead, which never fails.

use crate::constants::DATA_SEPARATOR;
use crate::control::ControlSequence;
use crate::data_stack::DataStack;
use crate::error::WireResult;
use std::fmt;
use std::str::FromStr;

/// Split raw wire text at its first `|` into control text and data text
///
/// Returns `None` for the data part when no separator is present, so callers
/// can tell `"7"` (no separator) from `"7|"` (explicit empty data).
pub fn split_message(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once(DATA_SEPARATOR) {
        Some((control, data)) => (control, Some(data)),
        None => (raw, None),
    }
}

/// A fully parsed message: pending hops plus carried arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Message {
    pub control: ControlSequence,
    pub data: DataStack,
}

impl Message {
    pub fn new(control: ControlSequence, data: DataStack) -> Self {
        Self { control, data }
    }

    /// Strict parse; fails on a zero or non-numeric control element
    pub fn parse(raw: &str) -> WireResult<Self> {
        let (control, data) = split_message(raw);
        Ok(Self {
            control: ControlSequence::parse(control)?,
            data: data.map(DataStack::from_wire).unwrap_or_default(),
        })
    }

    /// Encode as `CONTROL|DATA`; the separator is always written
    pub fn to_wire(&self) -> String {
        format!(
            "{}{}{}",
            self.control.to_wire(),
            DATA_SEPARATOR,
            self.data.to_wire()
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl FromStr for Message {
    type Err = crate::error::WireError;

    fn from_str(raw: &str) -> WireResult<Self> {
        Self::parse(raw)
    }
}
