//! # Control Sequence Codec
//!
//! ## Purpose
//!
//! Typed view of the "what happens next" half of a message: an ordered list of
//! non-zero state ids joined with `+`. The empty sequence encodes as the empty
//! string. `0` is the terminal sentinel and cannot be represented by
//! [`StateId`], so a well-typed sequence can never contain it.
//!
//! Running actors mostly work on the raw control text through
//! [`crate::WorkingState`]; this module is the strict counterpart used when
//! building messages, validating operator input and testing.

use crate::constants::CONTROL_SEPARATOR;
use crate::error::{WireError, WireResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroI32;
use std::str::FromStr;

/// Identifier of one state in the shared, globally agreed namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct StateId(NonZeroI32);

impl StateId {
    /// Wrap a raw id, returning `None` for the terminal sentinel `0`
    pub const fn new(raw: i32) -> Option<Self> {
        match NonZeroI32::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Raw integer value as carried on the wire
    pub const fn get(self) -> i32 {
        self.0.get()
    }
}

impl TryFrom<i32> for StateId {
    type Error = WireError;

    fn try_from(raw: i32) -> WireResult<Self> {
        Self::new(raw).ok_or(WireError::ZeroStateId { position: 0 })
    }
}

impl From<StateId> for i32 {
    fn from(id: StateId) -> Self {
        id.get()
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StateId {
    type Err = WireError;

    /// Strict parse: the whole text must be a non-zero decimal integer
    fn from_str(text: &str) -> WireResult<Self> {
        parse_element(text, 0)
    }
}

/// Split control text at its first `+` into head text and the remainder
///
/// The remainder is empty when there is no separator.
pub fn split_head(control: &str) -> (&str, &str) {
    control
        .split_once(CONTROL_SEPARATOR)
        .unwrap_or((control, ""))
}

/// Join `head` in front of `rest`, omitting the separator for an empty rest
pub(crate) fn join_control(head: &str, rest: &str) -> String {
    if rest.is_empty() {
        head.to_string()
    } else {
        format!("{head}{CONTROL_SEPARATOR}{rest}")
    }
}

fn parse_element(text: &str, position: usize) -> WireResult<StateId> {
    let raw: i32 = text
        .parse()
        .map_err(|_| WireError::invalid_state_id(text, position))?;
    StateId::new(raw).ok_or(WireError::ZeroStateId { position })
}

/// Ordered list of pending state ids; index 0 is the head
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ControlSequence {
    ids: Vec<StateId>,
}

impl ControlSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = StateId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Build from raw integers, rejecting the terminal sentinel
    pub fn from_raw(raw: impl IntoIterator<Item = i32>) -> WireResult<Self> {
        raw.into_iter()
            .enumerate()
            .map(|(position, value)| {
                StateId::new(value).ok_or(WireError::ZeroStateId { position })
            })
            .collect::<WireResult<Vec<_>>>()
            .map(|ids| Self { ids })
    }

    /// Strict parse of `s1+s2+...+sn`; the empty string is the empty sequence
    pub fn parse(text: &str) -> WireResult<Self> {
        if text.is_empty() {
            return Ok(Self::new());
        }
        text.split(CONTROL_SEPARATOR)
            .enumerate()
            .map(|(position, element)| parse_element(element, position))
            .collect::<WireResult<Vec<_>>>()
            .map(|ids| Self { ids })
    }

    /// Encode as `s1+s2+...+sn`
    pub fn to_wire(&self) -> String {
        self.ids
            .iter()
            .map(StateId::to_string)
            .collect::<Vec<_>>()
            .join(&CONTROL_SEPARATOR.to_string())
    }

    pub fn head(&self) -> Option<StateId> {
        self.ids.first().copied()
    }

    /// Remaining ids after the head
    pub fn tail(&self) -> &[StateId] {
        self.ids.get(1..).unwrap_or(&[])
    }

    pub fn push_front(&mut self, id: StateId) {
        self.ids.insert(0, id);
    }

    pub fn push_back(&mut self, id: StateId) {
        self.ids.push(id);
    }

    pub fn pop_front(&mut self) -> Option<StateId> {
        if self.ids.is_empty() {
            None
        } else {
            Some(self.ids.remove(0))
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.ids.iter().copied()
    }

    pub fn as_slice(&self) -> &[StateId] {
        &self.ids
    }
}

impl fmt::Display for ControlSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl FromStr for ControlSequence {
    type Err = WireError;

    fn from_str(text: &str) -> WireResult<Self> {
        Self::parse(text)
    }
}

impl FromIterator<StateId> for ControlSequence {
    fn from_iter<I: IntoIterator<Item = StateId>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: i32) -> StateId {
        StateId::new(raw).unwrap()
    }

    #[test]
    fn test_state_id_rejects_terminal() {
        assert!(StateId::new(0).is_none());
        assert_eq!(StateId::try_from(0), Err(WireError::ZeroStateId { position: 0 }));
        assert_eq!(StateId::try_from(-3).unwrap().get(), -3);
    }

    #[test]
    fn test_parse_and_encode() {
        let seq = ControlSequence::parse("10+12+11").unwrap();
        assert_eq!(seq.as_slice(), &[id(10), id(12), id(11)]);
        assert_eq!(seq.to_wire(), "10+12+11");
        assert_eq!(seq.head(), Some(id(10)));
        assert_eq!(seq.tail(), &[id(12), id(11)]);
    }

    #[test]
    fn test_empty_sequence_is_empty_text() {
        let seq = ControlSequence::parse("").unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq.to_wire(), "");
        assert_eq!(seq.tail(), &[] as &[StateId]);
    }

    #[test]
    fn test_parse_rejects_zero_and_garbage() {
        assert_eq!(
            ControlSequence::parse("10+0+11"),
            Err(WireError::ZeroStateId { position: 1 })
        );
        assert_eq!(
            ControlSequence::parse("10+x"),
            Err(WireError::invalid_state_id("x", 1))
        );
        // Empty element between separators
        assert!(ControlSequence::parse("10++11").is_err());
    }

    #[test]
    fn test_split_head() {
        assert_eq!(split_head("10+12+11"), ("10", "12+11"));
        assert_eq!(split_head("7"), ("7", ""));
        assert_eq!(split_head(""), ("", ""));
        assert_eq!(split_head("+5"), ("", "5"));
    }

    #[test]
    fn test_front_and_back_mutation() {
        let mut seq = ControlSequence::from_raw([12, 11]).unwrap();
        seq.push_front(id(10));
        seq.push_back(id(20));
        assert_eq!(seq.to_wire(), "10+12+11+20");
        assert_eq!(seq.pop_front(), Some(id(10)));
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn test_state_id_serde_roundtrip_through_i32() {
        let raw: i32 = id(42).into();
        assert_eq!(raw, 42);
        assert!(ControlSequence::from_raw([1, 0]).is_err());
    }
}
