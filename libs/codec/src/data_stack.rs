//! # Data Stack Codec
//!
//! ## Purpose
//!
//! Typed view of the "what travels with it" half of a message: an ordered list
//! of strings joined with `|`, top of stack first. Duplicates and empty strings
//! are allowed.
//!
//! ## Format Constraints
//!
//! - There is no escaping. An element containing `|` would split into two
//!   elements on the next decode, so the strict constructors reject it.
//! - The empty stack encodes as the empty string. A stack holding exactly one
//!   empty element encodes the same way, so `[""]` decodes back as `[]`. Any
//!   other placement of empty elements survives a round trip because the
//!   separators mark their positions.

use crate::constants::DATA_SEPARATOR;
use crate::error::{WireError, WireResult};
use std::fmt;

/// Reject a data element the wire format cannot carry
pub fn validate_element(value: &str) -> WireResult<()> {
    if value.contains(DATA_SEPARATOR) {
        return Err(WireError::reserved_in_data(DATA_SEPARATOR, value));
    }
    Ok(())
}

/// Ordered data elements; index 0 is the top of the stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataStack {
    elements: Vec<String>,
}

impl DataStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from elements listed top first, validating each one
    pub fn from_elements<I, S>(elements: I) -> WireResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements = elements
            .into_iter()
            .map(Into::into)
            .map(|element: String| validate_element(&element).map(|()| element))
            .collect::<WireResult<Vec<_>>>()?;
        Ok(Self { elements })
    }

    /// Decode `d1|d2|...|dm`; the empty string is the empty stack
    pub fn from_wire(text: &str) -> Self {
        if text.is_empty() {
            return Self::new();
        }
        Self {
            elements: text.split(DATA_SEPARATOR).map(str::to_string).collect(),
        }
    }

    /// Encode as `d1|d2|...|dm`
    pub fn to_wire(&self) -> String {
        self.elements.join(&DATA_SEPARATOR.to_string())
    }

    /// Place `value` on top of the stack
    pub fn push(&mut self, value: impl Into<String>) -> WireResult<()> {
        let value = value.into();
        validate_element(&value)?;
        self.elements.insert(0, value);
        Ok(())
    }

    /// Add `value` below every existing element
    pub fn push_bottom(&mut self, value: impl Into<String>) -> WireResult<()> {
        let value = value.into();
        validate_element(&value)?;
        self.elements.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<String> {
        if self.elements.is_empty() {
            None
        } else {
            Some(self.elements.remove(0))
        }
    }

    pub fn peek(&self) -> Option<&str> {
        self.elements.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.elements
    }

    pub fn into_vec(self) -> Vec<String> {
        self.elements
    }
}

impl fmt::Display for DataStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}
