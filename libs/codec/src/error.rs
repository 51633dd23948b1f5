//! Wire-level errors for the strict construction and parsing paths
//!
//! The lenient decode path used by running actors never fails: malformed input
//! degrades to `0` or an empty string. These errors are only produced where a
//! caller explicitly asks for validation, e.g. when building an outbound
//! message or parsing an operator-supplied control sequence.

use thiserror::Error;

/// Validation failures for linkchain wire values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A value contains a separator the format cannot escape
    #[error("Reserved separator {separator:?} inside {field} value {value:?} (the wire format has no escaping)")]
    ReservedCharacter {
        separator: char,
        field: &'static str,
        value: String,
    },

    /// State id 0 is the terminal sentinel and never a real hop
    #[error("State id 0 at position {position} is reserved for the terminal sentinel")]
    ZeroStateId { position: usize },

    /// A control element does not parse as a 32-bit integer
    #[error("Invalid state id {text:?} at position {position}: expected a non-zero 32-bit integer")]
    InvalidStateId { text: String, position: usize },
}

impl WireError {
    /// Reserved separator inside a data stack element
    pub fn reserved_in_data(separator: char, value: impl Into<String>) -> Self {
        Self::ReservedCharacter {
            separator,
            field: "data",
            value: value.into(),
        }
    }

    /// Reserved separator inside a control element
    pub fn reserved_in_control(separator: char, value: impl Into<String>) -> Self {
        Self::ReservedCharacter {
            separator,
            field: "control",
            value: value.into(),
        }
    }

    pub fn invalid_state_id(text: impl Into<String>, position: usize) -> Self {
        Self::InvalidStateId {
            text: text.into(),
            position,
        }
    }
}

/// Result type for strict wire operations
pub type WireResult<T> = std::result::Result<T, WireError>;
