//! # Wire Constants
//!
//! ## Purpose
//!
//! The reserved characters and sentinel values of the linkchain wire format.
//! Every actor in a deployment must agree on these; changing any of them breaks
//! compatibility with every actor already deployed.
//!
//! ## Wire Layout
//!
//! ```text
//! 10+12+11|data 1||data 3
//! └──┬───┘│└──────┬──────┘
//!  control│     data stack
//!      DATA_SEPARATOR
//! ```

/// Separates the control sequence from the data stack, and data elements from
/// each other
pub const DATA_SEPARATOR: char = '|';

/// Separates state ids inside the control sequence
pub const CONTROL_SEPARATOR: char = '+';

/// Reserved control value meaning "no further hop"
pub const TERMINAL: i32 = 0;
