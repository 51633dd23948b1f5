//! Data stack operations on the encoded `data` text
//!
//! The stack is kept in wire form so that an untouched tail is forwarded
//! byte-for-byte. Values pushed here are not checked for `|`; a value
//! containing it silently becomes two elements downstream.

use super::WorkingState;
use crate::constants::DATA_SEPARATOR;
use std::fmt;

impl WorkingState {
    /// Top element without removing it; the whole text when there is no `|`
    pub fn peek(&self) -> &str {
        self.data
            .split_once(DATA_SEPARATOR)
            .map_or(self.data.as_str(), |(top, _)| top)
    }

    /// Remove and return the top element
    ///
    /// A leading `|` marks an explicit empty element: it pops as `""` and
    /// only the separator is consumed. Without any `|` the whole text is the
    /// last element and the stack becomes empty. Popping an empty stack
    /// returns `""`.
    pub fn pop(&mut self) -> String {
        match self.data.find(DATA_SEPARATOR) {
            Some(index) => {
                let top = self.data[..index].to_string();
                self.data.replace_range(..=index, "");
                top
            }
            None => std::mem::take(&mut self.data),
        }
    }

    /// Pop the top element, or return `default` when the stack is empty
    ///
    /// An explicit empty element still pops as `""`; only an exhausted stack
    /// yields the default.
    pub fn pop_or(&mut self, default: impl Into<String>) -> String {
        if self.data.is_empty() {
            return default.into();
        }
        self.pop()
    }

    /// Pop the top element and split it on `separator` into a list
    ///
    /// Empty substrings are kept. An empty stack returns an empty list and
    /// consumes nothing; an explicit empty element is consumed and also
    /// yields an empty list.
    pub fn pop_list(&mut self, separator: &str) -> Vec<String> {
        if self.data.is_empty() {
            return Vec::new();
        }

        let top = self.pop();
        if top.is_empty() {
            return Vec::new();
        }
        if separator.is_empty() {
            return vec![top];
        }
        top.split(separator).map(str::to_string).collect()
    }

    /// Place `value` on top of the stack
    pub fn push(&mut self, value: impl fmt::Display) {
        if self.data.is_empty() {
            self.data = value.to_string();
        } else {
            self.push_known_non_empty(value);
        }
    }

    /// Place `value` on top of a stack the caller knows is non-empty
    ///
    /// On an empty stack this leaves a trailing empty element behind.
    pub fn push_known_non_empty(&mut self, value: impl fmt::Display) {
        debug_assert!(!self.data.is_empty(), "push_known_non_empty on empty stack");
        self.data = format!("{value}{DATA_SEPARATOR}{}", self.data);
    }
}
