//! Control sequence operations on `next` / `rest` / `seq`

use super::WorkingState;
use crate::cast::lenient_int;
use crate::constants::{CONTROL_SEPARATOR, TERMINAL};
use crate::control::{join_control, split_head, StateId};

impl WorkingState {
    /// Schedule `id` as the hop right after `next`, keeping the continuation
    /// behind it
    pub fn push_head(&mut self, id: StateId) {
        self.rest = join_control(&id.to_string(), &self.rest);
        self.resync_seq();
    }

    /// [`push_head`](Self::push_head) for a remainder the caller knows is
    /// non-empty
    pub fn push_head_known_non_empty(&mut self, id: StateId) {
        debug_assert!(!self.rest.is_empty(), "push_head_known_non_empty on empty remainder");
        self.rest = format!("{id}{CONTROL_SEPARATOR}{}", self.rest);
        self.resync_seq();
    }

    /// Schedule `id` after every pending hop
    pub fn append_tail(&mut self, id: StateId) {
        if !self.rest.is_empty() {
            self.rest.push(CONTROL_SEPARATOR);
        }
        if !self.seq.is_empty() {
            self.seq.push(CONTROL_SEPARATOR);
        }
        let id = id.to_string();
        self.rest.push_str(&id);
        self.seq.push_str(&id);
    }

    /// [`append_tail`](Self::append_tail) when both `rest` and `seq` are known
    /// to be non-empty
    pub fn append_tail_known_non_empty(&mut self, id: StateId) {
        debug_assert!(!self.rest.is_empty() && !self.seq.is_empty());
        let id = id.to_string();
        self.rest.push(CONTROL_SEPARATOR);
        self.rest.push_str(&id);
        self.seq.push(CONTROL_SEPARATOR);
        self.seq.push_str(&id);
    }

    /// Advance the control sequence by one hop and return the new `next`
    ///
    /// Returns `0` once the remainder is exhausted.
    pub fn pop_head(&mut self) -> i32 {
        let remainder = std::mem::take(&mut self.rest);
        if remainder.is_empty() {
            self.next = TERMINAL;
            self.seq = remainder;
            return self.next;
        }

        let (head, rest) = split_head(&remainder);
        self.next = lenient_int(head);
        self.rest = rest.to_string();
        if self.next == TERMINAL {
            self.seq = remainder;
        } else {
            self.resync_seq();
        }
        self.next
    }

    /// Make `id` the immediate next hop; the previously scheduled sequence,
    /// old `next` included, becomes the remainder
    pub fn replace_head(&mut self, id: StateId) {
        self.rest = std::mem::take(&mut self.seq);
        self.next = id.get();
        self.resync_seq();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: i32) -> StateId {
        StateId::new(raw).unwrap()
    }

    fn assert_seq_invariant(state: &WorkingState) {
        if !state.is_terminal() {
            let expected = if state.rest().is_empty() {
                state.next().to_string()
            } else {
                format!("{}+{}", state.next(), state.rest())
            };
            assert_eq!(state.seq(), expected);
        }
    }

    #[test]
    fn test_append_tail() {
        let mut s = WorkingState::decode("10+12+11|data 1||data 3");
        s.append_tail(id(20));
        assert_eq!(s.rest(), "12+11+20");
        assert_eq!(s.seq(), "10+12+11+20");
        assert_seq_invariant(&s);
    }

    #[test]
    fn test_append_tail_on_empty_remainder() {
        let mut s = WorkingState::decode("5|");
        s.append_tail(id(6));
        assert_eq!(s.rest(), "6");
        assert_eq!(s.seq(), "5+6");
    }

    #[test]
    fn test_append_tail_known_non_empty() {
        let mut s = WorkingState::decode("1+2|");
        s.append_tail_known_non_empty(id(3));
        assert_eq!(s.rest(), "2+3");
        assert_eq!(s.seq(), "1+2+3");
    }

    #[test]
    fn test_push_head_then_pop_head() {
        let mut s = WorkingState::decode("10+12+11|x");
        s.push_head(id(99));
        assert_eq!(s.next(), 10);
        assert_eq!(s.rest(), "99+12+11");
        assert_seq_invariant(&s);

        assert_eq!(s.pop_head(), 99);
        assert_eq!(s.rest(), "12+11");
        assert_seq_invariant(&s);
    }

    #[test]
    fn test_push_head_on_empty_remainder() {
        let mut s = WorkingState::decode("4|");
        s.push_head(id(8));
        assert_eq!(s.rest(), "8");
        assert_eq!(s.seq(), "4+8");
    }

    #[test]
    fn test_push_head_known_non_empty() {
        let mut s = WorkingState::decode("4+5|");
        s.push_head_known_non_empty(id(8));
        assert_eq!(s.rest(), "8+5");
    }

    #[test]
    fn test_pop_head_until_terminal() {
        let mut s = WorkingState::decode("1+2+3|d");
        assert_eq!(s.pop_head(), 2);
        assert_eq!(s.pop_head(), 3);
        assert_eq!(s.pop_head(), 0);
        assert!(s.is_terminal());
        assert_eq!(s.pop_head(), 0);
        assert_eq!(s.data(), "d");
    }

    #[test]
    fn test_pop_head_normalizes_seq() {
        let mut s = WorkingState::decode("1+007+3|");
        assert_eq!(s.pop_head(), 7);
        assert_eq!(s.rest(), "3");
        assert_eq!(s.seq(), "7+3");
        assert_seq_invariant(&s);

        let mut s = WorkingState::decode("1+7abc|");
        assert_eq!(s.pop_head(), 7);
        assert_eq!(s.rest(), "");
        assert_eq!(s.seq(), "7");
        assert_seq_invariant(&s);
    }

    #[test]
    fn test_pop_head_onto_corrupt_element() {
        let mut s = WorkingState::decode("1+abc+3|x");
        assert_eq!(s.pop_head(), 0);
        assert!(s.is_terminal());
        assert_eq!(s.rest(), "3");
        assert_eq!(s.seq(), "abc+3");
    }

    #[test]
    fn test_replace_head_keeps_continuation() {
        let mut s = WorkingState::decode("10+12|x");
        s.replace_head(id(30));
        assert_eq!(s.next(), 30);
        assert_eq!(s.rest(), "10+12");
        assert_eq!(s.encode(), "10+12|x");
        assert_seq_invariant(&s);
    }

    #[test]
    fn test_replace_head_after_terminal() {
        let mut s = WorkingState::decode("3|x");
        assert_eq!(s.pop_head(), 0);
        s.replace_head(id(7));
        assert_eq!(s.next(), 7);
        assert_eq!(s.rest(), "");
        assert_eq!(s.encode(), "|x");
    }
}
