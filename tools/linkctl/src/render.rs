//! Human and JSON renderings of decoded messages and assignments

use linkchain_codec::WorkingState;
use linkchain_config::StateAssignments;
use serde::Serialize;
use std::fmt::Write;

/// Serializable snapshot of a [`WorkingState`]
#[derive(Debug, Serialize, PartialEq)]
pub struct DecodedView {
    pub next: i32,
    pub terminal: bool,
    pub rest: String,
    pub seq: String,
    pub channel: Option<i32>,
    pub data: String,
    pub stack: Vec<String>,
}

impl From<&WorkingState> for DecodedView {
    fn from(state: &WorkingState) -> Self {
        Self {
            next: state.next(),
            terminal: state.is_terminal(),
            rest: state.rest().to_string(),
            seq: state.seq().to_string(),
            channel: state.channel(),
            data: state.data().to_string(),
            stack: state.data_stack().into_vec(),
        }
    }
}

impl DecodedView {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "next     {}{}", self.next, if self.terminal { " (terminal)" } else { "" });
        let _ = writeln!(out, "rest     {}", self.rest);
        let _ = writeln!(out, "seq      {}", self.seq);
        if let Some(channel) = self.channel {
            let _ = writeln!(out, "channel  {}", channel);
        }
        let _ = writeln!(out, "data     {}", self.data);
        if self.stack.is_empty() {
            let _ = writeln!(out, "stack    (empty)");
        }
        for (i, element) in self.stack.iter().enumerate() {
            let label = if i == 0 { "stack" } else { "" };
            let _ = writeln!(out, "{:<8} [{}] {:?}", label, i, element);
        }
        out
    }
}

/// One line per actor: its states (by name) and listen channels
pub fn assignments_text(assignments: &StateAssignments) -> String {
    let mut out = String::new();
    for (actor, ids) in &assignments.actors {
        let states: Vec<String> = ids
            .iter()
            .map(|id| match assignments.state_name(*id) {
                Some(name) => format!("{}={}", name, id),
                None => id.to_string(),
            })
            .collect();
        let _ = write!(out, "{}: {}", actor, states.join(", "));
        let channels = assignments.channels_of(actor);
        if !channels.is_empty() {
            let channels: Vec<String> = channels.iter().map(i32::to_string).collect();
            let _ = write!(out, " (listens on {})", channels.join(", "));
        }
        out.push('\n');
    }
    out
}
