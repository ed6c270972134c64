use std::fmt::Display;

use tracing::{debug, warn};

use crate::net::{FireResult, PetriNet};

/// A firing intent dispatched by label.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub action: String,
    pub multiple: i64,
}

impl Event {
    pub fn new(action: impl Into<String>, multiple: i64) -> Self {
        Event { action: action.into(), multiple }
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x{}", self.action, self.multiple)
    }
}

/// One accepted firing and the marking it produced.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamEntry {
    pub seq: u64,
    pub event: Event,
    pub state: Vec<i64>,
}

type FailHook = Box<dyn FnMut(&[i64], &Event)>;

/// Wraps a structural-model snapshot with a live token vector and an
/// append-only event log. Created fresh whenever execution (re)starts,
/// discarded when it stops; it never mutates the structure it wraps.
pub struct Stream {
    net: PetriNet,
    state: Vec<i64>,
    seq: u64,
    history: Vec<StreamEntry>,
    on_fail: Option<FailHook>,
}

impl Stream {
    pub fn new(net: PetriNet) -> Self {
        let state = net.initial_vector();
        Stream { net, state, seq: 0, history: Vec::new(), on_fail: None }
    }

    /// Register a hook invoked with `(state, event)` whenever a dispatch is
    /// rejected. The presentation layer is expected to prevent invalid
    /// dispatches, so a rejection signals an out-of-band firing attempt; it
    /// is reported, never raised.
    pub fn on_fail(&mut self, hook: impl FnMut(&[i64], &Event) + 'static) {
        self.on_fail = Some(Box::new(hook));
    }

    pub fn state(&self) -> &[i64] {
        &self.state
    }

    pub fn history(&self) -> &[StreamEntry] {
        &self.history
    }

    pub fn net(&self) -> &PetriNet {
        &self.net
    }

    /// Reset the live vector to the initial marking and clear the log.
    pub fn restart(&mut self) {
        self.state = self.net.initial_vector();
        self.history.clear();
        self.seq = 0;
    }

    /// Fire a transition by label. On success the live vector advances and a
    /// log entry is appended; on failure the registered hook is notified.
    pub fn dispatch(&mut self, event: Event) -> FireResult {
        let result = self.net.fire(&self.state, &event.action, event.multiple);
        if let Some(out) = result.out.clone() {
            self.seq += 1;
            debug!(seq = self.seq, event = %event, "dispatched");
            self.state = out.clone();
            self.history.push(StreamEntry { seq: self.seq, event, state: out });
        } else {
            warn!(event = %event, inhibited = result.inhibited, "dispatch rejected");
            if let Some(hook) = self.on_fail.as_mut() {
                hook(&self.state, &event);
            }
        }
        result
    }
}
