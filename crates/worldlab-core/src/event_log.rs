//! In-memory event log for the current process lifetime.
//!
//! The runtime appends every recorded event here, in the same order as the
//! durable store. A replayed runtime starts with the whole durable log loaded,
//! so positions in this buffer match positions on disk.

use worldlab_types::{Event, EventKind};

/// Ordered, append-only buffer of events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append one event.
    pub fn append(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Number of events held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events in append order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Iterate over events in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Iterate over events of one kind, in append order.
    pub fn of_kind<'a>(&'a self, kind: &'a EventKind) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |event| &event.kind == kind)
    }

    /// Events at position `offset` and later.
    pub fn since(&self, offset: usize) -> &[Event] {
        self.events.get(offset..).unwrap_or_default()
    }
}

impl From<Vec<Event>> for EventLog {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
