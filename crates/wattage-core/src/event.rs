//! Typed event system with per-kind ring buffers and synchronous delivery.
//!
//! Every state mutation in the core emits events *after* the state has been
//! committed, within the same call. Listeners therefore never observe an
//! event that precedes its corresponding state change. Delivery order is
//! registration order.
//!
//! Each event kind also has an [`EventBuffer`] ring buffer holding the most
//! recent events for audit and debugging. Kinds can be suppressed via
//! [`EventBus::suppress`], which skips both buffering and delivery.

use crate::resource::{ResourceKind, Transaction, TxnFailure};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A core state-change event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // -- Ledger --
    ResourceChanged {
        kind: ResourceKind,
        previous: i64,
        new: i64,
    },
    TransactionRecorded(Transaction),

    // -- Tap session --
    HitsChanged {
        current: u32,
        max: u32,
    },
    TapSucceeded {
        income: i64,
        xp: i64,
    },
    TapFailed {
        reason: TapFailReason,
    },

    // -- Account --
    LevelUp {
        level: u32,
        reward: i64,
    },
    DailyBonusClaimed {
        streak_day: u32,
        reward: i64,
    },
    OfflineBonusChanged(i64),
    DataChanged,
}

/// Why a tap did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapFailReason {
    /// The hit pool is empty.
    NoHits,
    /// The account rejected the tap (energy gate).
    AccountRejected(TxnFailure),
}

/// Discriminant tag for event types, used for suppression and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ResourceChanged,
    TransactionRecorded,
    HitsChanged,
    TapSucceeded,
    TapFailed,
    LevelUp,
    DailyBonusClaimed,
    OfflineBonusChanged,
    DataChanged,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 9;

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ResourceChanged { .. } => EventKind::ResourceChanged,
            Event::TransactionRecorded(_) => EventKind::TransactionRecorded,
            Event::HitsChanged { .. } => EventKind::HitsChanged,
            Event::TapSucceeded { .. } => EventKind::TapSucceeded,
            Event::TapFailed { .. } => EventKind::TapFailed,
            Event::LevelUp { .. } => EventKind::LevelUp,
            Event::DailyBonusClaimed { .. } => EventKind::DailyBonusClaimed,
            Event::OfflineBonusChanged(_) => EventKind::OfflineBonusChanged,
            Event::DataChanged => EventKind::DataChanged,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer: ring buffer of recent events
// ---------------------------------------------------------------------------

/// A fixed-capacity ring buffer of events; when full, the oldest are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    head: usize,
    len: usize,
    total_written: u64,
}

impl EventBuffer {
    /// Create a buffer with the given capacity. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event. If full, the oldest event is dropped.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total events written since creation, including dropped ones.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> EventBufferIter<'_> {
        let start = if self.len < self.capacity() {
            0
        } else {
            // head is the next write position, i.e. the oldest entry
            self.head
        };
        EventBufferIter {
            buffer: self,
            index: start,
            remaining: self.len,
        }
    }

    /// Clear all events.
    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

/// Iterator over an [`EventBuffer`], oldest to newest.
pub struct EventBufferIter<'a> {
    buffer: &'a EventBuffer,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventBufferIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.buffer.events[self.index].as_ref();
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventBufferIter<'_> {}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// A listener receives events read-only. Listeners must not re-enter the core.
pub type Listener = Box<dyn FnMut(&Event)>;

/// The central event bus: one ring buffer per event kind, listener lists,
/// and suppression flags.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<Listener>; EVENT_KIND_COUNT],
    default_capacity: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create a bus with the given default ring-buffer capacity per kind.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: std::array::from_fn(|_| Vec::new()),
            default_capacity,
        }
    }

    /// Suppress an event kind: no buffering, no delivery, zero cost.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    /// Lift suppression for an event kind.
    pub fn unsuppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = false;
    }

    /// Check whether a kind is suppressed.
    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Register a listener for one event kind. Listeners for the same kind
    /// are invoked in registration order.
    pub fn subscribe(&mut self, kind: EventKind, listener: Listener) {
        self.listeners[kind.index()].push(listener);
    }

    /// Emit an event: buffer it, then deliver to listeners synchronously.
    /// Callers emit only after the corresponding state change is committed.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.default_capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event.clone());
        for listener in &mut self.listeners[idx] {
            listener(&event);
        }
    }

    /// Recent events of a kind, oldest first. Empty if none were recorded.
    pub fn recent(&self, kind: EventKind) -> Vec<&Event> {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.iter().collect())
            .unwrap_or_default()
    }

    /// Total events of a kind ever emitted (including dropped from buffer).
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.total_written())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn buffer_wraps_and_drops_oldest() {
        let mut buf = EventBuffer::new(3);
        for i in 0..5 {
            buf.push(Event::OfflineBonusChanged(i));
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.total_written(), 5);
        let values: Vec<i64> = buf
            .iter()
            .map(|e| match e {
                Event::OfflineBonusChanged(v) => *v,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(values, vec![2, 3, 4]);
    }

    #[test]
    fn zero_capacity_clamped_to_one() {
        let mut buf = EventBuffer::new(0);
        buf.push(Event::DataChanged);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn delivery_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new(8);
        for tag in [1, 2, 3] {
            let order = Rc::clone(&order);
            bus.subscribe(
                EventKind::DataChanged,
                Box::new(move |_| order.borrow_mut().push(tag)),
            );
        }
        bus.emit(Event::DataChanged);
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn suppressed_kind_is_silent() {
        let hits = Rc::new(RefCell::new(0u32));
        let mut bus = EventBus::new(8);
        let h = Rc::clone(&hits);
        bus.subscribe(EventKind::DataChanged, Box::new(move |_| *h.borrow_mut() += 1));
        bus.suppress(EventKind::DataChanged);
        bus.emit(Event::DataChanged);
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(bus.total_emitted(EventKind::DataChanged), 0);

        bus.unsuppress(EventKind::DataChanged);
        bus.emit(Event::DataChanged);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn recent_returns_only_matching_kind() {
        let mut bus = EventBus::new(8);
        bus.emit(Event::DataChanged);
        bus.emit(Event::OfflineBonusChanged(7));
        assert_eq!(bus.recent(EventKind::DataChanged).len(), 1);
        assert_eq!(bus.recent(EventKind::OfflineBonusChanged).len(), 1);
        assert_eq!(bus.recent(EventKind::LevelUp).len(), 0);
    }
}
