//! Model-wide change journal.
//!
//! Every property change applied or reverted on any entity of a model, and
//! every registration or discard, is appended to the journal. The journal
//! enables:
//! - Reactive UI updates across many entities
//! - Catch-up polling from a sequence cursor
//! - Audit logging
//!
//! # Usage
//!
//! ```rust,ignore
//! let model = GraphModel::in_memory();
//! let receiver = model.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(event) = receiver.recv() {
//!         println!("Change: {:?}", event);
//!     }
//! });
//! ```

use crate::types::{ChangeKind, EntityKey};
use parking_lot::{Mutex, RwLock};
use std::sync::mpsc::{self, Receiver, Sender};

/// A single journal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Position in the journal, starting at 1.
    pub sequence: u64,
    /// The entity that changed.
    pub entity: EntityKey,
    /// Type of change.
    pub kind: ChangeKind,
    /// Property key for `Modified` events. None otherwise.
    pub property: Option<String>,
}

/// A journal that distributes change events to subscribers.
///
/// The journal:
/// - Assigns a gap-free sequence to every event
/// - Supports multiple subscribers
/// - Keeps a bounded history for polling
/// - Is thread-safe
pub struct ChangeJournal {
    /// Subscribers (senders).
    subscribers: RwLock<Vec<Sender<ChangeEvent>>>,
    /// History of recent events, guarded together with the sequence counter.
    history: Mutex<History>,
    /// Maximum history size.
    max_history: usize,
}

#[derive(Default)]
struct History {
    last_sequence: u64,
    events: Vec<ChangeEvent>,
}

impl ChangeJournal {
    /// Creates a journal keeping the last 10 000 events.
    pub fn new() -> Self {
        Self::with_max_history(10_000)
    }

    /// Creates a journal with a specific history limit.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: Mutex::new(History::default()),
            max_history,
        }
    }

    /// Subscribes to the journal.
    ///
    /// Returns a receiver that will receive all future events.
    /// The receiver should be polled regularly to avoid unbounded memory growth.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Appends an event and fans it out. Returns the assigned sequence.
    pub fn emit(&self, entity: EntityKey, kind: ChangeKind, property: Option<&str>) -> u64 {
        let event = {
            let mut history = self.history.lock();
            history.last_sequence += 1;
            let event = ChangeEvent {
                sequence: history.last_sequence,
                entity,
                kind,
                property: property.map(str::to_owned),
            };
            history.events.push(event.clone());
            if history.events.len() > self.max_history {
                let to_remove = history.events.len() - self.max_history;
                history.events.drain(0..to_remove);
            }
            event
        };

        let sequence = event.sequence;
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        sequence
    }

    /// Polls events from a sequence cursor.
    ///
    /// Returns events with sequence > cursor, up to limit.
    pub fn poll(&self, cursor: u64, limit: usize) -> Vec<ChangeEvent> {
        self.history
            .lock()
            .events
            .iter()
            .filter(|e| e.sequence > cursor)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Returns the latest assigned sequence number.
    pub fn latest_sequence(&self) -> u64 {
        self.history.lock().last_sequence
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns the number of events in history.
    pub fn history_len(&self) -> usize {
        self.history.lock().events.len()
    }

    /// Clears history older than the given sequence.
    pub fn truncate_history(&self, min_sequence: u64) {
        self.history
            .lock()
            .events
            .retain(|e| e.sequence >= min_sequence);
    }
}

impl Default for ChangeJournal {
    fn default() -> Self {
        Self::new()
    }
}
