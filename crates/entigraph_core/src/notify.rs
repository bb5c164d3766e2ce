//! Per-entity property change listeners.
//!
//! Listeners are registered against a property name (or against every
//! property) and invoked synchronously, in registration order, each time a
//! tracked property is applied or reverted.

use crate::types::EntityKey;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Receives property change notifications.
///
/// Implemented for any `Fn(&EntityKey, &str) + Send + Sync` closure.
pub trait PropertyListener: Send + Sync {
    /// Called after `property` of `entity` changed.
    fn property_changed(&self, entity: &EntityKey, property: &str);
}

impl<F> PropertyListener for F
where
    F: Fn(&EntityKey, &str) + Send + Sync,
{
    fn property_changed(&self, entity: &EntityKey, property: &str) {
        self(entity, property);
    }
}

/// Handle returned by [`Listeners::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Entry {
    id: ListenerId,
    /// `None` matches every property.
    property: Option<String>,
    listener: Arc<dyn PropertyListener>,
}

impl Entry {
    fn matches(&self, property: &str) -> bool {
        self.property.as_deref().map_or(true, |p| p == property)
    }
}

/// Ordered list of listeners attached to one entity.
#[derive(Default)]
pub struct Listeners {
    next_id: AtomicU64,
    entries: RwLock<Vec<Entry>>,
}

impl Listeners {
    /// Creates an empty listener list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for one property.
    pub fn subscribe<L>(&self, property: impl Into<String>, listener: L) -> ListenerId
    where
        L: PropertyListener + 'static,
    {
        self.push(Some(property.into()), Arc::new(listener))
    }

    /// Registers a listener for every property.
    pub fn subscribe_all<L>(&self, listener: L) -> ListenerId
    where
        L: PropertyListener + 'static,
    {
        self.push(None, Arc::new(listener))
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    /// Invokes every listener matching `property`, in registration order.
    ///
    /// The list is snapshotted first, so listeners may subscribe or
    /// unsubscribe from inside the callback.
    pub fn notify(&self, entity: &EntityKey, property: &str) {
        let matching: Vec<Arc<dyn PropertyListener>> = self
            .entries
            .read()
            .iter()
            .filter(|e| e.matches(property))
            .map(|e| Arc::clone(&e.listener))
            .collect();

        for listener in matching {
            listener.property_changed(entity, property);
        }
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn push(&self, property: Option<String>, listener: Arc<dyn PropertyListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push(Entry {
            id,
            property,
            listener,
        });
        id
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}
