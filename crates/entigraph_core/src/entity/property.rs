//! Storage cell for entity properties.

use parking_lot::RwLock;
use std::fmt;

/// A single property value of an entity.
///
/// Entity kinds keep their fields in `Property` cells and change them only
/// from the setter passed to [`set_value`](crate::Persistent::set_value);
/// writing directly bypasses undo.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T> Property<T> {
    /// Creates a property holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.read().clone()
    }

    /// Calls `f` with a reference to the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Overwrites the value.
    pub fn set(&self, value: T) {
        *self.value.write() = value;
    }

    /// Overwrites the value and returns the previous one.
    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.value.write(), value)
    }
}

impl<T: Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.value.read()).finish()
    }
}
