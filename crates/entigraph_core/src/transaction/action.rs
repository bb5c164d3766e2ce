//! Reversible actions recorded by transactions.

use crate::entity::Persistent;
use crate::types::{ChangeKind, EntityKey, OrderingKey};
use std::fmt;
use std::sync::Arc;

/// One reversible unit of change.
///
/// Implementations are plain command records: the transaction replays or
/// reverts them without knowing the property type involved.
pub trait ReversibleAction: Send + Sync + fmt::Debug {
    /// Applies the change (the do-effect).
    fn apply(&self);

    /// Reverts the change (the undo-effect).
    fn revert(&self);

    /// The entity the change belongs to.
    fn entity(&self) -> EntityKey;

    /// The kind of change.
    fn change_kind(&self) -> ChangeKind;

    /// Key sequencing this action relative to others in a transaction.
    fn ordering_key(&self) -> OrderingKey;

    /// The change-notification key of the affected property.
    fn property(&self) -> &str;
}

/// A property change on an entity of kind `E` holding values of type `T`.
///
/// Applying calls `setter(new)`, reverting calls `setter(old)`; both then
/// fire the entity's notification for `property`.
pub struct PropertyChange<E, T> {
    entity: Arc<E>,
    property: String,
    setter: fn(&E, T),
    old_value: T,
    new_value: T,
    ordering: OrderingKey,
}

impl<E, T> PropertyChange<E, T>
where
    E: Persistent,
    T: Clone,
{
    /// Creates a change record.
    pub fn new(
        entity: Arc<E>,
        property: impl Into<String>,
        setter: fn(&E, T),
        old_value: T,
        new_value: T,
        ordering: OrderingKey,
    ) -> Self {
        Self {
            entity,
            property: property.into(),
            setter,
            old_value,
            new_value,
            ordering,
        }
    }

    /// Returns the affected entity.
    pub fn target(&self) -> &Arc<E> {
        &self.entity
    }

    /// Returns the value restored by [`revert`](ReversibleAction::revert).
    pub fn old_value(&self) -> &T {
        &self.old_value
    }

    /// Returns the value written by [`apply`](ReversibleAction::apply).
    pub fn new_value(&self) -> &T {
        &self.new_value
    }

    fn write(&self, value: T) {
        (self.setter)(self.entity.as_ref(), value);
        self.entity.core().notify(&self.property);
    }
}

impl<E, T> ReversibleAction for PropertyChange<E, T>
where
    E: Persistent + 'static,
    T: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn apply(&self) {
        self.write(self.new_value.clone());
    }

    fn revert(&self) {
        self.write(self.old_value.clone());
    }

    fn entity(&self) -> EntityKey {
        self.entity.core().key()
    }

    fn change_kind(&self) -> ChangeKind {
        ChangeKind::Modified
    }

    fn ordering_key(&self) -> OrderingKey {
        self.ordering
    }

    fn property(&self) -> &str {
        &self.property
    }
}

impl<E, T> fmt::Debug for PropertyChange<E, T>
where
    E: Persistent,
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChange")
            .field("entity", &self.entity.core().label())
            .field("property", &self.property)
            .field("old", &self.old_value)
            .field("new", &self.new_value)
            .field("ordering", &self.ordering)
            .finish()
    }
}
