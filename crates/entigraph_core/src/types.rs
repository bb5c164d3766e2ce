//! Core type definitions for EntiGraph.

use std::fmt;
use uuid::Uuid;

/// Label of an entity, unique within its owning model.
///
/// Labels are assigned when an entity is constructed and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityLabel(pub u64);

impl EntityLabel {
    /// Creates a new label.
    #[must_use]
    pub const fn new(label: u64) -> Self {
        Self(label)
    }

    /// Returns the raw label value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for EntityLabel {
    fn from(label: u64) -> Self {
        Self(label)
    }
}

/// Identity of a model instance.
///
/// Two models are equal iff their IDs are equal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(Uuid);

impl ModelId {
    /// Creates a new random model ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a model ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({})", self.0)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value identity of an entity: its model and its label.
///
/// Carried by notifications and reversible actions instead of the entity
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    /// The owning model.
    pub model: ModelId,
    /// The entity label.
    pub label: EntityLabel,
}

impl EntityKey {
    /// Creates a new entity key.
    #[must_use]
    pub const fn new(model: ModelId, label: EntityLabel) -> Self {
        Self { model, label }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity {}", self.label)
    }
}

/// Key carried by a reversible action to sequence it relative to others.
///
/// Transactions replay and revert in registration order; the key is
/// metadata exposed through `Transaction::ordered_actions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OrderingKey(pub i64);

impl OrderingKey {
    /// Creates a new ordering key.
    #[must_use]
    pub const fn new(key: i64) -> Self {
        Self(key)
    }

    /// Returns the raw key value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for OrderingKey {
    fn from(key: i64) -> Self {
        Self(key)
    }
}

/// Unique identifier for a transaction.
///
/// Transaction IDs are monotonically increasing and never reused within a
/// model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Kind of change recorded for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Entity was registered with the model.
    Added,
    /// A property of the entity changed.
    Modified,
    /// Entity was discarded by the model.
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
        };
        f.write_str(name)
    }
}
