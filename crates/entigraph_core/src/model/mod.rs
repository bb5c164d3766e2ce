//! The model collaborator.
//!
//! A model owns a set of entities, materializes them on demand and, when
//! transactional, exposes the transaction that records property changes.
//! Entities depend only on the [`Model`] trait; [`GraphModel`] is the
//! in-memory implementation shipped with this crate.

mod graph;

pub use graph::GraphModel;

use crate::entity::{ActivationMode, Persistent};
use crate::transaction::Transaction;
use crate::types::{EntityKey, ModelId};
use std::sync::Arc;

/// Services a model provides to its entities.
///
/// # Contract
///
/// - `activate` with `ReadWrite` on an entity already activated for read
///   must be safe to call more than once, including concurrently. Entities
///   upgrade from read to write without holding their activation lock.
/// - `current_transaction` must return `Some` whenever a transactional
///   model expects property changes.
pub trait Model: Send + Sync {
    /// Returns the identity of this model.
    fn id(&self) -> ModelId;

    /// Materializes `entity` for the requested degree.
    ///
    /// Returns false if the entity could not be loaded.
    fn activate(&self, entity: &dyn Persistent, mode: ActivationMode) -> bool;

    /// Whether property changes must be recorded in a transaction.
    fn is_transactional(&self) -> bool;

    /// Returns the open transaction, if any.
    fn current_transaction(&self) -> Option<Arc<Transaction>>;

    /// Called after any entity of this model applied or reverted a property
    /// change, once the entity's own listeners have run.
    fn property_changed(&self, _entity: &EntityKey, _property: &str) {}
}
