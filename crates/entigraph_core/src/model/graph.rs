//! In-memory entity graph model.

use crate::config::ModelConfig;
use crate::entity::{ensure_activated, ActivationMode, Persistent};
use crate::error::{CoreError, CoreResult};
use crate::journal::{ChangeEvent, ChangeJournal};
use crate::model::Model;
use crate::stats::{ModelStats, StatsSnapshot};
use crate::transaction::{Transaction, TransactionManager};
use crate::types::{ChangeKind, EntityKey, EntityLabel, ModelId, TransactionId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, warn};

/// An in-memory model owning a graph of lazily activated entities.
///
/// The model holds the only strong references to its entities; entities
/// point back to it weakly. Activation is delegated to each entity kind's
/// [`Persistent::materialize`].
///
/// # Example
///
/// ```rust,ignore
/// let model = GraphModel::in_memory();
/// let records = load_document(&model, JsonDocument::from_path(path)?)?;
///
/// model.transaction(|_| records[0].set("Name", json!("Y"), OrderingKey::new(1)))?;
/// model.undo()?;
/// ```
pub struct GraphModel {
    id: ModelId,
    config: ModelConfig,
    entities: RwLock<HashMap<EntityLabel, Arc<dyn Persistent>>>,
    txn_manager: TransactionManager,
    journal: ChangeJournal,
    stats: ModelStats,
}

impl GraphModel {
    /// Creates a model with the given configuration.
    pub fn new(config: ModelConfig) -> Arc<Self> {
        Arc::new(Self {
            id: ModelId::new(),
            txn_manager: TransactionManager::new(config.max_undo_depth),
            journal: ChangeJournal::with_max_history(config.journal_capacity),
            config,
            entities: RwLock::new(HashMap::new()),
            stats: ModelStats::new(),
        })
    }

    /// Creates a transactional model with default configuration.
    pub fn in_memory() -> Arc<Self> {
        Self::new(ModelConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    // === Registry ===

    /// Adds an entity to the model.
    ///
    /// # Errors
    ///
    /// - `ForeignEntity` if the entity was created for another model.
    /// - `DuplicateLabel` if the label is taken.
    pub fn register(&self, entity: Arc<dyn Persistent>) -> CoreResult<()> {
        let key = entity.key();
        if key.model != self.id {
            return Err(CoreError::ForeignEntity {
                entity: key,
                model: self.id,
            });
        }

        {
            let mut entities = self.entities.write();
            if entities.contains_key(&key.label) {
                return Err(CoreError::DuplicateLabel { label: key.label });
            }
            entities.insert(key.label, Arc::clone(&entity));
        }
        self.journal.emit(key, ChangeKind::Added, None);

        if self.config.activate_on_register {
            ensure_activated(entity.as_ref(), false)?;
        }
        Ok(())
    }

    /// Returns the entity registered under `label`.
    pub fn get(&self, label: EntityLabel) -> Option<Arc<dyn Persistent>> {
        self.entities.read().get(&label).cloned()
    }

    /// Returns the entity registered under `label`, or `EntityNotFound`.
    pub fn require(&self, label: EntityLabel) -> CoreResult<Arc<dyn Persistent>> {
        self.get(label).ok_or(CoreError::EntityNotFound { label })
    }

    /// Checks if a label is registered.
    pub fn contains(&self, label: EntityLabel) -> bool {
        self.entities.read().contains_key(&label)
    }

    /// Removes an entity from the model and returns it.
    pub fn discard(&self, label: EntityLabel) -> CoreResult<Arc<dyn Persistent>> {
        let entity = self
            .entities
            .write()
            .remove(&label)
            .ok_or(CoreError::EntityNotFound { label })?;
        self.journal.emit(entity.key(), ChangeKind::Removed, None);
        Ok(entity)
    }

    /// Returns all registered labels in ascending order.
    pub fn labels(&self) -> Vec<EntityLabel> {
        let mut labels: Vec<EntityLabel> = self.entities.read().keys().copied().collect();
        labels.sort_unstable();
        labels
    }

    /// Returns the number of registered entities.
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Returns true if no entity is registered.
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }

    /// Activates every registered entity. Returns how many were processed.
    ///
    /// Stops at the first entity that fails to activate.
    pub fn activate_all(&self, for_write: bool) -> CoreResult<usize> {
        let entities: Vec<Arc<dyn Persistent>> = self.entities.read().values().cloned().collect();
        for entity in &entities {
            ensure_activated(entity.as_ref(), for_write)?;
        }
        Ok(entities.len())
    }

    // === Transactions ===

    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// - `NotTransactional` if the model was configured without transactions.
    /// - `TransactionInProgress` if one is already open.
    pub fn begin(&self) -> CoreResult<Arc<Transaction>> {
        if !self.config.transactional {
            return Err(CoreError::NotTransactional);
        }
        let txn = self.txn_manager.begin()?;
        self.stats.record_transaction_start();
        Ok(txn)
    }

    /// Commits the open transaction.
    pub fn commit(&self) -> CoreResult<TransactionId> {
        let txn = self.txn_manager.commit()?;
        self.stats.record_transaction_commit(txn.len());
        Ok(txn.id())
    }

    /// Rolls back the open transaction.
    pub fn rollback(&self) -> CoreResult<TransactionId> {
        let txn = self.txn_manager.rollback()?;
        self.stats.record_transaction_rollback();
        Ok(txn.id())
    }

    /// Executes a function within a transaction.
    ///
    /// If the function returns `Ok`, the transaction is committed.
    /// If it returns `Err`, the transaction is rolled back and the error
    /// returned.
    pub fn transaction<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&Arc<Transaction>) -> CoreResult<T>,
    {
        let txn = self.begin()?;
        match f(&txn) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback() {
                    warn!(txid = %txn.id(), error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Reverts the most recently committed transaction.
    pub fn undo(&self) -> CoreResult<TransactionId> {
        let txn = self.txn_manager.undo()?;
        self.stats.record_undo();
        Ok(txn.id())
    }

    /// Re-applies the most recently undone transaction.
    pub fn redo(&self) -> CoreResult<TransactionId> {
        let txn = self.txn_manager.redo()?;
        self.stats.record_redo();
        Ok(txn.id())
    }

    /// Returns true if a committed transaction can be undone.
    pub fn can_undo(&self) -> bool {
        self.txn_manager.can_undo()
    }

    /// Returns true if an undone transaction can be redone.
    pub fn can_redo(&self) -> bool {
        self.txn_manager.can_redo()
    }

    // === Observation ===

    /// Subscribes to the model-wide change journal.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.journal.subscribe()
    }

    /// Returns the change journal.
    pub fn journal(&self) -> &ChangeJournal {
        &self.journal
    }

    /// Returns a snapshot of the model statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Model for GraphModel {
    fn id(&self) -> ModelId {
        self.id
    }

    fn activate(&self, entity: &dyn Persistent, mode: ActivationMode) -> bool {
        let label = entity.label();
        if entity.core().model_id() != self.id {
            warn!(entity = %label, "refusing to activate entity of another model");
            self.stats.record_decline();
            return false;
        }

        match entity.materialize(mode) {
            Ok(()) => {
                debug!(entity = %label, kind = entity.kind(), ?mode, "materialized");
                self.stats.record_activation(mode);
                true
            }
            Err(err) => {
                warn!(entity = %label, kind = entity.kind(), ?mode, error = %err, "materialization failed");
                self.stats.record_decline();
                false
            }
        }
    }

    fn is_transactional(&self) -> bool {
        self.config.transactional
    }

    fn current_transaction(&self) -> Option<Arc<Transaction>> {
        self.txn_manager.current()
    }

    fn property_changed(&self, entity: &EntityKey, property: &str) {
        self.stats.record_property_change();
        self.journal
            .emit(*entity, ChangeKind::Modified, Some(property));
    }
}

impl fmt::Debug for GraphModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphModel")
            .field("id", &self.id)
            .field("entities", &self.len())
            .field("transactional", &self.config.transactional)
            .finish()
    }
}
