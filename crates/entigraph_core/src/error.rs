//! Error types for EntiGraph core.

use crate::entity::ActivationMode;
use crate::types::{EntityKey, EntityLabel, ModelId, TransactionId};
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in EntiGraph core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The activation status byte holds a value outside the defined states.
    ///
    /// This indicates corrupted internal state and is never recoverable.
    #[error("invalid activation state: {value}")]
    InvalidActivationState {
        /// The raw status value that was observed.
        value: u8,
    },

    /// A property was mutated on a transactional model with no open transaction.
    #[error("mutation outside a transaction: property `{property}` of {entity}")]
    MutationOutsideTransaction {
        /// The entity whose property was being set.
        entity: EntityKey,
        /// The change-notification key of the property.
        property: String,
    },

    /// The model could not materialize the entity.
    #[error("activation declined for {entity} ({mode:?})")]
    ActivationDeclined {
        /// The entity that failed to activate.
        entity: EntityKey,
        /// The requested activation degree.
        mode: ActivationMode,
    },

    /// The owning model has been dropped while the entity is still in use.
    #[error("model released: entity {entity} outlived its model")]
    ModelReleased {
        /// The orphaned entity.
        entity: EntityKey,
    },

    /// An entity was handed to a model that does not own it.
    #[error("entity {entity} does not belong to model {model}")]
    ForeignEntity {
        /// The entity.
        entity: EntityKey,
        /// The model it was handed to.
        model: ModelId,
    },

    /// A label is already registered in the model.
    #[error("duplicate label: {label}")]
    DuplicateLabel {
        /// The conflicting label.
        label: EntityLabel,
    },

    /// No entity is registered under the label.
    #[error("entity not found: {label}")]
    EntityNotFound {
        /// The label that was looked up.
        label: EntityLabel,
    },

    /// The transaction has already been committed or rolled back.
    #[error("transaction {id} is not active")]
    TransactionNotActive {
        /// The transaction.
        id: TransactionId,
    },

    /// A transaction is already open on the model.
    #[error("transaction {id} is already in progress")]
    TransactionInProgress {
        /// The open transaction.
        id: TransactionId,
    },

    /// Commit or rollback was requested with no open transaction.
    #[error("no transaction in progress")]
    NoTransaction,

    /// The model was configured without transactions.
    #[error("model is not transactional")]
    NotTransactional,

    /// The undo history is empty.
    #[error("nothing to undo")]
    NothingToUndo,

    /// The redo history is empty.
    #[error("nothing to redo")]
    NothingToRedo,

    /// An entity kind failed to load its data.
    #[error("materialization failed for {label}: {message}")]
    Materialization {
        /// The entity being loaded.
        label: EntityLabel,
        /// Description of the failure.
        message: String,
    },

    /// JSON document error.
    #[error("document error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Creates a mutation-outside-transaction error.
    pub fn mutation_outside_transaction(entity: EntityKey, property: impl Into<String>) -> Self {
        Self::MutationOutsideTransaction {
            entity,
            property: property.into(),
        }
    }

    /// Creates an activation declined error.
    pub fn activation_declined(entity: EntityKey, mode: ActivationMode) -> Self {
        Self::ActivationDeclined { entity, mode }
    }

    /// Creates a materialization error.
    pub fn materialization(label: EntityLabel, message: impl Into<String>) -> Self {
        Self::Materialization {
            label,
            message: message.into(),
        }
    }

    /// Returns true for protocol violations by the calling code.
    ///
    /// Fatal errors must never be swallowed or retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidActivationState { .. } | Self::MutationOutsideTransaction { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> EntityKey {
        EntityKey::new(ModelId::new(), EntityLabel::new(7))
    }

    #[test]
    fn protocol_violations_are_fatal() {
        assert!(CoreError::InvalidActivationState { value: 9 }.is_fatal());
        assert!(CoreError::mutation_outside_transaction(key(), "Name").is_fatal());
        assert!(!CoreError::activation_declined(key(), ActivationMode::Read).is_fatal());
        assert!(!CoreError::NoTransaction.is_fatal());
    }

    #[test]
    fn messages_name_the_entity() {
        let err = CoreError::mutation_outside_transaction(key(), "Name");
        let message = err.to_string();
        assert!(message.contains("#7"));
        assert!(message.contains("Name"));
    }
}
