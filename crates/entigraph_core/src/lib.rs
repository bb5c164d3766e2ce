//! # EntiGraph Core
//!
//! Lazy activation and transactional mutation for in-memory entity graphs.
//!
//! This crate provides:
//! - A three-state activation state machine that materializes each entity
//!   from its model at most once, safely under concurrent access
//! - A mutation primitive that applies a property change immediately and
//!   records a reversible do/undo pair in the model's current transaction
//! - Per-entity property listeners and a model-wide change journal
//! - An in-memory [`GraphModel`] with rollback, undo and redo
//! - A JSON document source for lazily loaded [`Record`] entities
//!
//! ## Example
//!
//! ```rust
//! use entigraph_core::{load_document, GraphModel, JsonDocument, OrderingKey};
//! use serde_json::json;
//!
//! let model = GraphModel::in_memory();
//! let doc = JsonDocument::from_json(
//!     r#"{ "entities": [ { "label": 7, "properties": { "Name": "X" } } ] }"#,
//! )
//! .unwrap();
//! let records = load_document(&model, doc).unwrap();
//! let record = &records[0];
//!
//! model
//!     .transaction(|_| record.set("Name", json!("Y"), OrderingKey::new(1)))
//!     .unwrap();
//! assert_eq!(record.get("Name").unwrap(), Some(json!("Y")));
//!
//! model.undo().unwrap();
//! assert_eq!(record.get("Name").unwrap(), Some(json!("X")));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod document;
mod entity;
mod error;
mod journal;
mod model;
mod notify;
mod stats;
mod transaction;
mod types;

pub use config::ModelConfig;
pub use document::{load_document, DocumentIndex, JsonDocument, Properties, Record, RecordData};
pub use entity::{
    ensure_activated, ensure_activated_once, set_value, ActivationCell, ActivationMode,
    ActivationStatus, EntityCore, Persistent, Property, Transition,
};
pub use error::{CoreError, CoreResult};
pub use journal::{ChangeEvent, ChangeJournal};
pub use model::{GraphModel, Model};
pub use notify::{ListenerId, Listeners, PropertyListener};
pub use stats::{ModelStats, StatsSnapshot};
pub use transaction::{
    PropertyChange, ReversibleAction, Transaction, TransactionManager, TransactionState,
};
pub use types::{ChangeKind, EntityKey, EntityLabel, ModelId, OrderingKey, TransactionId};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
