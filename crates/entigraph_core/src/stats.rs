//! Model statistics.
//!
//! Counters for activation and transaction activity of a model.
//!
//! # Usage
//!
//! ```rust,ignore
//! let model = GraphModel::in_memory();
//!
//! // Perform operations...
//!
//! let stats = model.stats();
//! println!("Activations: {}", stats.activations);
//! println!("Commits: {}", stats.transactions_committed);
//! ```

use crate::entity::ActivationMode;
use std::sync::atomic::{AtomicU64, Ordering};

/// Model statistics.
///
/// All counters are atomic and can be read while operations are in progress.
/// Values are monotonically increasing.
#[derive(Debug, Default)]
pub struct ModelStats {
    // Activation counters
    /// Successful read activations.
    read_activations: AtomicU64,
    /// Successful write activations (initial or upgrade).
    write_activations: AtomicU64,
    /// Activations the model declined.
    activations_declined: AtomicU64,

    // Change counters
    /// Property change notifications observed (applied or reverted).
    property_changes: AtomicU64,

    // Transaction counters
    /// Total number of transactions started.
    transactions_started: AtomicU64,
    /// Total number of transactions committed.
    transactions_committed: AtomicU64,
    /// Total number of transactions rolled back.
    transactions_rolled_back: AtomicU64,
    /// Reversible actions in committed transactions.
    actions_committed: AtomicU64,
    /// Undo operations.
    undos: AtomicU64,
    /// Redo operations.
    redos: AtomicU64,
}

impl ModelStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful activation.
    pub(crate) fn record_activation(&self, mode: ActivationMode) {
        match mode {
            ActivationMode::Read => self.read_activations.fetch_add(1, Ordering::Relaxed),
            ActivationMode::ReadWrite => self.write_activations.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Records a declined activation.
    pub(crate) fn record_decline(&self) {
        self.activations_declined.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a property change notification.
    pub(crate) fn record_property_change(&self) {
        self.property_changes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a transaction start.
    pub(crate) fn record_transaction_start(&self) {
        self.transactions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a transaction commit with its action count.
    pub(crate) fn record_transaction_commit(&self, actions: usize) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
        self.actions_committed
            .fetch_add(actions as u64, Ordering::Relaxed);
    }

    /// Records a transaction rollback.
    pub(crate) fn record_transaction_rollback(&self) {
        self.transactions_rolled_back
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Records an undo.
    pub(crate) fn record_undo(&self) {
        self.undos.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a redo.
    pub(crate) fn record_redo(&self) {
        self.redos.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            read_activations: self.read_activations.load(Ordering::Relaxed),
            write_activations: self.write_activations.load(Ordering::Relaxed),
            activations_declined: self.activations_declined.load(Ordering::Relaxed),
            property_changes: self.property_changes.load(Ordering::Relaxed),
            transactions_started: self.transactions_started.load(Ordering::Relaxed),
            transactions_committed: self.transactions_committed.load(Ordering::Relaxed),
            transactions_rolled_back: self.transactions_rolled_back.load(Ordering::Relaxed),
            actions_committed: self.actions_committed.load(Ordering::Relaxed),
            undos: self.undos.load(Ordering::Relaxed),
            redos: self.redos.load(Ordering::Relaxed),
        }
    }
}

/// A snapshot of model statistics at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Successful read activations.
    pub read_activations: u64,
    /// Successful write activations (initial or upgrade).
    pub write_activations: u64,
    /// Activations the model declined.
    pub activations_declined: u64,
    /// Property change notifications observed.
    pub property_changes: u64,
    /// Transactions started.
    pub transactions_started: u64,
    /// Transactions committed.
    pub transactions_committed: u64,
    /// Transactions rolled back.
    pub transactions_rolled_back: u64,
    /// Reversible actions in committed transactions.
    pub actions_committed: u64,
    /// Undo operations.
    pub undos: u64,
    /// Redo operations.
    pub redos: u64,
}

impl StatsSnapshot {
    /// Returns total successful activations of either degree.
    pub fn activations(&self) -> u64 {
        self.read_activations + self.write_activations
    }
}
