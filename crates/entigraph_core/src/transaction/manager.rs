//! Transaction manager.

use crate::error::{CoreError, CoreResult};
use crate::transaction::state::Transaction;
use crate::types::TransactionId;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Manages the current transaction and the undo/redo history of a model.
///
/// The transaction manager provides:
/// - At most one open transaction at a time
/// - Rollback of the open transaction
/// - A bounded undo history of committed transactions, with redo
///
/// Effects are replayed or reverted with no manager lock held, so change
/// listeners may inspect the manager from inside a notification.
pub struct TransactionManager {
    /// Next transaction ID.
    next_txid: AtomicU64,
    /// The open transaction, if any.
    current: RwLock<Option<Arc<Transaction>>>,
    /// Committed transactions, oldest first.
    undo_stack: Mutex<VecDeque<Arc<Transaction>>>,
    /// Undone transactions, most recent last.
    redo_stack: Mutex<Vec<Arc<Transaction>>>,
    /// Maximum number of committed transactions kept for undo.
    max_undo_depth: usize,
}

impl TransactionManager {
    /// Creates a transaction manager.
    pub fn new(max_undo_depth: usize) -> Self {
        Self {
            next_txid: AtomicU64::new(1),
            current: RwLock::new(None),
            undo_stack: Mutex::new(VecDeque::new()),
            redo_stack: Mutex::new(Vec::new()),
            max_undo_depth,
        }
    }

    /// Returns the open transaction, if any.
    pub fn current(&self) -> Option<Arc<Transaction>> {
        self.current.read().clone()
    }

    /// Opens a new transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionInProgress` if one is already open.
    pub fn begin(&self) -> CoreResult<Arc<Transaction>> {
        let mut current = self.current.write();
        if let Some(open) = current.as_ref() {
            return Err(CoreError::TransactionInProgress { id: open.id() });
        }

        let txid = TransactionId::new(self.next_txid.fetch_add(1, Ordering::SeqCst));
        let txn = Arc::new(Transaction::new(txid));
        *current = Some(Arc::clone(&txn));
        debug!(%txid, "transaction started");
        Ok(txn)
    }

    /// Commits the open transaction.
    ///
    /// A non-empty transaction is pushed onto the undo history and clears
    /// the redo history.
    pub fn commit(&self) -> CoreResult<Arc<Transaction>> {
        let txn = self.take_current()?;
        txn.mark_committed();

        if !txn.is_empty() && self.max_undo_depth > 0 {
            let mut undo = self.undo_stack.lock();
            undo.push_back(Arc::clone(&txn));
            while undo.len() > self.max_undo_depth {
                undo.pop_front();
            }
            self.redo_stack.lock().clear();
        }

        debug!(txid = %txn.id(), actions = txn.len(), "transaction committed");
        Ok(txn)
    }

    /// Rolls back the open transaction, reverting every recorded action.
    pub fn rollback(&self) -> CoreResult<Arc<Transaction>> {
        let txn = self.take_current()?;
        txn.mark_rolled_back();
        txn.revert_all();
        warn!(txid = %txn.id(), actions = txn.len(), "transaction rolled back");
        Ok(txn)
    }

    /// Reverts the most recently committed transaction.
    ///
    /// # Errors
    ///
    /// - `TransactionInProgress` while a transaction is open.
    /// - `NothingToUndo` if the history is empty.
    pub fn undo(&self) -> CoreResult<Arc<Transaction>> {
        self.ensure_idle()?;
        let txn = self
            .undo_stack
            .lock()
            .pop_back()
            .ok_or(CoreError::NothingToUndo)?;
        txn.revert_all();
        self.redo_stack.lock().push(Arc::clone(&txn));
        debug!(txid = %txn.id(), "transaction undone");
        Ok(txn)
    }

    /// Re-applies the most recently undone transaction.
    ///
    /// # Errors
    ///
    /// - `TransactionInProgress` while a transaction is open.
    /// - `NothingToRedo` if nothing was undone since the last commit.
    pub fn redo(&self) -> CoreResult<Arc<Transaction>> {
        self.ensure_idle()?;
        let txn = self
            .redo_stack
            .lock()
            .pop()
            .ok_or(CoreError::NothingToRedo)?;
        txn.apply_all();
        self.undo_stack.lock().push_back(Arc::clone(&txn));
        debug!(txid = %txn.id(), "transaction redone");
        Ok(txn)
    }

    /// Returns true if a committed transaction can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.lock().is_empty()
    }

    /// Returns true if an undone transaction can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.lock().is_empty()
    }

    /// Returns the number of transactions in the undo history.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.lock().len()
    }

    fn take_current(&self) -> CoreResult<Arc<Transaction>> {
        self.current.write().take().ok_or(CoreError::NoTransaction)
    }

    fn ensure_idle(&self) -> CoreResult<()> {
        match self.current.read().as_ref() {
            Some(open) => Err(CoreError::TransactionInProgress { id: open.id() }),
            None => Ok(()),
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(100)
    }
}
