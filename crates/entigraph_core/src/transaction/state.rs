//! Transaction state.

use crate::error::{CoreError, CoreResult};
use crate::transaction::action::ReversibleAction;
use crate::types::{OrderingKey, TransactionId};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is open and accepts reversible actions.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// A reversible action together with its registration position.
struct Recorded {
    seq: u64,
    action: Arc<dyn ReversibleAction>,
}

struct Inner {
    state: TransactionState,
    next_seq: u64,
    actions: Vec<Recorded>,
}

/// A batch of reversible actions.
///
/// Actions are registered while the transaction is active. The batch is
/// replayed in registration order and reverted in reverse registration
/// order, so several changes to one property always restore the value that
/// preceded the first of them. Ordering keys travel with each action for
/// consumers that sequence work across entities; see
/// [`ordered_actions`](Self::ordered_actions). Registration is serialized
/// internally, so a transaction can be shared between threads behind an
/// `Arc`.
pub struct Transaction {
    id: TransactionId,
    inner: Mutex<Inner>,
}

impl Transaction {
    /// Creates a new active transaction.
    pub(crate) fn new(id: TransactionId) -> Self {
        Self {
            id,
            inner: Mutex::new(Inner {
                state: TransactionState::Active,
                next_seq: 0,
                actions: Vec::new(),
            }),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.inner.lock().state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == TransactionState::Active
    }

    /// Ensures the transaction is active.
    pub fn ensure_active(&self) -> CoreResult<()> {
        match self.state() {
            TransactionState::Active => Ok(()),
            TransactionState::Committed | TransactionState::RolledBack => {
                Err(CoreError::TransactionNotActive { id: self.id })
            }
        }
    }

    /// Records one reversible action.
    ///
    /// The action's effect must already have been applied by the caller.
    pub fn add_reversible_action(&self, action: Arc<dyn ReversibleAction>) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != TransactionState::Active {
            return Err(CoreError::TransactionNotActive { id: self.id });
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.actions.push(Recorded { seq, action });
        Ok(())
    }

    /// Returns the recorded actions in registration order.
    pub fn actions(&self) -> Vec<Arc<dyn ReversibleAction>> {
        self.inner
            .lock()
            .actions
            .iter()
            .map(|r| Arc::clone(&r.action))
            .collect()
    }

    /// Returns the recorded actions sorted by `(ordering key, registration
    /// order)`.
    ///
    /// This is a view for inspection; replay and revert follow registration
    /// order.
    pub fn ordered_actions(&self) -> Vec<Arc<dyn ReversibleAction>> {
        let inner = self.inner.lock();
        let mut keyed: Vec<(OrderingKey, u64, &Arc<dyn ReversibleAction>)> = inner
            .actions
            .iter()
            .map(|r| (r.action.ordering_key(), r.seq, &r.action))
            .collect();
        keyed.sort_by_key(|(key, seq, _)| (*key, *seq));
        keyed.into_iter().map(|(_, _, a)| Arc::clone(a)).collect()
    }

    /// Returns the number of recorded actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().actions.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().actions.is_empty()
    }

    /// Applies every action in registration order.
    ///
    /// Runs without holding the transaction lock.
    pub(crate) fn apply_all(&self) {
        for action in self.actions() {
            action.apply();
        }
    }

    /// Reverts every action, most recent first.
    ///
    /// Runs without holding the transaction lock.
    pub(crate) fn revert_all(&self) {
        for action in self.actions().into_iter().rev() {
            action.revert();
        }
    }

    /// Marks the transaction as committed.
    pub(crate) fn mark_committed(&self) {
        self.inner.lock().state = TransactionState::Committed;
    }

    /// Marks the transaction as rolled back.
    pub(crate) fn mark_rolled_back(&self) {
        self.inner.lock().state = TransactionState::RolledBack;
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("state", &inner.state)
            .field("actions", &inner.actions.len())
            .finish()
    }
}
