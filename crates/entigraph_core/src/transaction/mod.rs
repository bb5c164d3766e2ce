//! Transactions over reversible property changes.
//!
//! A transaction collects the do/undo records produced by
//! [`set_value`](crate::set_value) so the whole batch can later be rolled
//! back, undone or redone:
//! - **Rollback**: reverts an open transaction and discards it
//! - **Undo**: reverts the most recent committed transaction
//! - **Redo**: re-applies the most recently undone transaction
//!
//! Changes are never deferred: a record is registered only after its
//! do-effect has already been applied.

mod action;
mod manager;
mod state;

pub use action::{PropertyChange, ReversibleAction};
pub use manager::TransactionManager;
pub use state::{Transaction, TransactionState};
