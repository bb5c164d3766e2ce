//! Transactional property mutation.

use crate::entity::persistent::{ensure_activated, Persistent};
use crate::error::{CoreError, CoreResult};
use crate::transaction::{PropertyChange, ReversibleAction};
use crate::types::OrderingKey;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Applies a property change to `entity` and makes it reversible.
///
/// 1. Upgrades the entity to write activation if it is not already there.
/// 2. On a non-transactional model, calls `setter(new_value)`, notifies
///    and returns; nothing is recorded.
/// 3. Otherwise applies the change immediately (setter, then notification)
///    and *then* registers the do/undo pair with the model's current
///    transaction. A listener that inspects the transaction from inside the
///    notification therefore sees it without this change recorded yet.
///
/// Either the value is applied (and recorded, if transactional) or nothing
/// observable changes.
///
/// # Errors
///
/// - `MutationOutsideTransaction` if the model is transactional but has no
///   current transaction. This is a protocol violation by the caller.
/// - `TransactionNotActive` if the current transaction was already
///   finished.
/// - Any activation error from [`ensure_activated`].
pub fn set_value<E, T>(
    entity: &Arc<E>,
    setter: fn(&E, T),
    old_value: T,
    new_value: T,
    property: &str,
    ordering: OrderingKey,
) -> CoreResult<()>
where
    E: Persistent + 'static,
    T: Clone + fmt::Debug + Send + Sync + 'static,
{
    let core = entity.core();
    if !core.status()?.is_writable() {
        ensure_activated(entity.as_ref(), true)?;
    }

    let model = core.model()?;
    let change = PropertyChange::new(
        Arc::clone(entity),
        property,
        setter,
        old_value,
        new_value,
        ordering,
    );

    if !model.is_transactional() {
        trace!(entity = %core.label(), property, "applying untracked change");
        change.apply();
        return Ok(());
    }

    let txn = model
        .current_transaction()
        .ok_or_else(|| CoreError::mutation_outside_transaction(core.key(), property))?;
    txn.ensure_active()?;

    trace!(
        entity = %core.label(),
        property,
        txn = %txn.id(),
        ordering = ordering.as_i64(),
        "applying tracked change"
    );
    change.apply();

    let change = Arc::new(change);
    if let Err(err) = txn.add_reversible_action(Arc::clone(&change) as Arc<dyn ReversibleAction>) {
        // The transaction finished between the check and the registration.
        change.revert();
        return Err(err);
    }
    Ok(())
}
