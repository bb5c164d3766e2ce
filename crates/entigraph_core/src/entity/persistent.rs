//! The `Persistent` trait implemented by every entity kind.

use crate::entity::activation::{ActivationMode, ActivationStatus, Transition};
use crate::entity::base::EntityCore;
use crate::entity::mutation;
use crate::error::{CoreError, CoreResult};
use crate::notify::{ListenerId, PropertyListener};
use crate::types::{EntityKey, EntityLabel, OrderingKey};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, warn};

/// An addressable unit of persistent, lazily loaded state.
///
/// Each entity kind supplies its own [`materialize`](Self::materialize)
/// routine; models call it from [`Model::activate`](crate::Model::activate).
/// Everything else (activation, mutation, identity) is provided.
///
/// # Example
///
/// ```rust,ignore
/// struct Person {
///     core: EntityCore,
///     name: Property<String>,
/// }
///
/// impl Persistent for Person {
///     fn core(&self) -> &EntityCore {
///         &self.core
///     }
///
///     fn materialize(&self, _mode: ActivationMode) -> CoreResult<()> {
///         Ok(())
///     }
/// }
///
/// impl Person {
///     fn set_name(self: &Arc<Self>, name: String) -> CoreResult<()> {
///         let old = self.name.get();
///         self.set_value(|p: &Person, v| p.name.set(v), old, name, "Name", OrderingKey::new(1))
///     }
/// }
/// ```
pub trait Persistent: Send + Sync {
    /// Returns the shared entity state.
    fn core(&self) -> &EntityCore;

    /// Loads this entity's data for the requested degree.
    ///
    /// Called by the model at most once per entity for the initial
    /// activation. A `ReadWrite` request on an entity already loaded for
    /// reading may arrive more than once and must be idempotent.
    fn materialize(&self, mode: ActivationMode) -> CoreResult<()>;

    /// Short name of the entity kind, used in diagnostics.
    fn kind(&self) -> &str {
        "entity"
    }

    /// Returns the entity label.
    fn label(&self) -> EntityLabel {
        self.core().label()
    }

    /// Returns the value identity of this entity.
    fn key(&self) -> EntityKey {
        self.core().key()
    }

    /// Returns the current activation status.
    fn activation_status(&self) -> CoreResult<ActivationStatus> {
        self.core().status()
    }

    /// Registers a change listener for one property.
    fn subscribe<L>(&self, property: &str, listener: L) -> ListenerId
    where
        Self: Sized,
        L: PropertyListener + 'static,
    {
        self.core().subscribe(property, listener)
    }

    /// Ensures the entity is activated for read, or for write.
    ///
    /// See [`ensure_activated`].
    fn ensure_activated(&self, for_write: bool) -> CoreResult<()>
    where
        Self: Sized,
    {
        ensure_activated(self, for_write)
    }

    /// Runs a one-time custom initializer instead of a model activation.
    ///
    /// See [`ensure_activated_once`].
    fn ensure_activated_once<F>(&self, init: F) -> CoreResult<bool>
    where
        Self: Sized,
        F: FnOnce(),
    {
        ensure_activated_once(self, init)
    }

    /// Applies a property change through the transactional protocol.
    ///
    /// See [`mutation::set_value`].
    fn set_value<T>(
        self: &Arc<Self>,
        setter: fn(&Self, T),
        old_value: T,
        new_value: T,
        property: &str,
        ordering: OrderingKey,
    ) -> CoreResult<()>
    where
        Self: Sized + 'static,
        T: Clone + fmt::Debug + Send + Sync + 'static,
    {
        mutation::set_value(self, setter, old_value, new_value, property, ordering)
    }
}

/// Ensures `entity` is activated for read, or for write when `for_write`.
///
/// The initial activation asks the owning model exactly once even under
/// concurrent callers. An entity already loaded for reading is upgraded
/// without taking the entity lock.
///
/// # Errors
///
/// - `ActivationDeclined` if the model could not materialize the entity;
///   the status is left unchanged.
/// - `ModelReleased` if the owning model has been dropped.
/// - `InvalidActivationState` if the status is corrupted.
pub fn ensure_activated(entity: &dyn Persistent, for_write: bool) -> CoreResult<()> {
    let core = entity.core();
    if core
        .status()?
        .satisfies(ActivationMode::from_write_flag(for_write))
    {
        return Ok(());
    }

    let model = core.model()?;
    match core
        .activation()
        .ensure(for_write, |mode| model.activate(entity, mode))?
    {
        Transition::Unchanged => Ok(()),
        Transition::Advanced { from, to } => {
            debug!(
                entity = %core.label(),
                kind = entity.kind(),
                ?from,
                ?to,
                "entity activated"
            );
            Ok(())
        }
        Transition::Declined(mode) => {
            warn!(
                entity = %core.label(),
                kind = entity.kind(),
                ?mode,
                "model declined activation"
            );
            Err(CoreError::activation_declined(core.key(), mode))
        }
    }
}

/// Runs `init` once as the entity's activation, bypassing the model.
///
/// Only acts while the status is `NotActivated`; leaves it at
/// `ActivatedRead`. Returns whether `init` ran. An entity must use either
/// this path or [`ensure_activated`] for its whole lifetime, never both.
pub fn ensure_activated_once<F>(entity: &dyn Persistent, init: F) -> CoreResult<bool>
where
    F: FnOnce(),
{
    let ran = entity.core().activation().ensure_once(init)?;
    if ran {
        debug!(
            entity = %entity.label(),
            kind = entity.kind(),
            "entity activated by custom initializer"
        );
    }
    Ok(ran)
}

impl PartialEq for dyn Persistent {
    fn eq(&self, other: &Self) -> bool {
        self.core() == other.core()
    }
}

impl Eq for dyn Persistent {}

impl Hash for dyn Persistent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.core().hash(state);
    }
}

impl fmt::Debug for dyn Persistent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persistent")
            .field("kind", &self.kind())
            .field("core", self.core())
            .finish()
    }
}
