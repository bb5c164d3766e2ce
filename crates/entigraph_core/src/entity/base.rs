//! State shared by every entity kind.

use crate::entity::activation::{ActivationCell, ActivationStatus};
use crate::error::{CoreError, CoreResult};
use crate::model::Model;
use crate::notify::{ListenerId, Listeners, PropertyListener};
use crate::types::{EntityKey, EntityLabel, ModelId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// Identity, model back-reference, activation status and listeners of one
/// entity.
///
/// Concrete entity kinds embed an `EntityCore` and expose it through
/// [`Persistent::core`](crate::Persistent::core).
///
/// # Equality
///
/// Two cores are equal iff they carry the same label and belong to the same
/// model. The hash covers the label only: entities with the same label in
/// different models collide but still compare unequal. Collections normally
/// hold entities of a single model, where the label alone is a perfect hash.
pub struct EntityCore {
    label: EntityLabel,
    model_id: ModelId,
    model: Weak<dyn Model>,
    activation: ActivationCell,
    listeners: Listeners,
}

impl EntityCore {
    /// Creates the core of an entity owned by `model`.
    ///
    /// `activated` seeds the status as `ActivatedRead`, for entities created
    /// in memory rather than hydrated lazily.
    pub fn new<M>(model: &Arc<M>, label: EntityLabel, activated: bool) -> Self
    where
        M: Model + 'static,
    {
        let model_id = model.id();
        let model: Weak<M> = Arc::downgrade(model);
        Self::from_parts(model, model_id, label, activated)
    }

    /// Creates a core from a type-erased model handle.
    pub fn with_model(model: &Arc<dyn Model>, label: EntityLabel, activated: bool) -> Self {
        Self::from_parts(Arc::downgrade(model), model.id(), label, activated)
    }

    fn from_parts(
        model: Weak<dyn Model>,
        model_id: ModelId,
        label: EntityLabel,
        activated: bool,
    ) -> Self {
        Self {
            label,
            model_id,
            model,
            activation: ActivationCell::new(activated),
            listeners: Listeners::new(),
        }
    }

    /// Returns the entity label.
    #[must_use]
    pub fn label(&self) -> EntityLabel {
        self.label
    }

    /// Returns the ID of the owning model.
    #[must_use]
    pub fn model_id(&self) -> ModelId {
        self.model_id
    }

    /// Returns the value identity of this entity.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.model_id, self.label)
    }

    /// Returns the owning model.
    ///
    /// # Errors
    ///
    /// Returns `ModelReleased` if the model has been dropped.
    pub fn model(&self) -> CoreResult<Arc<dyn Model>> {
        self.model
            .upgrade()
            .ok_or_else(|| CoreError::ModelReleased { entity: self.key() })
    }

    /// Returns the current activation status.
    pub fn status(&self) -> CoreResult<ActivationStatus> {
        self.activation.status()
    }

    /// Returns the activation cell.
    pub fn activation(&self) -> &ActivationCell {
        &self.activation
    }

    /// Returns the listener list.
    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    /// Registers a listener for one property of this entity.
    pub fn subscribe<L>(&self, property: impl Into<String>, listener: L) -> ListenerId
    where
        L: PropertyListener + 'static,
    {
        self.listeners.subscribe(property, listener)
    }

    /// Fires the change notification for `property`.
    ///
    /// Entity listeners run first, in registration order, then the owning
    /// model is told (if it is still alive).
    pub fn notify(&self, property: &str) {
        let key = self.key();
        self.listeners.notify(&key, property);
        if let Some(model) = self.model.upgrade() {
            model.property_changed(&key, property);
        }
    }
}

impl PartialEq for EntityCore {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || (self.label == other.label && self.model_id == other.model_id)
    }
}

impl Eq for EntityCore {}

impl Hash for EntityCore {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}

impl fmt::Debug for EntityCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCore")
            .field("label", &self.label)
            .field("model", &self.model_id)
            .field("status", &self.activation.status().ok())
            .finish()
    }
}
