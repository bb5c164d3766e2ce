//! Test fixtures: entity kinds and models for exercising the core protocol.

use entigraph_core::{
    ActivationMode, CoreError, CoreResult, EntityCore, EntityKey, EntityLabel, GraphModel, Model,
    ModelConfig, ModelId, OrderingKey, Persistent, Property, Transaction, TransactionManager,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Stored values a [`Person`] is materialized from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonData {
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u32,
}

impl PersonData {
    /// Creates person data.
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }
}

/// An entity kind with two properties, loaded from [`PersonData`].
pub struct Person {
    core: EntityCore,
    name: Property<String>,
    age: Property<u32>,
    stored: Mutex<Option<PersonData>>,
    loads: AtomicUsize,
    write_loads: AtomicUsize,
    decline: AtomicBool,
}

impl Person {
    /// Property name of [`Person::name`].
    pub const NAME: &'static str = "Name";
    /// Property name of [`Person::age`].
    pub const AGE: &'static str = "Age";
    /// Ordering key used for name changes.
    pub const NAME_ORDER: OrderingKey = OrderingKey::new(1);
    /// Ordering key used for age changes.
    pub const AGE_ORDER: OrderingKey = OrderingKey::new(2);

    /// Creates a lazily activated person backed by `stored`.
    pub fn stored<M: Model + 'static>(model: &Arc<M>, label: u64, stored: PersonData) -> Arc<Self> {
        Self::build(model, label, false, Some(stored))
    }

    /// Creates a person that is already activated for read with default
    /// values.
    pub fn fresh<M: Model + 'static>(model: &Arc<M>, label: u64) -> Arc<Self> {
        Self::build(model, label, true, None)
    }

    fn build<M: Model + 'static>(
        model: &Arc<M>,
        label: u64,
        activated: bool,
        stored: Option<PersonData>,
    ) -> Arc<Self> {
        Arc::new(Self {
            core: EntityCore::new(model, EntityLabel::new(label), activated),
            name: Property::default(),
            age: Property::default(),
            stored: Mutex::new(stored),
            loads: AtomicUsize::new(0),
            write_loads: AtomicUsize::new(0),
            decline: AtomicBool::new(false),
        })
    }

    /// Returns the name, activating for read first.
    pub fn name(&self) -> CoreResult<String> {
        self.ensure_activated(false)?;
        Ok(self.name.get())
    }

    /// Returns the age, activating for read first.
    pub fn age(&self) -> CoreResult<u32> {
        self.ensure_activated(false)?;
        Ok(self.age.get())
    }

    /// Changes the name through the transactional protocol.
    pub fn set_name(self: &Arc<Self>, name: impl Into<String>) -> CoreResult<()> {
        let old = self.name()?;
        self.set_value(Self::write_name, old, name.into(), Self::NAME, Self::NAME_ORDER)
    }

    /// Changes the age through the transactional protocol.
    pub fn set_age(self: &Arc<Self>, age: u32) -> CoreResult<()> {
        let old = self.age()?;
        self.set_value(Self::write_age, old, age, Self::AGE, Self::AGE_ORDER)
    }

    /// Raw name setter handed to `set_value`.
    pub fn write_name(&self, name: String) {
        self.name.set(name);
    }

    /// Raw age setter handed to `set_value`.
    pub fn write_age(&self, age: u32) {
        self.age.set(age);
    }

    /// Number of times the model materialized this person.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of write materializations among [`loads`](Self::loads).
    pub fn write_loads(&self) -> usize {
        self.write_loads.load(Ordering::SeqCst)
    }

    /// Makes subsequent materializations fail.
    pub fn set_decline(&self, decline: bool) {
        self.decline.store(decline, Ordering::SeqCst);
    }
}

impl Persistent for Person {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn materialize(&self, mode: ActivationMode) -> CoreResult<()> {
        if self.decline.load(Ordering::SeqCst) {
            return Err(CoreError::materialization(self.label(), "storage unavailable"));
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        if mode.is_write() {
            self.write_loads.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(data) = self.stored.lock().take() {
            self.name.set(data.name);
            self.age.set(data.age);
        }
        Ok(())
    }

    fn kind(&self) -> &str {
        "person"
    }
}

/// A bare [`Model`] whose behaviour is set by the test.
///
/// It never calls [`Persistent::materialize`]; activation succeeds or fails
/// according to [`set_accept`](Self::set_accept). Every call is recorded.
pub struct ScriptedModel {
    id: ModelId,
    transactional: bool,
    accept: AtomicBool,
    delay: Option<Duration>,
    calls: Mutex<Vec<(EntityLabel, ActivationMode)>>,
    changes: Mutex<Vec<(EntityLabel, String)>>,
    transactions: TransactionManager,
}

impl ScriptedModel {
    /// Creates a model that accepts every activation.
    pub fn new(transactional: bool) -> Arc<Self> {
        Arc::new(Self::build(transactional, None))
    }

    /// Creates a model that sleeps for `delay` inside every activation.
    pub fn with_delay(transactional: bool, delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(transactional, Some(delay)))
    }

    fn build(transactional: bool, delay: Option<Duration>) -> Self {
        Self {
            id: ModelId::new(),
            transactional,
            accept: AtomicBool::new(true),
            delay,
            calls: Mutex::new(Vec::new()),
            changes: Mutex::new(Vec::new()),
            transactions: TransactionManager::new(0),
        }
    }

    /// Sets whether activations succeed.
    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    /// Returns all activation requests, in arrival order.
    pub fn activation_calls(&self) -> Vec<(EntityLabel, ActivationMode)> {
        self.calls.lock().clone()
    }

    /// Returns the number of activation requests for `label` in `mode`.
    pub fn calls_for(&self, label: u64, mode: ActivationMode) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(l, m)| *l == EntityLabel::new(label) && *m == mode)
            .count()
    }

    /// Returns the property-change notifications the model received.
    pub fn changes(&self) -> Vec<(EntityLabel, String)> {
        self.changes.lock().clone()
    }

    /// Opens a transaction.
    pub fn begin(&self) -> CoreResult<Arc<Transaction>> {
        self.transactions.begin()
    }

    /// Commits the open transaction.
    pub fn commit(&self) -> CoreResult<Arc<Transaction>> {
        self.transactions.commit()
    }

    /// Rolls back the open transaction.
    pub fn rollback(&self) -> CoreResult<Arc<Transaction>> {
        self.transactions.rollback()
    }
}

impl Model for ScriptedModel {
    fn id(&self) -> ModelId {
        self.id
    }

    fn activate(&self, entity: &dyn Persistent, mode: ActivationMode) -> bool {
        self.calls.lock().push((entity.label(), mode));
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.accept.load(Ordering::SeqCst)
    }

    fn is_transactional(&self) -> bool {
        self.transactional
    }

    fn current_transaction(&self) -> Option<Arc<Transaction>> {
        self.transactions.current()
    }

    fn property_changed(&self, entity: &EntityKey, property: &str) {
        self.changes.lock().push((entity.label, property.to_owned()));
    }
}

/// Creates a transactional in-memory model with `people` registered.
///
/// Labels are assigned from 1 in slice order; every person is lazy.
///
/// # Panics
///
/// Panics if a person cannot be registered.
pub fn model_with_people(people: &[PersonData]) -> (Arc<GraphModel>, Vec<Arc<Person>>) {
    model_with_people_config(ModelConfig::default(), people)
}

/// Like [`model_with_people`], with an explicit configuration.
pub fn model_with_people_config(
    config: ModelConfig,
    people: &[PersonData],
) -> (Arc<GraphModel>, Vec<Arc<Person>>) {
    let model = GraphModel::new(config);
    let entities: Vec<_> = people
        .iter()
        .enumerate()
        .map(|(i, data)| Person::stored(&model, i as u64 + 1, data.clone()))
        .collect();
    for person in &entities {
        model
            .register(Arc::clone(person) as Arc<dyn Persistent>)
            .expect("Failed to register fixture person");
    }
    (model, entities)
}

/// A small cast of people for tests.
pub fn sample_people() -> Vec<PersonData> {
    vec![
        PersonData::new("Ada", 36),
        PersonData::new("Grace", 45),
        PersonData::new("Linus", 21),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use entigraph_core::ActivationStatus;

    #[test]
    fn person_loads_on_first_read() {
        let (model, people) = model_with_people(&sample_people());
        let ada = &people[0];

        assert_eq!(ada.loads(), 0);
        assert_eq!(ada.name().unwrap(), "Ada");
        assert_eq!(ada.age().unwrap(), 36);
        assert_eq!(ada.loads(), 1);
        assert_eq!(model.stats().read_activations, 1);
    }

    #[test]
    fn person_setters_use_their_ordering_keys() {
        let (model, people) = model_with_people(&sample_people());
        let txn = model.begin().unwrap();

        people[0].set_age(37).unwrap();
        people[0].set_name("Ada L.").unwrap();

        let ordered = txn.ordered_actions();
        assert_eq!(ordered[0].property(), Person::NAME);
        assert_eq!(ordered[1].property(), Person::AGE);
        model.commit().unwrap();
    }

    #[test]
    fn declined_person_stays_unloaded() {
        let (_model, people) = model_with_people(&sample_people());
        people[1].set_decline(true);

        assert!(people[1].name().is_err());
        assert_eq!(
            people[1].activation_status().unwrap(),
            ActivationStatus::NotActivated
        );
    }

    #[test]
    fn scripted_model_records_calls() {
        let model = ScriptedModel::new(false);
        let person = Person::stored(&model, 3, PersonData::new("X", 1));

        person.ensure_activated(true).unwrap();

        assert_eq!(model.calls_for(3, ActivationMode::ReadWrite), 1);
        assert_eq!(model.calls_for(3, ActivationMode::Read), 0);
        // Scripted activation does not load stored data.
        assert_eq!(person.loads(), 0);
        assert_eq!(person.name().unwrap(), "");
    }

    #[test]
    fn every_fixture_person_is_registered() {
        let config = ModelConfig::default().activate_on_register(true);
        let (model, people) = model_with_people_config(config, &sample_people());

        assert_eq!(model.len(), people.len());
        for person in &people {
            assert!(model.contains(person.label()));
            assert_eq!(person.loads(), 1);
        }
    }
}
