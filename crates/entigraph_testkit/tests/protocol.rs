//! Integration tests for activation and transactional mutation.

use entigraph_core::{
    ensure_activated, ActivationMode, ActivationStatus, ChangeKind, CoreError, EntityKey,
    GraphModel, Model, OrderingKey, Persistent,
};
use entigraph_testkit::prelude::*;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn name_log(person: &Person) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    person.subscribe(Person::NAME, move |_: &EntityKey, property: &str| {
        sink.lock().push(property.to_owned());
    });
    log
}

#[test]
fn rename_then_undo_end_to_end() {
    let model = GraphModel::in_memory();
    let e = Person::stored(&model, 7, PersonData::new("X", 40));
    model
        .register(Arc::clone(&e) as Arc<dyn Persistent>)
        .unwrap();
    let notifications = name_log(&e);

    e.ensure_activated(true).unwrap();
    assert_eq!(
        e.activation_status().unwrap(),
        ActivationStatus::ActivatedReadWrite
    );

    let txn = model.begin().unwrap();
    e.set_value(
        Person::write_name,
        "X".to_owned(),
        "Y".to_owned(),
        Person::NAME,
        OrderingKey::new(1),
    )
    .unwrap();
    assert_eq!(e.name().unwrap(), "Y");

    let actions = txn.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].entity(), e.key());
    assert_eq!(actions[0].change_kind(), ChangeKind::Modified);
    assert_eq!(actions[0].ordering_key(), OrderingKey::new(1));

    actions[0].revert();
    assert_eq!(e.name().unwrap(), "X");
    assert_eq!(*notifications.lock(), vec![Person::NAME, Person::NAME]);

    actions[0].apply();
    assert_eq!(e.name().unwrap(), "Y");
    assert_eq!(notifications.lock().len(), 3);
}

#[test]
fn concurrent_read_activation_calls_model_once() {
    let model = ScriptedModel::with_delay(false, Duration::from_millis(5));
    let person = Person::stored(&model, 1, PersonData::new("X", 1));
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let person = Arc::clone(&person);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..10 {
                    person.ensure_activated(false).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(model.activation_calls().len(), 1);
    assert_eq!(
        person.activation_status().unwrap(),
        ActivationStatus::ActivatedRead
    );
}

#[test]
fn status_never_regresses() {
    let model = ScriptedModel::new(false);
    let person = Person::stored(&model, 1, PersonData::new("X", 1));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let writer = {
        let person = Arc::clone(&person);
        thread::spawn(move || {
            person.ensure_activated(false).unwrap();
            person.ensure_activated(true).unwrap();
        })
    };
    let observer = {
        let person = Arc::clone(&person);
        let seen = Arc::clone(&seen);
        thread::spawn(move || {
            for _ in 0..1_000 {
                seen.lock().push(person.activation_status().unwrap());
            }
        })
    };
    writer.join().unwrap();
    observer.join().unwrap();

    let seen = seen.lock();
    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(
        person.activation_status().unwrap(),
        ActivationStatus::ActivatedReadWrite
    );
}

#[test]
fn custom_initializer_runs_once_across_threads() {
    let model = ScriptedModel::new(false);
    let person = Person::stored(&model, 1, PersonData::new("X", 1));
    let runs = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let person = Arc::clone(&person);
            let runs = Arc::clone(&runs);
            thread::spawn(move || {
                person
                    .ensure_activated_once(|| {
                        runs.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap()
            })
        })
        .collect();
    let ran: usize = handles
        .into_iter()
        .map(|h| usize::from(h.join().unwrap()))
        .sum();

    assert_eq!(ran, 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(model.activation_calls().is_empty());
}

#[test]
fn declined_activation_leaves_status() {
    let model = ScriptedModel::new(false);
    let person = Person::fresh(&model, 1);
    model.set_accept(false);

    let err = person.ensure_activated(true).unwrap_err();
    assert!(matches!(
        err,
        CoreError::ActivationDeclined {
            mode: ActivationMode::ReadWrite,
            ..
        }
    ));
    assert_eq!(
        person.activation_status().unwrap(),
        ActivationStatus::ActivatedRead
    );

    model.set_accept(true);
    person.ensure_activated(true).unwrap();
    assert_eq!(model.calls_for(1, ActivationMode::ReadWrite), 2);
}

#[test]
fn mutation_through_scripted_model() {
    let model = ScriptedModel::new(true);
    let person = Person::fresh(&model, 4);
    let txn = model.begin().unwrap();

    person.set_name("Y").unwrap();
    person.set_age(3).unwrap();

    assert_eq!(txn.len(), 2);
    assert_eq!(
        model.changes(),
        vec![
            (person.label(), Person::NAME.to_owned()),
            (person.label(), Person::AGE.to_owned()),
        ]
    );

    model.rollback().unwrap();
    assert_eq!(person.name().unwrap(), "");
    assert_eq!(person.age().unwrap(), 0);
    assert_eq!(model.changes().len(), 4);
}

#[test]
fn missing_transaction_is_fatal_and_changes_nothing() {
    let model = ScriptedModel::new(true);
    let person = Person::fresh(&model, 1);
    let notifications = name_log(&person);

    let err = person.set_name("Y").unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(err, CoreError::MutationOutsideTransaction { .. }));
    assert_eq!(person.name().unwrap(), "");
    assert!(notifications.lock().is_empty());
    assert!(model.changes().is_empty());
}

#[test]
fn non_transactional_model_records_nothing() {
    let model = ScriptedModel::new(false);
    let person = Person::fresh(&model, 1);
    let notifications = name_log(&person);

    person.set_name("Y").unwrap();

    assert_eq!(person.name().unwrap(), "Y");
    assert_eq!(notifications.lock().len(), 1);
    assert!(model.current_transaction().is_none());
}

#[test]
fn handles_with_same_label_and_model_are_equal() {
    let model = ScriptedModel::new(false);
    let other = ScriptedModel::new(false);
    let a: Arc<dyn Persistent> = Person::fresh(&model, 1);
    let b: Arc<dyn Persistent> = Person::stored(&model, 1, PersonData::new("Z", 9));
    let c: Arc<dyn Persistent> = Person::fresh(&model, 2);
    let d: Arc<dyn Persistent> = Person::fresh(&other, 1);

    assert!(*a == *b);
    assert!(*a != *c);
    assert!(*a != *d);

    let unique: HashSet<_> = [a, b, c, d].into_iter().collect();
    assert_eq!(unique.len(), 3);
}

#[test]
fn dyn_entities_activate_through_free_function() {
    let (model, people) = model_with_people(&sample_people());
    let entity = model.require(people[2].label()).unwrap();

    ensure_activated(entity.as_ref(), true).unwrap();

    assert_eq!(people[2].loads(), 1);
    assert_eq!(people[2].write_loads(), 1);
    assert_eq!(people[2].name().unwrap(), "Linus");
}

#[test]
fn redo_after_undo_restores_values() {
    let (model, people) = model_with_people(&sample_people());
    let grace = &people[1];

    model
        .transaction(|_| {
            grace.set_name("Grace H.")?;
            grace.set_age(46)
        })
        .unwrap();
    model.undo().unwrap();
    assert_eq!(grace.name().unwrap(), "Grace");
    assert_eq!(grace.age().unwrap(), 45);

    model.redo().unwrap();
    assert_eq!(grace.name().unwrap(), "Grace H.");
    assert_eq!(grace.age().unwrap(), 46);
}

#[test]
fn failed_closure_rolls_back() {
    let (model, people) = model_with_people(&sample_people());
    let ada = &people[0];
    people[1].set_decline(true);

    let result = model.transaction(|_| {
        ada.set_name("Countess")?;
        people[1].set_name("unreachable")
    });

    assert!(result.is_err());
    assert_eq!(ada.name().unwrap(), "Ada");
    assert!(model.current_transaction().is_none());
    assert!(!model.can_undo());
}
