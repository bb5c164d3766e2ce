//! Entities: activation, mutation and identity.

mod activation;
mod base;
mod mutation;
mod persistent;
mod property;

pub use activation::{ActivationCell, ActivationMode, ActivationStatus, Transition};
pub use base::EntityCore;
pub use mutation::set_value;
pub use persistent::{ensure_activated, ensure_activated_once, Persistent};
pub use property::Property;


#[cfg(test)]
mod tests {
    use super::testing::Sample;
    use super::*;
    use crate::config::ModelConfig;
    use crate::error::CoreError;
    use crate::model::{GraphModel, Model};
    use crate::types::{ChangeKind, EntityKey, EntityLabel, OrderingKey};
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn lazy_entity_starts_not_activated() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, false);
        assert_eq!(
            sample.activation_status().unwrap(),
            ActivationStatus::NotActivated
        );
        assert_eq!(sample.materialized(), 0);
    }

    #[test]
    fn ensure_activated_for_read_then_write() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, false);

        sample.ensure_activated(false).unwrap();
        sample.ensure_activated(false).unwrap();
        assert_eq!(sample.materialized(), 1);
        assert_eq!(
            sample.activation_status().unwrap(),
            ActivationStatus::ActivatedRead
        );

        sample.ensure_activated(true).unwrap();
        sample.ensure_activated(true).unwrap();
        assert_eq!(sample.materialized(), 2);
        assert_eq!(
            sample.activation_status().unwrap(),
            ActivationStatus::ActivatedReadWrite
        );
    }

    #[test]
    fn declined_activation_is_reported() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, false);
        sample.decline(true);

        let err = sample.ensure_activated(false).unwrap_err();
        assert!(matches!(err, CoreError::ActivationDeclined { mode: ActivationMode::Read, .. }));
        assert_eq!(
            sample.activation_status().unwrap(),
            ActivationStatus::NotActivated
        );

        sample.decline(false);
        sample.ensure_activated(false).unwrap();
        assert_eq!(sample.materialized(), 1);
    }

    #[test]
    fn released_model_is_reported() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, false);
        drop(model);

        let err = sample.ensure_activated(false).unwrap_err();
        assert!(matches!(err, CoreError::ModelReleased { .. }));
    }

    #[test]
    fn custom_activation_runs_once() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, false);
        let runs = AtomicUsize::new(0);

        assert!(sample
            .ensure_activated_once(|| {
                runs.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap());
        assert!(!sample
            .ensure_activated_once(|| {
                runs.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap());

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(sample.materialized(), 0);
        assert_eq!(
            sample.activation_status().unwrap(),
            ActivationStatus::ActivatedRead
        );
    }

    #[test]
    fn set_value_upgrades_activation() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, false);
        model.begin().unwrap();

        sample.set_text("x").unwrap();

        assert_eq!(
            sample.activation_status().unwrap(),
            ActivationStatus::ActivatedReadWrite
        );
    }

    #[test]
    fn set_value_records_reversible_action() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, true);
        let txn = model.begin().unwrap();

        sample.set_text("new").unwrap();

        assert_eq!(sample.text(), "new");
        let actions = txn.actions();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].entity(), sample.key());
        assert_eq!(actions[0].change_kind(), ChangeKind::Modified);
        assert_eq!(actions[0].ordering_key(), OrderingKey::new(1));
        assert_eq!(actions[0].property(), Sample::TEXT);

        actions[0].revert();
        assert_eq!(sample.text(), "");
        actions[0].apply();
        assert_eq!(sample.text(), "new");
    }

    #[test]
    fn set_value_outside_transaction_is_fatal() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, true);
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        sample.subscribe(Sample::TEXT, move |_: &EntityKey, _: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let err = sample.set_text("new").unwrap_err();

        assert!(matches!(err, CoreError::MutationOutsideTransaction { .. }));
        assert!(err.is_fatal());
        assert_eq!(sample.text(), "");
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn set_value_on_finished_transaction_changes_nothing() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, true);
        let txn = model.begin().unwrap();
        model.commit().unwrap();

        // Holding a stale handle does not make it current again.
        assert!(!txn.is_active());
        assert!(sample.set_text("new").is_err());
        assert_eq!(sample.text(), "");
    }

    #[test]
    fn non_transactional_model_applies_without_recording() {
        let model = GraphModel::new(ModelConfig::new().transactional(false));
        let sample = Sample::new(&model, 1, false);
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        sample.subscribe(Sample::TEXT, move |_: &EntityKey, _: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sample.set_text("new").unwrap();

        assert_eq!(sample.text(), "new");
        assert_eq!(notified.load(Ordering::SeqCst), 1);
        assert!(model.current_transaction().is_none());
        assert!(!model.can_undo());
    }

    #[test]
    fn notification_precedes_registration() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, true);
        let txn = model.begin().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let observer_txn = Arc::clone(&txn);
        let observed = Arc::clone(&seen);
        sample.subscribe(Sample::TEXT, move |_: &EntityKey, _: &str| {
            observed.lock().push(observer_txn.len());
        });

        sample.set_text("a").unwrap();
        sample.set_text("b").unwrap();

        assert_eq!(*seen.lock(), vec![0, 1]);
        assert_eq!(txn.len(), 2);
    }

    #[test]
    fn notifications_fire_on_apply_and_revert() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, true);
        let keys = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&keys);
        sample.subscribe(Sample::TEXT, move |entity: &EntityKey, property: &str| {
            log.lock().push((entity.label, property.to_owned()));
        });

        model.transaction(|_| sample.set_text("x")).unwrap();
        model.undo().unwrap();

        let keys = keys.lock();
        assert_eq!(keys.len(), 2);
        assert!(keys
            .iter()
            .all(|(label, p)| *label == EntityLabel::new(1) && p == Sample::TEXT));
    }

    #[test]
    fn equality_uses_label_and_model() {
        let model = GraphModel::in_memory();
        let other = GraphModel::in_memory();
        let a: Arc<dyn Persistent> = Sample::new(&model, 1, false);
        let b: Arc<dyn Persistent> = Sample::new(&model, 1, true);
        let c: Arc<dyn Persistent> = Sample::new(&model, 2, false);
        let d: Arc<dyn Persistent> = Sample::new(&other, 1, false);

        assert!(*a == *a);
        assert!(*a == *b);
        assert!(*a != *c);
        assert!(*a != *d);

        let set: HashSet<Arc<dyn Persistent>> = [a, b, c, d].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn concurrent_upgrade_is_safe_for_idempotent_model() {
        let model = GraphModel::in_memory();
        let sample = Sample::new(&model, 1, true);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sample = Arc::clone(&sample);
                std::thread::spawn(move || sample.ensure_activated(true).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            sample.activation_status().unwrap(),
            ActivationStatus::ActivatedReadWrite
        );
        // The unlocked upgrade may reach the model more than once.
        assert!(sample.materialized() >= 1);
        assert_eq!(
            model.stats().write_activations,
            sample.materialized() as u64
        );
    }
}
