//! Property-based test generators using proptest.

use crate::fixtures::PersonData;
use entigraph_core::{JsonDocument, Properties, RecordData};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use serde_json::Value;

/// A single edit applied to one of several people.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Rename the person at `target`.
    Rename {
        /// Index into the people under test.
        target: usize,
        /// New name.
        name: String,
    },
    /// Change the age of the person at `target`.
    Age {
        /// Index into the people under test.
        target: usize,
        /// New age.
        age: u32,
    },
}

impl Edit {
    /// Returns the index of the person this edit touches.
    pub fn target(&self) -> usize {
        match self {
            Self::Rename { target, .. } | Self::Age { target, .. } => *target,
        }
    }
}

/// Strategy for entity labels.
pub fn label_strategy() -> impl Strategy<Value = u64> {
    1u64..1_000_000
}

/// Strategy for person names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,11}"
}

/// Strategy for property names.
pub fn property_name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z]{0,15}"
}

/// Strategy for stored person data.
pub fn person_strategy() -> impl Strategy<Value = PersonData> {
    (name_strategy(), 0u32..120).prop_map(|(name, age)| PersonData::new(name, age))
}

/// Strategy for a cast of 1 to `max` people.
pub fn people_strategy(max: usize) -> impl Strategy<Value = Vec<PersonData>> {
    prop::collection::vec(person_strategy(), 1..=max.max(1))
}

/// Strategy for one edit against `count` people.
pub fn edit_strategy(count: usize) -> impl Strategy<Value = Edit> {
    let count = count.max(1);
    prop_oneof![
        (0..count, name_strategy()).prop_map(|(target, name)| Edit::Rename { target, name }),
        (0..count, 0u32..120).prop_map(|(target, age)| Edit::Age { target, age }),
    ]
}

/// Strategy for an edit script of up to `max_len` edits.
pub fn edit_script_strategy(count: usize, max_len: usize) -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(edit_strategy(count), 0..=max_len)
}

/// Strategy for scalar JSON property values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,20}".prop_map(Value::from),
    ]
}

/// Strategy for a document with unique labels.
pub fn document_strategy(max_entities: usize) -> impl Strategy<Value = JsonDocument> {
    prop::collection::btree_map(
        label_strategy(),
        prop::collection::btree_map(property_name_strategy(), value_strategy(), 0..5),
        0..=max_entities,
    )
    .prop_map(|entries| JsonDocument {
        entities: entries
            .into_iter()
            .map(|(label, properties)| RecordData {
                label,
                kind: "record".to_owned(),
                properties: properties.into_iter().collect::<Properties>(),
            })
            .collect(),
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
