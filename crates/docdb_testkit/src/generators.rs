//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random values, documents and array
//! edit sequences.

use crate::model::ArrayOp;
use docdb_core::{Blob, ReadOnlyArray, ReadOnlyDictionary, Value};
use proptest::prelude::*;

/// Strategy for generating dictionary keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,7}").expect("Invalid regex")
}

/// Strategy for generating finite floats.
pub fn float_strategy() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
}

/// Strategy for generating blob handles.
pub fn blob_strategy() -> impl Strategy<Value = Blob> {
    (
        prop::option::of(prop::sample::select(vec!["text/plain", "image/png"])),
        prop::collection::vec(any::<u8>(), 0..32),
    )
        .prop_map(|(content_type, content)| Blob::describe(content_type, &content))
}

/// Strategy for generating scalar values.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        float_strategy().prop_map(Value::Float),
        ".{0,16}".prop_map(Value::String),
        blob_strategy().prop_map(Value::Blob),
    ]
}

/// Strategy for generating nested values up to a few levels deep.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|values| Value::Array(ReadOnlyArray::from_values(values))),
            prop::collection::vec((key_strategy(), inner), 0..4)
                .prop_map(|entries| Value::Dictionary(ReadOnlyDictionary::from_entries(entries))),
        ]
    })
}

/// Strategy for generating document bodies.
pub fn dictionary_strategy() -> impl Strategy<Value = ReadOnlyDictionary> {
    prop::collection::vec((key_strategy(), value_strategy()), 0..6)
        .prop_map(ReadOnlyDictionary::from_entries)
}

/// Strategy for generating array edits, including out-of-range indexes.
pub fn array_op_strategy() -> impl Strategy<Value = ArrayOp> {
    prop_oneof![
        2 => (0..8usize, scalar_strategy()).prop_map(|(index, value)| ArrayOp::Set { index, value }),
        2 => (0..8usize, scalar_strategy()).prop_map(|(index, value)| ArrayOp::Insert { index, value }),
        2 => scalar_strategy().prop_map(|value| ArrayOp::Append { value }),
        1 => (0..8usize).prop_map(|index| ArrayOp::Remove { index }),
    ]
}

/// Strategy for generating a sequence of array edits.
pub fn array_op_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<ArrayOp>> {
    prop::collection::vec(array_op_strategy(), min_ops..max_ops)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::with_temp_db;
    use crate::model::ArrayModel;
    use docdb_core::{Document, MutableArray, MutableDictionary, MutableValue};

    /// Reads every nested container through the mutable API so that each
    /// one is promoted.
    fn touch_all(value: &MutableValue) {
        match value {
            MutableValue::Array(array) => array.iter().for_each(|v| touch_all(&v)),
            MutableValue::Dictionary(dict) => touch_dictionary(dict),
            MutableValue::Value(_) => {}
        }
    }

    fn touch_dictionary(dict: &MutableDictionary) {
        for key in dict.keys() {
            if let Some(value) = dict.value(&key) {
                touch_all(&value);
            }
        }
    }

    proptest! {
        #![proptest_config(PropTestConfig::default().to_proptest_config())]

        #[test]
        fn array_edits_match_vec_model(
            start in prop::collection::vec(scalar_strategy(), 0..5),
            ops in array_op_sequence_strategy(0, 24),
        ) {
            let array = ReadOnlyArray::from_values(start.clone()).to_mutable();
            let mut model = ArrayModel::new(start);

            for op in &ops {
                let expected = model.apply(op);
                let actual = op.apply(&array);
                prop_assert_eq!(actual, expected);
                prop_assert_eq!(array.count(), model.values().len());
            }

            let materialized: Vec<Value> = array.to_read_only().iter().cloned().collect();
            prop_assert_eq!(materialized.as_slice(), model.values());
        }

        #[test]
        fn unedited_promotion_round_trips(dict in dictionary_strategy()) {
            let mutable = dict.to_mutable();
            touch_dictionary(&mutable);

            prop_assert!(!mutable.is_changed());
            prop_assert_eq!(mutable.to_read_only(), dict);
        }

        #[test]
        fn round_trip_is_idempotent(dict in dictionary_strategy()) {
            let once = dict.to_mutable().to_read_only().to_mutable();
            touch_dictionary(&once);
            let twice = once.to_read_only().to_mutable();
            touch_dictionary(&twice);

            prop_assert!(!twice.is_changed());
            prop_assert_eq!(twice.to_read_only(), once.to_read_only());
        }

        #[test]
        fn missing_keys_read_permissively(dict in dictionary_strategy(), key in "[A-Z]{1,4}") {
            // Generated keys are lowercase, so `key` is always missing.
            let fragment = dict.fragment(&key).get("b").get(0);
            prop_assert!(!fragment.exists());
            prop_assert_eq!(fragment.int(), 0);
            prop_assert!(fragment.string().is_none());
            prop_assert!(fragment.read_only_dictionary().is_none());

            let mutable = dict.to_mutable();
            prop_assert!(mutable.value(&key).is_none());
            prop_assert!(!mutable.fragment(&key).exists());
        }

        #[test]
        fn saved_bodies_read_back_equal(dict in dictionary_strategy()) {
            with_temp_db(|db| {
                let mut doc = Document::with_content("doc", dict.clone()).unwrap();
                db.save(&mut doc).unwrap();
                let stored = db.fetch("doc").unwrap();
                assert_eq!(stored.properties(), &dict);
                assert!(!doc.has_changes());
            });
        }

        #[test]
        fn self_append_is_always_rejected(start in prop::collection::vec(scalar_strategy(), 0..4)) {
            let array = MutableArray::from_values(start).unwrap();
            prop_assert!(array.append(array.clone()).is_err());
            let dict = MutableDictionary::new();
            dict.set("inner", array.clone()).unwrap();
            prop_assert!(array.append(dict).is_err());
        }
    }
}
