//! Diff computation engine

use crate::change::Change;
use crate::change_set::{ChangeSet, Pairing};
use crate::result::DiffResult;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use thiserror::Error;

/// An ordered key-value mapping being compared
pub type Mapping = IndexMap<String, Value>;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("At least two mappings are required, got {given}")]
    InvalidInput { given: usize },
    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),
    #[error("Invalid pairing label: {0:?}")]
    InvalidPairing(String),
    #[error("Malformed change for key {key:?}: {reason}")]
    MalformedChange { key: String, reason: String },
    #[error("Key {key:?} already present in pairing {pairing}")]
    DuplicateKey { pairing: String, key: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The main diff engine.
///
/// Values are compared with strict structural equality: `"0"` and `0` differ,
/// as do `1` and `1.0`, and a key holding `null` is not the same as a missing
/// key. Nested objects and arrays are compared as whole values.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine;

impl DiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compare each mapping with the next one, in input order
    pub fn compute(&self, mappings: &[Mapping]) -> Result<ChangeSet, DiffError> {
        if mappings.len() < 2 {
            return Err(DiffError::InvalidInput {
                given: mappings.len(),
            });
        }

        let mut set = ChangeSet::new();
        for (index, pair) in mappings.windows(2).enumerate() {
            let pairing = Pairing::adjacent(index);
            let changes = self.diff(&pair[0], &pair[1]);
            tracing::debug!(pairing = %pairing, changes = changes.len(), "computed pairing");
            set.insert(pairing, changes)?;
        }
        Ok(set)
    }

    /// Compute the changes needed to go from `alpha` to `beta`
    pub fn diff(&self, alpha: &Mapping, beta: &Mapping) -> Vec<Change> {
        // Union of keys, first-seen order across alpha then beta
        let keys: IndexSet<&str> = alpha
            .keys()
            .chain(beta.keys())
            .map(String::as_str)
            .collect();

        let mut changes = Vec::new();
        for key in keys {
            let change = match (alpha.get(key), beta.get(key)) {
                (Some(old), Some(new)) if old != new => {
                    Change::altered(key, old.clone(), new.clone()).ok()
                }
                (Some(old), None) => Some(Change::removed(key, old.clone())),
                (None, Some(new)) => Some(Change::added(key, new.clone())),
                _ => None,
            };
            if let Some(change) = change {
                tracing::trace!(key, action = %change.action(), "key changed");
                changes.push(change);
            }
        }
        changes
    }

    /// Compute and wrap the result for querying
    pub fn results(&self, mappings: &[Mapping]) -> Result<DiffResult, DiffError> {
        self.compute(mappings).map(DiffResult::new)
    }
}

/// Build a [`Mapping`] from a JSON object value
pub fn mapping_from_value(value: Value) -> Option<Mapping> {
    match value {
        Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeKind;
    use serde_json::json;

    fn mapping(value: Value) -> Mapping {
        mapping_from_value(value).unwrap()
    }

    #[test]
    fn test_altered_value() {
        let engine = DiffEngine::new();
        let a = mapping(json!({"name": "Sebastiaan", "zip": "1234 AA"}));
        let b = mapping(json!({"name": "Sebastiaan", "zip": "4758 AJ"}));

        let changes = engine.diff(&a, &b);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key(), "zip");
        assert_eq!(changes[0].action(), ChangeKind::Altered);
        assert_eq!(changes[0].old(), Some(&json!("1234 AA")));
        assert_eq!(changes[0].new_value(), Some(&json!("4758 AJ")));
    }

    #[test]
    fn test_removed_key() {
        let a = mapping(json!({"a": 1, "b": 2}));
        let b = mapping(json!({"a": 1}));

        let changes = DiffEngine::new().diff(&a, &b);

        assert_eq!(changes, vec![Change::removed("b", json!(2))]);
        assert_eq!(changes[0].new_value(), None);
    }

    #[test]
    fn test_added_key() {
        let a = mapping(json!({"a": 1}));
        let b = mapping(json!({"a": 1, "c": 3}));

        let changes = DiffEngine::new().diff(&a, &b);

        assert_eq!(changes, vec![Change::added("c", json!(3))]);
        assert_eq!(changes[0].old(), None);
    }

    #[test]
    fn test_no_changes() {
        let a = mapping(json!({"a": 1, "b": [1, 2], "c": {"x": null}}));

        assert!(DiffEngine::new().diff(&a, &a).is_empty());
    }

    #[test]
    fn test_encounter_order() {
        let a = mapping(json!({"z": 1, "gone": true, "m": 2}));
        let b = mapping(json!({"new": 0, "m": 3, "z": 1}));

        let changes = DiffEngine::new().diff(&a, &b);
        let keys: Vec<_> = changes.iter().map(|c| (c.key(), c.action())).collect();

        assert_eq!(
            keys,
            vec![
                ("gone", ChangeKind::Removed),
                ("m", ChangeKind::Altered),
                ("new", ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn test_strict_equality() {
        let a = mapping(json!({"n": "0", "f": 1, "nil": null}));
        let b = mapping(json!({"n": 0, "f": 1.0}));

        let changes = DiffEngine::new().diff(&a, &b);
        let kinds: Vec<_> = changes.iter().map(|c| (c.key(), c.action())).collect();

        assert_eq!(
            kinds,
            vec![
                ("n", ChangeKind::Altered),
                ("f", ChangeKind::Altered),
                ("nil", ChangeKind::Removed),
            ]
        );
        assert_eq!(changes[2].old(), Some(&Value::Null));
    }

    #[test]
    fn test_nested_values_compared_structurally() {
        let a = mapping(json!({"obj": {"x": 1, "y": 2}, "list": [1, 2]}));
        let b = mapping(json!({"obj": {"y": 2, "x": 1}, "list": [2, 1]}));

        let changes = DiffEngine::new().diff(&a, &b);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key(), "list");
    }

    #[test]
    fn test_compute_requires_two_mappings() {
        let engine = DiffEngine::new();

        assert!(matches!(
            engine.compute(&[]),
            Err(DiffError::InvalidInput { given: 0 })
        ));
        assert!(matches!(
            engine.compute(&[mapping(json!({"a": 1}))]),
            Err(DiffError::InvalidInput { given: 1 })
        ));
    }

    #[test]
    fn test_compute_pairwise() {
        let a = mapping(json!({"a": 1}));
        let b = mapping(json!({"a": 2}));
        let c = mapping(json!({"a": 2, "d": 4}));

        let set = DiffEngine::new().compute(&[a, b, c]).unwrap();
        let labels: Vec<_> = set.pairings().map(|p| p.label()).collect();

        assert_eq!(labels, vec!["0::1", "1::2"]);
        assert_eq!(
            set.get(&Pairing::new(0, 1)).unwrap()[0].action(),
            ChangeKind::Altered
        );
        assert_eq!(
            set.get(&Pairing::new(1, 2)).unwrap(),
            &[Change::added("d", json!(4))][..]
        );
    }

    #[test]
    fn test_compute_keeps_empty_pairings() {
        let a = mapping(json!({"a": 1}));

        let set = DiffEngine::new().compute(&[a.clone(), a]).unwrap();

        assert_eq!(set.len(), 1);
        assert!(set.has_no_changes());
    }

    #[test]
    fn test_result_is_a_snapshot() {
        let mut a = mapping(json!({"a": 1}));
        let b = mapping(json!({"a": 2}));

        let set = DiffEngine::new().compute(&[a.clone(), b]).unwrap();
        a.insert("a".to_string(), json!(99));

        let changes = set.get(&Pairing::adjacent(0)).unwrap();
        assert_eq!(changes[0].old(), Some(&json!(1)));
    }

    #[test]
    fn test_mapping_from_value() {
        assert!(mapping_from_value(json!([1, 2])).is_none());
        let m = mapping_from_value(json!({"b": 1, "a": 2})).unwrap();
        assert_eq!(m.len(), 2);
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-3i64..3).prop_map(|n| json!(n)),
            "[xy0]{0,2}".prop_map(Value::String),
            proptest::collection::vec(-2i64..2, 0..3).prop_map(|v| json!(v)),
        ]
    }

    // Small key alphabet so generated mappings overlap often
    fn mapping_strategy() -> impl Strategy<Value = Mapping> {
        proptest::collection::vec(("[a-f]", value_strategy()), 0..8)
            .prop_map(|entries| entries.into_iter().collect())
    }

    use proptest::prelude::*;

    proptest::proptest! {
        #[test]
        fn prop_keys_classified_by_presence(a in mapping_strategy(), b in mapping_strategy()) {
            let changes = DiffEngine::new().diff(&a, &b);

            for key in a.keys().chain(b.keys()) {
                let found: Vec<_> = changes.iter().filter(|c| c.key() == key).collect();
                match (a.get(key), b.get(key)) {
                    (Some(old), Some(new)) if old == new => prop_assert!(found.is_empty()),
                    (Some(old), Some(new)) => {
                        prop_assert_eq!(found.len(), 1);
                        prop_assert_eq!(found[0].action(), ChangeKind::Altered);
                        prop_assert_eq!(found[0].old(), Some(old));
                        prop_assert_eq!(found[0].new_value(), Some(new));
                    }
                    (Some(old), None) => {
                        prop_assert_eq!(found.len(), 1);
                        prop_assert_eq!(found[0].action(), ChangeKind::Removed);
                        prop_assert_eq!(found[0].old(), Some(old));
                        prop_assert_eq!(found[0].new_value(), None);
                    }
                    (None, Some(new)) => {
                        prop_assert_eq!(found.len(), 1);
                        prop_assert_eq!(found[0].action(), ChangeKind::Added);
                        prop_assert_eq!(found[0].old(), None);
                        prop_assert_eq!(found[0].new_value(), Some(new));
                    }
                    (None, None) => unreachable!(),
                }
            }
        }

        #[test]
        fn prop_one_change_per_key(a in mapping_strategy(), b in mapping_strategy()) {
            let changes = DiffEngine::new().diff(&a, &b);
            let keys: IndexSet<&str> = changes.iter().map(|c| c.key()).collect();

            prop_assert_eq!(keys.len(), changes.len());
            prop_assert!(keys.iter().all(|k| a.contains_key(*k) || b.contains_key(*k)));
        }

        #[test]
        fn prop_diff_with_itself_is_empty(a in mapping_strategy()) {
            prop_assert!(DiffEngine::new().diff(&a, &a).is_empty());
        }

        #[test]
        fn prop_json_round_trip(
            a in mapping_strategy(),
            b in mapping_strategy(),
            c in mapping_strategy()
        ) {
            let result = DiffEngine::new().results(&[a, b, c]).unwrap();

            let parsed = DiffResult::from_json(&result.to_json().unwrap()).unwrap();

            prop_assert_eq!(parsed, result);
        }
    }
}
