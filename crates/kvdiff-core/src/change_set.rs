//! Changes grouped by the pair of mappings they were computed from

use crate::change::{Change, ChangeKind};
use crate::diff::DiffError;
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Separator between the two indexes of a pairing label
pub const LABEL_SEPARATOR: &str = "::";

/// One adjacent comparison between two input mappings, labelled `"{first}::{second}"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pairing {
    pub first: usize,
    pub second: usize,
}

impl Pairing {
    pub fn new(first: usize, second: usize) -> Self {
        Self { first, second }
    }

    /// Pairing of input `index` with the one after it
    pub fn adjacent(index: usize) -> Self {
        Self::new(index, index + 1)
    }

    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Both sides must be different inputs, or their value sets would collide
    fn validate(&self) -> Result<(), DiffError> {
        if self.first == self.second {
            return Err(DiffError::InvalidPairing(self.label()));
        }
        Ok(())
    }
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.first, LABEL_SEPARATOR, self.second)
    }
}

impl FromStr for Pairing {
    type Err = DiffError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let (first, second) = label
            .split_once(LABEL_SEPARATOR)
            .ok_or_else(|| DiffError::InvalidPairing(label.to_string()))?;
        let parse = |s: &str| {
            s.parse::<usize>()
                .map_err(|_| DiffError::InvalidPairing(label.to_string()))
        };
        let pairing = Self::new(parse(first)?, parse(second)?);
        // Only the canonical spelling names a pairing ("00::1" does not)
        if pairing.label() != label {
            return Err(DiffError::InvalidPairing(label.to_string()));
        }
        Ok(pairing)
    }
}

impl Serialize for Pairing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pairing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(D::Error::custom)
    }
}

/// Multi-mapping wire form of a change, with values keyed by input index
#[derive(Serialize, Deserialize)]
struct IndexedChange {
    key: String,
    action: ChangeKind,
    sets: IndexMap<String, Value>,
}

impl IndexedChange {
    fn from_change(pairing: Pairing, change: &Change) -> Self {
        let mut sets = IndexMap::with_capacity(2);
        sets.insert(pairing.first.to_string(), change.values().old_or_null());
        sets.insert(pairing.second.to_string(), change.values().new_or_null());
        Self {
            key: change.key().to_string(),
            action: change.action(),
            sets,
        }
    }

    fn into_change(mut self, pairing: Pairing) -> Result<Change, DiffError> {
        let mut side = |index: usize| {
            self.sets
                .shift_remove(&index.to_string())
                .ok_or_else(|| DiffError::MalformedChange {
                    key: self.key.clone(),
                    reason: format!("missing value set {} for pairing {}", index, pairing),
                })
        };
        let old = side(pairing.first)?;
        let new = side(pairing.second)?;
        Change::from_sides(self.key, self.action, old, new)
    }
}

/// Render one change the way it appears inside a serialized [`ChangeSet`]
pub fn indexed_value(pairing: Pairing, change: &Change) -> Value {
    serde_json::to_value(IndexedChange::from_change(pairing, change)).unwrap_or(Value::Null)
}

/// Ordered changes per pairing.
///
/// A key appears at most once within a pairing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeSet {
    pairings: IndexMap<Pairing, Vec<Change>>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a whole pairing, replacing any previous changes for it
    pub fn insert(&mut self, pairing: Pairing, changes: Vec<Change>) -> Result<(), DiffError> {
        pairing.validate()?;
        let mut seen = std::collections::HashSet::with_capacity(changes.len());
        for change in &changes {
            if !seen.insert(change.key()) {
                return Err(DiffError::DuplicateKey {
                    pairing: pairing.label(),
                    key: change.key().to_string(),
                });
            }
        }
        self.pairings.insert(pairing, changes);
        Ok(())
    }

    /// Append a change to a pairing, creating the pairing when missing
    pub fn push(&mut self, pairing: Pairing, change: Change) -> Result<(), DiffError> {
        pairing.validate()?;
        let changes = self.pairings.entry(pairing).or_default();
        if changes.iter().any(|c| c.key() == change.key()) {
            return Err(DiffError::DuplicateKey {
                pairing: pairing.label(),
                key: change.key().to_string(),
            });
        }
        changes.push(change);
        Ok(())
    }

    pub fn get(&self, pairing: &Pairing) -> Option<&[Change]> {
        self.pairings.get(pairing).map(Vec::as_slice)
    }

    pub fn pairings(&self) -> impl Iterator<Item = Pairing> + '_ {
        self.pairings.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pairing, &[Change])> {
        self.pairings.iter().map(|(p, c)| (*p, c.as_slice()))
    }

    /// Iterate every change together with the pairing it belongs to
    pub fn changes(&self) -> impl Iterator<Item = (Pairing, &Change)> {
        self.pairings
            .iter()
            .flat_map(|(p, changes)| changes.iter().map(move |c| (*p, c)))
    }

    /// Number of pairings
    pub fn len(&self) -> usize {
        self.pairings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairings.is_empty()
    }

    /// Check if no pairing holds any change
    pub fn has_no_changes(&self) -> bool {
        self.pairings.values().all(Vec::is_empty)
    }

    pub fn total_changes(&self) -> usize {
        self.pairings.values().map(Vec::len).sum()
    }
}

impl Serialize for ChangeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairings.len()))?;
        for (pairing, changes) in &self.pairings {
            let indexed: Vec<IndexedChange> = changes
                .iter()
                .map(|c| IndexedChange::from_change(*pairing, c))
                .collect();
            map.serialize_entry(pairing, &indexed)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChangeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<Pairing, Vec<IndexedChange>>::deserialize(deserializer)?;
        let mut set = ChangeSet::new();
        for (pairing, indexed) in raw {
            let changes = indexed
                .into_iter()
                .map(|c| c.into_change(pairing))
                .collect::<Result<Vec<_>, _>>()
                .map_err(D::Error::custom)?;
            set.insert(pairing, changes).map_err(D::Error::custom)?;
        }
        Ok(set)
    }
}
