//! Queryable wrapper around a computed change set

use crate::change::{Change, ChangeKind, ValuePair};
use crate::change_set::{indexed_value, ChangeSet, Pairing};
use crate::diff::{DiffEngine, DiffError, Mapping};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-pairing view of the changes matching one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionEntries {
    /// Keys only, in the order the changes were found
    Keys(Vec<String>),
    /// Key to `[old, new]`
    Values(IndexMap<String, ValuePair>),
}

impl ActionEntries {
    pub fn len(&self) -> usize {
        match self {
            ActionEntries::Keys(keys) => keys.len(),
            ActionEntries::Values(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<&str> {
        match self {
            ActionEntries::Keys(keys) => keys.iter().map(String::as_str).collect(),
            ActionEntries::Values(values) => values.keys().map(String::as_str).collect(),
        }
    }
}

/// Filtered view over all pairings
pub type ActionView = IndexMap<Pairing, ActionEntries>;

/// Number of changes of each kind across all pairings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub altered: usize,
}

impl DiffStats {
    pub fn total(&self) -> usize {
        self.added + self.removed + self.altered
    }
}

/// A field of a single change, addressable through [`DiffResult::get_single`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeField {
    Key,
    Action,
    Sets,
    Old,
    New,
}

impl ChangeField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "key" => Some(ChangeField::Key),
            "action" => Some(ChangeField::Action),
            "sets" => Some(ChangeField::Sets),
            "old" | "alpha" => Some(ChangeField::Old),
            "new" | "beta" => Some(ChangeField::New),
            _ => None,
        }
    }
}

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffResult {
    changes: ChangeSet,
}

impl DiffResult {
    pub fn new(changes: ChangeSet) -> Self {
        Self { changes }
    }

    /// Diff the mappings pairwise with the default engine
    pub fn compute(mappings: &[Mapping]) -> Result<Self, DiffError> {
        DiffEngine::new().results(mappings)
    }

    pub fn from_json(json: &str) -> Result<Self, DiffError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The raw change set, as computed
    pub fn to_sequence(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn into_change_set(self) -> ChangeSet {
        self.changes
    }

    pub fn to_json(&self) -> Result<String, DiffError> {
        Ok(serde_json::to_string(&self.changes)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, DiffError> {
        Ok(serde_json::to_string_pretty(&self.changes)?)
    }

    /// Replace the held change set wholesale
    pub fn set_change_set(&mut self, changes: ChangeSet) {
        self.changes = changes;
    }

    /// Add a change to a pairing; the key must not already be in it
    pub fn append_change(&mut self, pairing: Pairing, change: Change) -> Result<(), DiffError> {
        self.changes.push(pairing, change)
    }

    /// Changes matching `action`, per pairing.
    ///
    /// Pairings without any matching change are left out.
    pub fn filter_by_action(&self, action: ChangeKind, include_value_pairs: bool) -> ActionView {
        let mut view = ActionView::new();
        for (pairing, changes) in self.changes.iter() {
            let matching = changes.iter().filter(|c| c.is(action));
            let entries = if include_value_pairs {
                ActionEntries::Values(
                    matching
                        .map(|c| (c.key().to_string(), c.values().clone()))
                        .collect(),
                )
            } else {
                ActionEntries::Keys(matching.map(|c| c.key().to_string()).collect())
            };
            if !entries.is_empty() {
                view.insert(pairing, entries);
            }
        }
        view
    }

    pub fn get_altered(&self, include_value_pairs: bool) -> ActionView {
        self.filter_by_action(ChangeKind::Altered, include_value_pairs)
    }

    pub fn get_added(&self, include_value_pairs: bool) -> ActionView {
        self.filter_by_action(ChangeKind::Added, include_value_pairs)
    }

    pub fn get_removed(&self, include_value_pairs: bool) -> ActionView {
        self.filter_by_action(ChangeKind::Removed, include_value_pairs)
    }

    /// Typed access to one change of a pairing
    pub fn change(&self, label: &str, index: usize) -> Result<&Change, DiffError> {
        let pairing: Pairing = label
            .parse()
            .map_err(|_| DiffError::IndexOutOfRange(format!("pairing {:?}", label)))?;
        let changes = self
            .changes
            .get(&pairing)
            .ok_or_else(|| DiffError::IndexOutOfRange(format!("pairing {:?}", label)))?;
        changes.get(index).ok_or_else(|| {
            DiffError::IndexOutOfRange(format!(
                "change {} of pairing {} ({} changes)",
                index,
                label,
                changes.len()
            ))
        })
    }

    /// Look up one change, or one field of it, as JSON.
    ///
    /// Without a field the whole change is returned in the same shape as in
    /// [`DiffResult::to_json`]. Fields are `key`, `action`, `sets`, `old`
    /// and `new`.
    pub fn get_single(
        &self,
        label: &str,
        index: usize,
        field: Option<&str>,
    ) -> Result<Value, DiffError> {
        let change = self.change(label, index)?;
        let Some(name) = field else {
            let pairing: Pairing = label.parse()?;
            return Ok(indexed_value(pairing, change));
        };
        let field = ChangeField::parse(name)
            .ok_or_else(|| DiffError::IndexOutOfRange(format!("field {:?}", name)))?;

        Ok(match field {
            ChangeField::Key => Value::String(change.key().to_string()),
            ChangeField::Action => Value::String(change.action().as_str().to_string()),
            ChangeField::Sets => {
                let pairing: Pairing = label.parse()?;
                indexed_value(pairing, change)
                    .get("sets")
                    .cloned()
                    .unwrap_or(Value::Null)
            }
            ChangeField::Old => change.values().old_or_null(),
            ChangeField::New => change.values().new_or_null(),
        })
    }

    pub fn pairings(&self) -> impl Iterator<Item = Pairing> + '_ {
        self.changes.pairings()
    }

    /// Check if no pairing has any change
    pub fn is_empty(&self) -> bool {
        self.changes.has_no_changes()
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for (_, change) in self.changes.changes() {
            match change.action() {
                ChangeKind::Added => stats.added += 1,
                ChangeKind::Removed => stats.removed += 1,
                ChangeKind::Altered => stats.altered += 1,
            }
        }
        stats
    }
}

impl From<ChangeSet> for DiffResult {
    fn from(changes: ChangeSet) -> Self {
        Self::new(changes)
    }
}
