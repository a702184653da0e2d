//! Change representation for diff operations

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::diff::DiffError;

/// The kind of change a key underwent between two mappings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// Key is absent in the first mapping and present in the second
    Added,
    /// Key is present in the first mapping and absent in the second
    Removed,
    /// Key is present in both mappings with unequal values
    Altered,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Removed => "REMOVED",
            ChangeKind::Altered => "ALTERED",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Old and new value of a key.
///
/// `None` means the key is absent on that side, which is distinct from a key
/// holding `null`. On the wire both are written as `null`; the action of the
/// owning [`Change`] tells them apart again when parsing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValuePair {
    pub old: Option<Value>,
    pub new: Option<Value>,
}

impl ValuePair {
    pub fn new(old: Option<Value>, new: Option<Value>) -> Self {
        Self { old, new }
    }

    /// Old value with absence flattened to `null`
    pub fn old_or_null(&self) -> Value {
        self.old.clone().unwrap_or(Value::Null)
    }

    /// New value with absence flattened to `null`
    pub fn new_or_null(&self) -> Value {
        self.new.clone().unwrap_or(Value::Null)
    }
}

impl Serialize for ValuePair {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.old, &self.new).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValuePair {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (old, new) = <(Option<Value>, Option<Value>)>::deserialize(deserializer)?;
        Ok(Self { old, new })
    }
}

/// A single key's classified difference between two mappings.
///
/// Fields are private so that the action always agrees with which sides of
/// the value pair are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "FlatChange", try_from = "FlatChange")]
pub struct Change {
    key: String,
    action: ChangeKind,
    values: ValuePair,
}

impl Change {
    pub fn added(key: impl Into<String>, new: Value) -> Self {
        Self {
            key: key.into(),
            action: ChangeKind::Added,
            values: ValuePair::new(None, Some(new)),
        }
    }

    pub fn removed(key: impl Into<String>, old: Value) -> Self {
        Self {
            key: key.into(),
            action: ChangeKind::Removed,
            values: ValuePair::new(Some(old), None),
        }
    }

    /// Fails when both values are equal, since that is not a change
    pub fn altered(key: impl Into<String>, old: Value, new: Value) -> Result<Self, DiffError> {
        let key = key.into();
        if old == new {
            return Err(DiffError::MalformedChange {
                key,
                reason: "altered values are equal".to_string(),
            });
        }
        Ok(Self {
            key,
            action: ChangeKind::Altered,
            values: ValuePair::new(Some(old), Some(new)),
        })
    }

    /// Rebuild a change from its action and both wire-side values.
    ///
    /// The side the action marks as absent must be `null`.
    pub fn from_sides(
        key: impl Into<String>,
        action: ChangeKind,
        old: Value,
        new: Value,
    ) -> Result<Self, DiffError> {
        let key = key.into();
        let absent_side = match action {
            ChangeKind::Added => Some(&old),
            ChangeKind::Removed => Some(&new),
            ChangeKind::Altered => None,
        };
        if let Some(side) = absent_side {
            if !side.is_null() {
                return Err(DiffError::MalformedChange {
                    key,
                    reason: format!("{} change carries a value on its absent side", action),
                });
            }
        }
        match action {
            ChangeKind::Added => Ok(Self::added(key, new)),
            ChangeKind::Removed => Ok(Self::removed(key, old)),
            ChangeKind::Altered => Self::altered(key, old, new),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn action(&self) -> ChangeKind {
        self.action
    }

    pub fn values(&self) -> &ValuePair {
        &self.values
    }

    pub fn old(&self) -> Option<&Value> {
        self.values.old.as_ref()
    }

    pub fn new_value(&self) -> Option<&Value> {
        self.values.new.as_ref()
    }

    pub fn is(&self, action: ChangeKind) -> bool {
        self.action == action
    }
}

/// Two-mapping wire form: `{"key", "alpha", "beta", "action"}`
#[derive(Serialize, Deserialize)]
struct FlatChange {
    key: String,
    #[serde(default)]
    alpha: Value,
    #[serde(default)]
    beta: Value,
    action: ChangeKind,
}

impl From<Change> for FlatChange {
    fn from(change: Change) -> Self {
        let alpha = change.values.old_or_null();
        let beta = change.values.new_or_null();
        Self {
            key: change.key,
            alpha,
            beta,
            action: change.action,
        }
    }
}

impl TryFrom<FlatChange> for Change {
    type Error = DiffError;

    fn try_from(flat: FlatChange) -> Result<Self, Self::Error> {
        Change::from_sides(flat.key, flat.action, flat.alpha, flat.beta)
    }
}
