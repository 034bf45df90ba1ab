//! Field-level change tracking for update audit entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Old and new value of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Value before the update.
    pub old: Value,
    /// Value after the update.
    pub new: Value,
}

/// The fields an update actually changed, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, FieldChange>);

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `field` if `old != new`. Returns whether it was recorded.
    ///
    /// Comparison happens on the typed values, so `50` and `50.00` compare
    /// equal for decimals even though their JSON renderings differ.
    pub fn record<T>(&mut self, field: &str, old: &T, new: &T) -> bool
    where
        T: PartialEq + Serialize + ?Sized,
    {
        if old == new {
            return false;
        }
        self.0.insert(
            field.to_string(),
            FieldChange {
                old: serde_json::to_value(old).unwrap_or(Value::Null),
                new: serde_json::to_value(new).unwrap_or(Value::Null),
            },
        );
        true
    }

    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of changed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the change recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.get(field)
    }

    /// Changed field names, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Renders the change set as `{field: {"old": .., "new": ..}}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
