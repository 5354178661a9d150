//! Output field selection for an extract.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Columns and fields to include in the extract artifact.
///
/// Serializes as `{"column": ["field", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSlice(BTreeMap<String, BTreeSet<String>>);

impl DataSlice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`select`](Self::select).
    pub fn with(mut self, column: impl Into<String>, field: impl Into<String>) -> Self {
        self.select(column, field);
        self
    }

    pub fn select(&mut self, column: impl Into<String>, field: impl Into<String>) {
        self.0.entry(column.into()).or_default().insert(field.into());
    }

    /// Remove a field; drops the column once it has no fields left.
    pub fn deselect(&mut self, column: &str, field: &str) -> bool {
        let Some(fields) = self.0.get_mut(column) else {
            return false;
        };
        let removed = fields.remove(field);
        if fields.is_empty() {
            self.0.remove(column);
        }
        removed
    }

    pub fn is_selected(&self, column: &str, field: &str) -> bool {
        self.0.get(column).is_some_and(|f| f.contains(field))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_and_deselect() {
        let mut slice = DataSlice::new()
            .with("Demographics", "sex")
            .with("Demographics", "date_of_birth");
        assert!(slice.is_selected("Demographics", "sex"));

        assert!(slice.deselect("Demographics", "sex"));
        assert!(!slice.deselect("Demographics", "sex"));
        assert_eq!(slice.columns().collect::<Vec<_>>(), vec!["Demographics"]);

        slice.deselect("Demographics", "date_of_birth");
        assert!(slice.is_empty());
    }

    #[test]
    fn test_serializes_as_column_map() {
        let slice = DataSlice::new()
            .with("Diagnosis", "condition")
            .with("Demographics", "sex");
        assert_eq!(
            serde_json::to_value(&slice).unwrap(),
            json!({"Demographics": ["sex"], "Diagnosis": ["condition"]})
        );
    }
}
