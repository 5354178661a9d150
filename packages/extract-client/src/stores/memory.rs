//! In-memory collaborators for testing and local tooling.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::Result;
use crate::traits::{schema::SchemaLookup, store::SavedFilterStore};
use crate::types::{clause::Clause, filter::SavedFilter, schema::FieldSpec};

/// Schema held in memory.
///
/// Deserializes from
/// `{"columns": {"Demographics": [{"name": ..., "type": ...}]}, "lookup_lists": {...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySchema {
    #[serde(default)]
    columns: HashMap<String, Vec<FieldSpec>>,
    #[serde(default)]
    lookup_lists: HashMap<String, Vec<String>>,
}

impl MemorySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, column: impl Into<String>, field: FieldSpec) -> Self {
        self.columns.entry(column.into()).or_default().push(field);
        self
    }

    pub fn with_lookup_list(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.lookup_lists
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl SchemaLookup for MemorySchema {
    fn find_field(&self, column: &str, field: &str) -> Option<FieldSpec> {
        self.columns
            .get(column)?
            .iter()
            .find(|f| f.name == field)
            .cloned()
    }

    fn lookup_list(&self, name: &str) -> Option<Vec<String>> {
        self.lookup_lists.get(name).cloned()
    }
}

/// Saved filters kept in memory. Data is lost on drop.
#[derive(Default)]
pub struct MemoryFilterStore {
    filters: Mutex<Vec<SavedFilter>>,
}

impl MemoryFilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn filter_count(&self) -> usize {
        self.filters.lock().await.len()
    }
}

#[async_trait]
impl SavedFilterStore for MemoryFilterStore {
    async fn save(&self, name: &str, criteria: &[Clause]) -> Result<SavedFilter> {
        let filter = SavedFilter {
            id: Some(Uuid::new_v4().to_string()),
            name: name.to_string(),
            criteria: criteria.to_vec(),
            created_at: Some(Utc::now()),
        };
        self.filters.lock().await.push(filter.clone());
        Ok(filter)
    }

    async fn list(&self) -> Result<Vec<SavedFilter>> {
        Ok(self.filters.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::FieldType;
    use serde_json::json;

    #[test]
    fn test_schema_from_json() {
        let schema: MemorySchema = serde_json::from_value(json!({
            "columns": {
                "Demographics": [
                    {"name": "sex", "type": "many_to_many", "lookup_list": "gender"},
                    {"name": "date_of_birth", "type": "date"}
                ]
            },
            "lookup_lists": {"gender": ["Female", "Male"]}
        }))
        .unwrap();

        let field = schema.find_field("Demographics", "date_of_birth").unwrap();
        assert_eq!(field.field_type, FieldType::Date);
        assert!(schema.find_field("Demographics", "nope").is_none());
        assert!(schema.find_field("Nope", "sex").is_none());
        assert_eq!(schema.lookup_list("gender").unwrap().len(), 2);
        assert_eq!(schema.column_names(), vec!["Demographics"]);
    }

    #[tokio::test]
    async fn test_filter_store_assigns_ids() {
        let store = MemoryFilterStore::new();
        let criteria = vec![Clause::new("Demographics", "sex", "Equals", "Male")];

        let first = store.save("men", &criteria).await.unwrap();
        let second = store.save("men", &criteria).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.filter_count().await, 2);
        assert_eq!(store.list().await.unwrap()[0].criteria, criteria);
    }
}
