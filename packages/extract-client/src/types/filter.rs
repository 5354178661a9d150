use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::clause::Clause;

/// A named snapshot of a clause list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub criteria: Vec<Clause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SavedFilter {
    pub fn new(name: impl Into<String>, criteria: Vec<Clause>) -> Self {
        Self {
            id: None,
            name: name.into(),
            criteria,
            created_at: None,
        }
    }
}
