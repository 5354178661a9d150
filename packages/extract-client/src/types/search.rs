//! Preview search request and result page.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::types::clause::Clause;

/// Where the requested page number travels in the search body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStyle {
    /// `page_number` is added to the first clause object (legacy wire format).
    #[default]
    FirstClause,
    /// `{"page": n, "criteria": [...]}`.
    Envelope,
}

/// A preview search for one page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub clauses: Vec<Clause>,
    pub page_number: u32,
    pub style: PaginationStyle,
}

impl SearchRequest {
    pub fn new(clauses: Vec<Clause>, page_number: u32) -> Self {
        Self {
            clauses,
            page_number: page_number.max(1),
            style: PaginationStyle::default(),
        }
    }

    pub fn with_style(mut self, style: PaginationStyle) -> Self {
        self.style = style;
        self
    }

    /// JSON body sent to the search endpoint.
    pub fn to_body(&self) -> Result<Value> {
        let criteria = serde_json::to_value(&self.clauses)?;
        Ok(match self.style {
            PaginationStyle::FirstClause => {
                let mut criteria = criteria;
                if let Some(Value::Object(first)) =
                    criteria.as_array_mut().and_then(|c| c.first_mut())
                {
                    first.insert("page_number".into(), json!(self.page_number));
                }
                criteria
            }
            PaginationStyle::Envelope => json!({
                "page": self.page_number,
                "criteria": criteria,
            }),
        })
    }
}

/// One page of preview results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub object_list: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_next: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_previous: Option<bool>,

    /// Pagination fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchPage {
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    /// Prefers the server's flag, falls back to comparing page counters.
    pub fn has_next_page(&self) -> bool {
        match (self.has_next, self.page_number, self.total_pages) {
            (Some(flag), _, _) => flag,
            (None, Some(page), Some(total)) => page < total,
            _ => false,
        }
    }

    pub fn has_previous_page(&self) -> bool {
        match (self.has_previous, self.page_number) {
            (Some(flag), _) => flag,
            (None, Some(page)) => page > 1,
            _ => false,
        }
    }
}
