//! Filter clauses and the combine operator.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ExtractError;

/// Logical operator joining completed clauses on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    And,
    Or,
}

/// Whether the user wants every clause to match or any of them.
///
/// Fixed for the life of a [`CriteriaModel`](crate::CriteriaModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinePolicy {
    All,
    #[default]
    #[serde(other)]
    Any,
}

impl CombinePolicy {
    /// `All` joins with AND; everything else joins with OR.
    pub fn combine(self) -> Combine {
        match self {
            CombinePolicy::All => Combine::And,
            CombinePolicy::Any => Combine::Or,
        }
    }
}

impl From<&str> for CombinePolicy {
    fn from(value: &str) -> Self {
        if value == "all" {
            CombinePolicy::All
        } else {
            CombinePolicy::Any
        }
    }
}

/// One filter row.
///
/// All user-editable attributes are optional so a row can sit half-filled in
/// the editor. Empty strings are treated the same as missing values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Entity/table the field belongs to.
    pub column: Option<String>,

    /// Attribute within the column.
    pub field: Option<String>,

    /// Operator identifier, e.g. `Equals`, `Before`, `Any Of`.
    #[serde(rename = "queryType")]
    pub query_type: Option<String>,

    /// Operand: scalar, date string, or list.
    pub query: Option<Value>,

    /// Derived during normalization; never set by editing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combine: Option<Combine>,
}

impl Clause {
    /// A fresh clause with every attribute unset.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a clause from its four editable attributes.
    pub fn new(
        column: impl Into<String>,
        field: impl Into<String>,
        query_type: impl Into<String>,
        query: impl Into<Value>,
    ) -> Self {
        Self {
            column: Some(column.into()),
            field: Some(field.into()),
            query_type: Some(query_type.into()),
            query: Some(query.into()),
            combine: None,
        }
    }

    /// Column, field and operator are all present and non-empty.
    pub fn is_complete(&self) -> bool {
        is_set(&self.column) && is_set(&self.field) && is_set(&self.query_type)
    }

    /// Column and field are both present, so the row can show field details.
    pub fn has_field(&self) -> bool {
        is_set(&self.column) && is_set(&self.field)
    }

    /// Reset one attribute to its empty default.
    pub fn reset(&mut self, field: ClauseField) {
        match field {
            ClauseField::Column => self.column = None,
            ClauseField::Field => self.field = None,
            ClauseField::QueryType => self.query_type = None,
            ClauseField::Query => self.query = None,
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Attributes that make up the base clause shape.
///
/// `combine` is derived and deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseField {
    Column,
    Field,
    QueryType,
    Query,
}

impl ClauseField {
    pub const ALL: [ClauseField; 4] = [
        ClauseField::Column,
        ClauseField::Field,
        ClauseField::QueryType,
        ClauseField::Query,
    ];

    /// Name used on the wire and by the editor.
    pub fn as_str(self) -> &'static str {
        match self {
            ClauseField::Column => "column",
            ClauseField::Field => "field",
            ClauseField::QueryType => "queryType",
            ClauseField::Query => "query",
        }
    }
}

impl fmt::Display for ClauseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClauseField {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClauseField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ExtractError::UnknownClauseField(s.to_string()))
    }
}
