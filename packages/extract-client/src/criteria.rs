//! Editable filter clause list.
//!
//! [`CriteriaModel`] owns the rows a user edits and turns them into the
//! normalized clause list sent to the server. Editing never fails: rows that
//! are still half-filled are kept in the list and silently left out of
//! [`CriteriaModel::normalized_clauses`].

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::traits::schema::SchemaLookup;
use crate::types::{
    clause::{Clause, ClauseField, CombinePolicy},
    schema::FieldType,
};

/// Ordered list of filter clauses plus the schema used to classify fields.
///
/// The list always holds at least one clause.
pub struct CriteriaModel {
    clauses: Vec<Clause>,
    policy: CombinePolicy,
    schema: Arc<dyn SchemaLookup>,
    /// Row whose field details are on display.
    selected: Option<usize>,
}

impl fmt::Debug for CriteriaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriteriaModel")
            .field("clauses", &self.clauses)
            .field("policy", &self.policy)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl CriteriaModel {
    pub fn new(schema: Arc<dyn SchemaLookup>, policy: CombinePolicy) -> Self {
        Self {
            clauses: vec![Clause::empty()],
            policy,
            schema,
            selected: None,
        }
    }

    pub fn policy(&self) -> CombinePolicy {
        self.policy
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    // =========================================================================
    // Row editing
    // =========================================================================

    /// Append an empty row.
    pub fn add_clause(&mut self) {
        self.clauses.push(Clause::empty());
    }

    /// Remove a row. Removing the only row leaves a single empty row.
    ///
    /// Returns false (and changes nothing) when `index` is out of bounds.
    pub fn remove_clause(&mut self, index: usize) -> bool {
        if index >= self.clauses.len() {
            return false;
        }

        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };

        if self.clauses.len() == 1 {
            self.clear();
        } else {
            self.clauses.remove(index);
        }
        true
    }

    /// Drop every row, leaving a single empty one.
    pub fn clear(&mut self) {
        self.clauses = vec![Clause::empty()];
        self.selected = None;
    }

    /// Replace the whole list, e.g. from a saved filter.
    pub fn replace_clauses(&mut self, clauses: Vec<Clause>) {
        if clauses.is_empty() {
            self.clear();
            return;
        }
        self.clauses = clauses;
        self.selected = None;
    }

    /// Change the column of a row; everything but the column is reset.
    pub fn set_column(&mut self, index: usize, column: impl Into<String>) -> bool {
        let Some(clause) = self.clauses.get_mut(index) else {
            return false;
        };
        clause.column = Some(column.into());
        self.reset_clause(index, &[ClauseField::Column])
    }

    /// Change the field of a row; operator and operand are reset.
    pub fn set_field(&mut self, index: usize, field: impl Into<String>) -> bool {
        let Some(clause) = self.clauses.get_mut(index) else {
            return false;
        };
        clause.field = Some(field.into());
        self.reset_clause(index, &[ClauseField::Column, ClauseField::Field])
    }

    pub fn set_query_type(&mut self, index: usize, query_type: impl Into<String>) -> bool {
        match self.clauses.get_mut(index) {
            Some(clause) => {
                clause.query_type = Some(query_type.into());
                true
            }
            None => false,
        }
    }

    pub fn set_query(&mut self, index: usize, query: impl Into<Value>) -> bool {
        match self.clauses.get_mut(index) {
            Some(clause) => {
                clause.query = Some(query.into());
                true
            }
            None => false,
        }
    }

    /// Reset every base attribute of a row that is not in `preserved`.
    ///
    /// Called after a column or field change so an operator chosen for the
    /// old field type cannot survive into the new one. Afterwards the row
    /// becomes the selected row if it names a field; otherwise a selection
    /// that no longer names a field is cleared.
    pub fn reset_clause(&mut self, index: usize, preserved: &[ClauseField]) -> bool {
        let Some(clause) = self.clauses.get_mut(index) else {
            return false;
        };

        for field in ClauseField::ALL {
            if !preserved.contains(&field) {
                clause.reset(field);
            }
        }

        if clause.has_field() {
            self.selected = Some(index);
        } else if self
            .selected_clause()
            .is_some_and(|c| c.field.as_deref().map_or(true, str::is_empty))
        {
            self.selected = None;
        }
        true
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.clauses.len());
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_clause(&self) -> Option<&Clause> {
        self.selected.and_then(|i| self.clauses.get(i))
    }

    // =========================================================================
    // Normalization
    // =========================================================================

    /// Complete rows in order, each tagged with the policy's combine operator.
    pub fn normalized_clauses(&self) -> Vec<Clause> {
        let combine = self.policy.combine();
        self.clauses
            .iter()
            .filter(|c| c.is_complete())
            .map(|c| Clause {
                combine: Some(combine),
                ..c.clone()
            })
            .collect()
    }

    // =========================================================================
    // Field classification
    // =========================================================================

    /// Whether the declared type of `column.field` is one of `types`.
    ///
    /// Unknown columns or fields answer false.
    pub fn is_field_of_type(&self, column: &str, field: &str, types: &[FieldType]) -> bool {
        if column.is_empty() || field.is_empty() {
            return false;
        }
        self.schema
            .find_field(column, field)
            .is_some_and(|spec| types.contains(&spec.field_type))
    }

    pub fn is_boolean(&self, column: &str, field: &str) -> bool {
        self.is_field_of_type(column, field, FieldType::BOOLEAN)
    }

    pub fn is_text(&self, column: &str, field: &str) -> bool {
        self.is_field_of_type(column, field, FieldType::TEXT)
    }

    pub fn is_select(&self, column: &str, field: &str) -> bool {
        self.is_field_of_type(column, field, &[FieldType::ManyToMany])
    }

    pub fn is_select_many(&self, column: &str, field: &str) -> bool {
        self.is_field_of_type(column, field, &[FieldType::ManyToManyMultiSelect])
    }

    pub fn is_date(&self, column: &str, field: &str) -> bool {
        self.is_field_of_type(column, field, &[FieldType::Date])
    }

    pub fn is_date_time(&self, column: &str, field: &str) -> bool {
        self.is_field_of_type(column, field, &[FieldType::DateTime])
    }

    pub fn is_date_type(&self, column: &str, field: &str) -> bool {
        self.is_field_of_type(column, field, FieldType::DATE_LIKE)
    }

    pub fn is_number(&self, column: &str, field: &str) -> bool {
        self.is_field_of_type(column, field, FieldType::NUMERIC)
    }

    /// Choices declared for a field: a named lookup list wins over an
    /// inline enumeration.
    pub fn choices_for(&self, column: &str, field: &str) -> Option<Vec<String>> {
        let spec = self.schema.find_field(column, field)?;
        match spec.lookup_list.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => self.schema.lookup_list(name),
            None => spec.enum_values,
        }
    }
}

/// Short label for an operator as shown next to a clause.
pub fn readable_query_type(query_type: &str) -> String {
    match query_type {
        "Equals" | "All Of" | "Any Of" => "is".to_string(),
        "Before" | "After" => format!("is {}", query_type.to_lowercase()),
        other => other.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemorySchema;
    use crate::types::{clause::Combine, schema::FieldSpec};
    use serde_json::json;

    fn schema() -> Arc<MemorySchema> {
        Arc::new(
            MemorySchema::new()
                .with_field("Demographics", FieldSpec::new("date_of_birth", FieldType::Date))
                .with_field(
                    "Demographics",
                    FieldSpec::new("sex", FieldType::ManyToMany).with_lookup_list("gender"),
                )
                .with_field("Demographics", FieldSpec::new("deceased", FieldType::NullBoolean))
                .with_field("Demographics", FieldSpec::new("height", FieldType::Decimal))
                .with_field(
                    "Admission",
                    FieldSpec::new("admitted", FieldType::DateTime),
                )
                .with_field(
                    "Admission",
                    FieldSpec::new("ward", FieldType::String).with_enum(["A", "B"]),
                )
                .with_field(
                    "Admission",
                    FieldSpec::new("tags", FieldType::ManyToManyMultiSelect),
                )
                .with_lookup_list("gender", ["Female", "Male"]),
        )
    }

    fn model(policy: CombinePolicy) -> CriteriaModel {
        CriteriaModel::new(schema(), policy)
    }

    #[test]
    fn test_starts_with_one_empty_clause() {
        let model = model(CombinePolicy::All);
        assert_eq!(model.clauses(), &[Clause::empty()]);
    }

    #[test]
    fn test_removing_last_clause_leaves_one_empty() {
        let mut model = model(CombinePolicy::All);
        model.set_column(0, "Demographics");
        model.set_field(0, "sex");

        assert!(model.remove_clause(0));
        assert_eq!(model.clauses(), &[Clause::empty()]);
        assert!(model.selected().is_none());

        assert!(model.remove_clause(0));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_remove_out_of_bounds_is_noop() {
        let mut model = model(CombinePolicy::All);
        model.add_clause();
        assert!(!model.remove_clause(5));
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn test_remove_shifts_selection() {
        let mut model = model(CombinePolicy::Any);
        model.add_clause();
        model.add_clause();
        model.set_column(2, "Demographics");
        model.set_field(2, "sex");
        assert_eq!(model.selected(), Some(2));

        model.remove_clause(0);
        assert_eq!(model.selected(), Some(1));
        assert_eq!(model.selected_clause().unwrap().field.as_deref(), Some("sex"));

        model.remove_clause(1);
        assert!(model.selected().is_none());
    }

    #[test]
    fn test_field_change_resets_operator_and_operand() {
        let mut model = model(CombinePolicy::All);
        model.replace_clauses(vec![Clause::new(
            "Demographics",
            "date_of_birth",
            "Before",
            "2020-01-01",
        )]);

        model.set_field(0, "sex");

        let clause = &model.clauses()[0];
        assert_eq!(clause.column.as_deref(), Some("Demographics"));
        assert_eq!(clause.field.as_deref(), Some("sex"));
        assert!(clause.query_type.is_none());
        assert!(clause.query.is_none());
        assert_eq!(model.selected(), Some(0));
    }

    #[test]
    fn test_column_change_clears_field_and_selection() {
        let mut model = model(CombinePolicy::All);
        model.set_column(0, "Demographics");
        model.set_field(0, "sex");
        assert_eq!(model.selected(), Some(0));

        model.set_column(0, "Admission");

        let clause = &model.clauses()[0];
        assert_eq!(clause.column.as_deref(), Some("Admission"));
        assert!(clause.field.is_none());
        assert!(model.selected().is_none());
    }

    #[test]
    fn test_reset_keeps_other_selection() {
        let mut model = model(CombinePolicy::All);
        model.add_clause();
        model.set_column(0, "Demographics");
        model.set_field(0, "sex");

        model.set_column(1, "Admission");
        assert_eq!(model.selected(), Some(0));
    }

    #[test]
    fn test_normalized_clauses_filter_and_combine() {
        let mut model = model(CombinePolicy::All);
        model.replace_clauses(vec![
            Clause::new("Demographics", "sex", "Equals", "Male"),
            Clause::new("", "", "", ""),
        ]);

        let normalized = model.normalized_clauses();
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].combine, Some(Combine::And));
        assert_eq!(normalized[0].field.as_deref(), Some("sex"));

        // editable list is untouched
        assert_eq!(model.len(), 2);
        assert!(model.clauses()[0].combine.is_none());
    }

    #[test]
    fn test_normalized_clauses_never_incomplete() {
        let mut model = model(CombinePolicy::Any);
        model.replace_clauses(vec![
            Clause {
                column: Some("Demographics".into()),
                field: Some("sex".into()),
                ..Clause::empty()
            },
            Clause::new("Demographics", "sex", "Equals", "Female"),
            Clause {
                field: Some("sex".into()),
                query_type: Some("Equals".into()),
                ..Clause::empty()
            },
            Clause::new("Admission", "ward", "Equals", "A"),
        ]);

        let normalized = model.normalized_clauses();
        assert_eq!(normalized.len(), 2);
        assert!(normalized.iter().all(Clause::is_complete));
        assert!(normalized.iter().all(|c| c.combine == Some(Combine::Or)));
        assert_eq!(normalized[1].column.as_deref(), Some("Admission"));
    }

    #[test]
    fn test_normalized_clauses_idempotent() {
        let mut model = model(CombinePolicy::All);
        model.replace_clauses(vec![
            Clause::new("Demographics", "sex", "Equals", "Male"),
            Clause::new("Admission", "ward", "Any Of", json!(["A", "B"])),
        ]);
        assert_eq!(model.normalized_clauses(), model.normalized_clauses());
    }

    #[test]
    fn test_replace_with_empty_list() {
        let mut model = model(CombinePolicy::All);
        model.add_clause();
        model.replace_clauses(vec![]);
        assert_eq!(model.clauses(), &[Clause::empty()]);
    }

    #[test]
    fn test_field_classification() {
        let model = model(CombinePolicy::All);
        assert!(model.is_date("Demographics", "date_of_birth"));
        assert!(model.is_date_type("Demographics", "date_of_birth"));
        assert!(model.is_date_time("Admission", "admitted"));
        assert!(model.is_date_type("Admission", "admitted"));
        assert!(model.is_select("Demographics", "sex"));
        assert!(model.is_select_many("Admission", "tags"));
        assert!(model.is_boolean("Demographics", "deceased"));
        assert!(model.is_number("Demographics", "height"));
        assert!(model.is_text("Admission", "ward"));

        assert!(!model.is_text("Demographics", "sex"));
        assert!(!model.is_date("Demographics", "missing"));
        assert!(!model.is_date("", "date_of_birth"));
        assert!(!model.is_field_of_type("Demographics", "sex", &[]));
    }

    #[test]
    fn test_choices() {
        let model = model(CombinePolicy::All);
        assert_eq!(
            model.choices_for("Demographics", "sex"),
            Some(vec!["Female".to_string(), "Male".to_string()])
        );
        assert_eq!(
            model.choices_for("Admission", "ward"),
            Some(vec!["A".to_string(), "B".to_string()])
        );
        assert_eq!(model.choices_for("Demographics", "height"), None);
        assert_eq!(model.choices_for("Nowhere", "height"), None);
    }

    #[test]
    fn test_readable_query_type() {
        assert_eq!(readable_query_type("Equals"), "is");
        assert_eq!(readable_query_type("Before"), "is before");
        assert_eq!(readable_query_type("After"), "is after");
        assert_eq!(readable_query_type("Any Of"), "is");
        assert_eq!(readable_query_type("Contains"), "contains");
    }
}
