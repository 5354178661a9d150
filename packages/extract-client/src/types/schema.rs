//! Field declarations returned by a [`SchemaLookup`](crate::SchemaLookup).

use serde::{Deserialize, Serialize};

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Boolean,
    NullBoolean,
    String,
    Text,
    ManyToMany,
    ManyToManyMultiSelect,
    Date,
    DateTime,
    Float,
    BigInteger,
    Integer,
    PositiveIntegerField,
    Decimal,
    /// Any type name this client does not classify.
    #[serde(other)]
    Unknown,
}

impl FieldType {
    pub const BOOLEAN: &'static [FieldType] = &[FieldType::Boolean, FieldType::NullBoolean];
    pub const TEXT: &'static [FieldType] = &[FieldType::String, FieldType::Text];
    pub const DATE_LIKE: &'static [FieldType] = &[FieldType::Date, FieldType::DateTime];
    pub const NUMERIC: &'static [FieldType] = &[
        FieldType::Float,
        FieldType::BigInteger,
        FieldType::Integer,
        FieldType::PositiveIntegerField,
        FieldType::Decimal,
    ];
}

/// One field of a column as declared by the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Name of a reference-data list supplying the choices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_list: Option<String>,

    /// Inline enumeration of choices.
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            lookup_list: None,
            enum_values: None,
            title: None,
        }
    }

    pub fn with_lookup_list(mut self, list: impl Into<String>) -> Self {
        self.lookup_list = Some(list.into());
        self
    }

    pub fn with_enum(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_wire_names() {
        let spec: FieldSpec = serde_json::from_value(json!({
            "name": "consistency_token",
            "type": "positive_integer_field"
        }))
        .unwrap();
        assert_eq!(spec.field_type, FieldType::PositiveIntegerField);

        let spec: FieldSpec = serde_json::from_value(json!({
            "name": "sex",
            "type": "many_to_many",
            "lookup_list": "gender"
        }))
        .unwrap();
        assert_eq!(spec.field_type, FieldType::ManyToMany);
        assert_eq!(spec.lookup_list.as_deref(), Some("gender"));
    }

    #[test]
    fn test_unknown_type_is_tolerated() {
        let spec: FieldSpec =
            serde_json::from_value(json!({"name": "blob", "type": "foreign_key"})).unwrap();
        assert_eq!(spec.field_type, FieldType::Unknown);
    }
}
