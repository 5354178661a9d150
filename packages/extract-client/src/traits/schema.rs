use crate::types::schema::FieldSpec;

/// Read-only view of the record schema.
///
/// The schema definition format is owned elsewhere; the core only asks for
/// single field declarations and named choice lists.
pub trait SchemaLookup: Send + Sync {
    /// Declaration of `field` within `column`, if both exist.
    fn find_field(&self, column: &str, field: &str) -> Option<FieldSpec>;

    /// Values of a named reference-data list.
    fn lookup_list(&self, _name: &str) -> Option<Vec<String>> {
        None
    }
}
