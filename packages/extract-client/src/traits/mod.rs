//! Core trait abstractions.

pub mod api;
pub mod schema;
pub mod store;

pub use api::ExtractApi;
pub use schema::SchemaLookup;
pub use store::SavedFilterStore;
