use async_trait::async_trait;

use crate::error::Result;
use crate::types::{clause::Clause, filter::SavedFilter};

/// Persistence for named clause-list snapshots.
#[async_trait]
pub trait SavedFilterStore: Send + Sync {
    /// Persist a snapshot and return it as confirmed by the store.
    async fn save(&self, name: &str, criteria: &[Clause]) -> Result<SavedFilter>;

    /// All filters known to the store.
    async fn list(&self) -> Result<Vec<SavedFilter>>;
}
