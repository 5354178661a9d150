//! Known saved filters and their interaction with the criteria model.

use std::sync::Arc;
use tracing::info;

use crate::criteria::CriteriaModel;
use crate::error::Result;
use crate::traits::store::SavedFilterStore;
use crate::types::filter::SavedFilter;

/// In-memory list of saved filters backed by a [`SavedFilterStore`].
pub struct SavedFilters<S: ?Sized> {
    store: Arc<S>,
    filters: Vec<SavedFilter>,
}

impl<S: SavedFilterStore + ?Sized> SavedFilters<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            filters: Vec::new(),
        }
    }

    /// Start from the filters the store already knows.
    pub async fn load(store: Arc<S>) -> Result<Self> {
        let filters = store.list().await?;
        Ok(Self { store, filters })
    }

    pub fn filters(&self) -> &[SavedFilter] {
        &self.filters
    }

    pub fn get(&self, index: usize) -> Option<&SavedFilter> {
        self.filters.get(index)
    }

    /// Replace the model's clause list with the filter's snapshot.
    pub fn apply(&self, index: usize, criteria: &mut CriteriaModel) -> bool {
        match self.filters.get(index) {
            Some(filter) => {
                criteria.replace_clauses(filter.criteria.clone());
                true
            }
            None => false,
        }
    }

    /// Persist the model's normalized clauses under `name` and remember the
    /// confirmed filter. Names are not checked for uniqueness.
    pub async fn save_current(
        &mut self,
        name: &str,
        criteria: &CriteriaModel,
    ) -> Result<&SavedFilter> {
        let snapshot = criteria.normalized_clauses();
        let saved = self.store.save(name, &snapshot).await?;
        info!(name, clauses = snapshot.len(), "Saved filter");
        self.filters.push(saved);
        Ok(&self.filters[self.filters.len() - 1])
    }

    /// Replace the filter at `index`. The criteria model is not touched.
    pub fn edit(&mut self, index: usize, filter: SavedFilter) -> bool {
        match self.filters.get_mut(index) {
            Some(slot) => {
                *slot = filter;
                true
            }
            None => false,
        }
    }
}
