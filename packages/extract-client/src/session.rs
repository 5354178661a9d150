//! One user's search screen: criteria, preview results, extract and filters.

use bytes::Bytes;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::criteria::CriteriaModel;
use crate::error::Result;
use crate::filters::SavedFilters;
use crate::job::ExtractJobClient;
use crate::query::{QueryExecutor, SearchOutcome, SearchState};
use crate::traits::{api::ExtractApi, store::SavedFilterStore};
use crate::types::{filter::SavedFilter, job::ExtractJob, slice::DataSlice};

/// Ties a [`CriteriaModel`] to its preview search, extract job and saved
/// filters.
///
/// Any change to the criteria made through the session clears the preview
/// result and abandons the tracked extract, so neither can describe a query
/// other than the one on screen.
pub struct ExtractSession<A: ?Sized, S: ?Sized> {
    criteria: CriteriaModel,
    search: QueryExecutor<A>,
    extract: ExtractJobClient<A>,
    filters: SavedFilters<S>,
    slice: DataSlice,
}

impl<A, S> ExtractSession<A, S>
where
    A: ExtractApi + ?Sized + 'static,
    S: SavedFilterStore + ?Sized,
{
    pub fn new(criteria: CriteriaModel, api: Arc<A>, store: Arc<S>, config: &ClientConfig) -> Self {
        Self {
            criteria,
            search: QueryExecutor::new(api.clone()).with_pagination(config.pagination),
            extract: ExtractJobClient::new(api, config.poll.clone()),
            filters: SavedFilters::new(store),
            slice: DataSlice::new(),
        }
    }

    pub fn criteria(&self) -> &CriteriaModel {
        &self.criteria
    }

    /// Edit the criteria, then refresh.
    pub fn edit_criteria<R>(&mut self, edit: impl FnOnce(&mut CriteriaModel) -> R) -> R {
        let result = edit(&mut self.criteria);
        self.refresh();
        result
    }

    /// Drop preview results and stop following any extract.
    pub fn refresh(&mut self) {
        self.search.reset();
        self.extract.cancel();
    }

    // =========================================================================
    // Preview search
    // =========================================================================

    pub async fn search(&self, page_number: u32) -> Result<SearchOutcome> {
        self.search.execute(&self.criteria, page_number).await
    }

    pub fn search_state(&self) -> SearchState {
        self.search.state()
    }

    // =========================================================================
    // Extract
    // =========================================================================

    pub fn slice(&self) -> &DataSlice {
        &self.slice
    }

    pub fn slice_mut(&mut self) -> &mut DataSlice {
        &mut self.slice
    }

    /// Submit the current normalized clauses and data slice as an extract.
    pub fn submit_extract(&mut self) -> Result<()> {
        let clauses = self.criteria.normalized_clauses();
        self.extract.submit(&clauses, &self.slice)
    }

    /// The single extract button: download when ready, do nothing while
    /// waiting, submit otherwise.
    pub async fn extract_or_download(&mut self) -> Result<Option<Bytes>> {
        let phase = self.extract.phase();
        if self.extract.job().download_ready() {
            return self.extract.request_download().await;
        }
        if !phase.is_in_flight() {
            self.submit_extract()?;
        }
        Ok(None)
    }

    pub fn job(&self) -> ExtractJob {
        self.extract.job()
    }

    pub async fn wait_for_extract(&self) -> ExtractJob {
        self.extract.wait().await
    }

    pub async fn request_download(&self) -> Result<Option<Bytes>> {
        self.extract.request_download().await
    }

    // =========================================================================
    // Saved filters
    // =========================================================================

    pub fn saved_filters(&self) -> &[SavedFilter] {
        self.filters.filters()
    }

    /// Replace the criteria with a saved filter's snapshot.
    pub fn apply_saved_filter(&mut self, index: usize) -> bool {
        let applied = self.filters.apply(index, &mut self.criteria);
        if applied {
            self.refresh();
        }
        applied
    }

    pub async fn save_current_as_filter(&mut self, name: &str) -> Result<&SavedFilter> {
        self.filters.save_current(name, &self.criteria).await
    }

    pub fn edit_saved_filter(&mut self, index: usize, filter: SavedFilter) -> bool {
        self.filters.edit(index, filter)
    }
}
