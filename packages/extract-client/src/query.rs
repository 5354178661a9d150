//! Preview search: one request per page, latest answer wins.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error};

use crate::criteria::CriteriaModel;
use crate::error::Result;
use crate::traits::api::ExtractApi;
use crate::types::{
    clause::Clause,
    search::{PaginationStyle, SearchPage, SearchRequest},
};

/// Published state of the preview search.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchState {
    #[default]
    Idle,
    InProgress { page_number: u32 },
    /// No complete clauses; nothing was sent.
    CompletedEmpty,
    Completed(SearchPage),
    /// The last search failed; no partial results are kept.
    Failed,
}

impl SearchState {
    pub fn is_searched(&self) -> bool {
        matches!(self, SearchState::CompletedEmpty | SearchState::Completed(_))
    }
}

/// Result of one [`QueryExecutor::execute`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// There were no complete clauses, so no request was made.
    NoCriteria,
    Page(SearchPage),
    /// A newer search started while this one was in flight; its response
    /// was discarded.
    Superseded,
}

/// Runs preview searches and publishes the latest result.
pub struct QueryExecutor<A: ?Sized> {
    api: Arc<A>,
    style: PaginationStyle,
    generation: AtomicU64,
    state: watch::Sender<SearchState>,
}

impl<A: ExtractApi + ?Sized> QueryExecutor<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            style: PaginationStyle::default(),
            generation: AtomicU64::new(0),
            state: watch::Sender::new(SearchState::Idle),
        }
    }

    pub fn with_pagination(mut self, style: PaginationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Forget the last result and ignore any search still in flight.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(SearchState::Idle);
    }

    /// Search with the model's clauses as they are at call time.
    pub fn execute<'a>(
        &'a self,
        criteria: &CriteriaModel,
        page_number: u32,
    ) -> impl Future<Output = Result<SearchOutcome>> + 'a {
        let clauses = criteria.normalized_clauses();
        self.execute_clauses(clauses, page_number)
    }

    /// Search with an already normalized clause list.
    pub async fn execute_clauses(
        &self,
        clauses: Vec<Clause>,
        page_number: u32,
    ) -> Result<SearchOutcome> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if clauses.is_empty() {
            debug!("No complete clauses, skipping search");
            self.state.send_replace(SearchState::CompletedEmpty);
            return Ok(SearchOutcome::NoCriteria);
        }

        let request = SearchRequest::new(clauses, page_number).with_style(self.style);
        debug!(
            page_number = request.page_number,
            clauses = request.clauses.len(),
            "Running preview search"
        );
        self.state.send_replace(SearchState::InProgress {
            page_number: request.page_number,
        });

        let result = self.api.search(&request).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(page_number = request.page_number, "Discarding superseded search response");
            return Ok(SearchOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                debug!(results = page.len(), "Preview search completed");
                self.state.send_replace(SearchState::Completed(page.clone()));
                Ok(SearchOutcome::Page(page))
            }
            Err(e) => {
                error!(error = %e, "Could not process this search");
                self.state.send_replace(SearchState::Failed);
                Err(e)
            }
        }
    }
}
