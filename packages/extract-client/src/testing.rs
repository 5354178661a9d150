//! Testing utilities including a scripted [`ExtractApi`].
//!
//! Useful for exercising the query executor, job client and session without
//! a running search server.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{ExtractError, Result};
use crate::traits::api::ExtractApi;
use crate::types::{
    job::{ExtractId, ExtractRequest, ExtractStatus, ExtractSubmitted, RemoteState},
    search::{SearchPage, SearchRequest},
};

/// Scripted answer to a status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStatus {
    Pending,
    Success,
    Failure,
    /// Transport-level failure with this HTTP status.
    Error(u16),
}

/// Record of a call made to the mock API.
#[derive(Debug, Clone)]
pub enum MockApiCall {
    Search { body: Value },
    Submit { request: ExtractRequest },
    Status { id: ExtractId },
    Download { id: ExtractId },
}

#[derive(Debug, Clone)]
enum MockSearch {
    Page(SearchPage),
    Error(u16),
}

/// A mock API with deterministic, configurable responses.
///
/// Search responses and status answers are consumed in order. Once the
/// status script runs out every poll answers `PENDING`; once the search
/// script runs out every search answers an empty page.
pub struct MockExtractApi {
    searches: Arc<RwLock<VecDeque<MockSearch>>>,

    /// Delay applied to the Nth search call (0-based)
    search_delays: Arc<RwLock<HashMap<usize, Duration>>>,

    extract_id: Option<ExtractId>,
    submit_delay: Duration,
    submit_error: Option<u16>,

    statuses: Arc<RwLock<VecDeque<MockStatus>>>,
    status_delay: Duration,

    artifact: Bytes,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockApiCall>>>,
}

impl Default for MockExtractApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractApi {
    /// Create a mock that assigns extract id `abc123`.
    pub fn new() -> Self {
        Self {
            searches: Default::default(),
            search_delays: Default::default(),
            extract_id: Some(ExtractId::from("abc123")),
            submit_delay: Duration::ZERO,
            submit_error: None,
            statuses: Default::default(),
            status_delay: Duration::ZERO,
            artifact: Bytes::new(),
            calls: Default::default(),
        }
    }

    /// Queue a search response page.
    pub fn with_search_page(self, page: SearchPage) -> Self {
        self.searches.write().unwrap().push_back(MockSearch::Page(page));
        self
    }

    /// Queue a failing search response.
    pub fn with_search_error(self, status: u16) -> Self {
        self.searches
            .write()
            .unwrap()
            .push_back(MockSearch::Error(status));
        self
    }

    /// Delay the response of the Nth search call.
    pub fn with_search_delay(self, call: usize, delay: Duration) -> Self {
        self.search_delays.write().unwrap().insert(call, delay);
        self
    }

    pub fn with_extract_id(mut self, id: &str) -> Self {
        self.extract_id = Some(ExtractId::from(id));
        self
    }

    /// Submission responses carry no `extract_id`.
    pub fn without_extract_id(mut self) -> Self {
        self.extract_id = None;
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn with_submit_error(mut self, status: u16) -> Self {
        self.submit_error = Some(status);
        self
    }

    /// Append answers to the status script.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = MockStatus>) -> Self {
        self.statuses.write().unwrap().extend(statuses);
        self
    }

    /// Hold every status answer back for `delay`.
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    pub fn with_artifact(mut self, artifact: impl Into<Bytes>) -> Self {
        self.artifact = artifact.into();
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<MockApiCall> {
        self.calls.read().unwrap().clone()
    }

    /// Bodies of all search calls, in order.
    pub fn search_bodies(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockApiCall::Search { body } => Some(body),
                _ => None,
            })
            .collect()
    }

    /// All submission requests, in order.
    pub fn submissions(&self) -> Vec<ExtractRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockApiCall::Submit { request } => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MockApiCall) {
        self.calls.write().unwrap().push(call);
    }

    fn search_count(&self) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, MockApiCall::Search { .. }))
            .count()
    }
}

fn mock_error(status: u16) -> ExtractError {
    ExtractError::Api {
        status,
        message: "mock error".to_string(),
    }
}

#[async_trait]
impl ExtractApi for MockExtractApi {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let index = self.search_count();
        self.record(MockApiCall::Search {
            body: request.to_body()?,
        });

        let response = self.searches.write().unwrap().pop_front();
        let delay = self.search_delays.read().unwrap().get(&index).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match response {
            Some(MockSearch::Page(page)) => Ok(page),
            Some(MockSearch::Error(status)) => Err(mock_error(status)),
            None => Ok(SearchPage::default()),
        }
    }

    async fn submit_extract(&self, request: &ExtractRequest) -> Result<ExtractSubmitted> {
        self.record(MockApiCall::Submit {
            request: request.clone(),
        });

        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }

        match self.submit_error {
            Some(status) => Err(mock_error(status)),
            None => Ok(ExtractSubmitted {
                extract_id: self.extract_id.clone(),
            }),
        }
    }

    async fn extract_status(&self, id: &ExtractId) -> Result<ExtractStatus> {
        self.record(MockApiCall::Status { id: id.clone() });

        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }

        let next = self
            .statuses
            .write()
            .unwrap()
            .pop_front()
            .unwrap_or(MockStatus::Pending);

        let state = match next {
            MockStatus::Pending => RemoteState::Pending,
            MockStatus::Success => RemoteState::Success,
            MockStatus::Failure => RemoteState::Failure,
            MockStatus::Error(status) => return Err(mock_error(status)),
        };
        Ok(ExtractStatus { state })
    }

    async fn download_extract(&self, id: &ExtractId) -> Result<Bytes> {
        self.record(MockApiCall::Download { id: id.clone() });
        Ok(self.artifact.clone())
    }
}
