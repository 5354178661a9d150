//! Transport seam for the search server.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::types::{
    job::{ExtractId, ExtractRequest, ExtractStatus, ExtractSubmitted},
    search::{SearchPage, SearchRequest},
};

/// The four calls the core makes against the search server.
///
/// Implemented over HTTP by [`HttpExtractApi`](crate::HttpExtractApi) and by
/// [`MockExtractApi`](crate::testing::MockExtractApi) in tests.
#[async_trait]
pub trait ExtractApi: Send + Sync {
    /// Run a preview search for one page.
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage>;

    /// Start an asynchronous extract.
    async fn submit_extract(&self, request: &ExtractRequest) -> Result<ExtractSubmitted>;

    /// Current state of an extract.
    async fn extract_status(&self, id: &ExtractId) -> Result<ExtractStatus>;

    /// Fetch the finished artifact.
    async fn download_extract(&self, id: &ExtractId) -> Result<Bytes>;
}
