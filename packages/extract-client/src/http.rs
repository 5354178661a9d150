//! HTTP implementation of [`ExtractApi`].

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ExtractError, Result};
use crate::traits::api::ExtractApi;
use crate::types::{
    job::{ExtractId, ExtractRequest, ExtractStatus, ExtractSubmitted},
    search::{SearchPage, SearchRequest},
};

/// Talks to the search server's extract endpoints.
#[derive(Clone)]
pub struct HttpExtractApi {
    client: Client,
    base_url: String,
}

impl HttpExtractApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Use an existing `reqwest` client (shared pools, custom TLS, auth headers).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Where a finished artifact can be fetched, e.g. to open in a browser.
    pub fn download_url(&self, id: &ExtractId) -> String {
        format!("{}/search/extract/download/{}", self.base_url, id)
    }

    fn search_url(&self) -> String {
        format!("{}/search/extract/", self.base_url)
    }

    fn submit_url(&self) -> String {
        format!("{}/search/extract/download", self.base_url)
    }

    fn status_url(&self, id: &ExtractId) -> String {
        format!("{}/search/extract/status/{}", self.base_url, id)
    }

    async fn check(resp: Response) -> Result<Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp)
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> Result<T> {
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ExtractApi for HttpExtractApi {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let body = request.to_body()?;
        debug!(url = %self.search_url(), page_number = request.page_number, "POST search");

        let resp = self.client.post(self.search_url()).json(&body).send().await?;
        Self::json(resp).await
    }

    async fn submit_extract(&self, request: &ExtractRequest) -> Result<ExtractSubmitted> {
        debug!(url = %self.submit_url(), "POST extract");

        let resp = self
            .client
            .post(self.submit_url())
            .json(request)
            .send()
            .await?;
        Self::json(resp).await
    }

    async fn extract_status(&self, id: &ExtractId) -> Result<ExtractStatus> {
        let resp = self.client.get(self.status_url(id)).send().await?;
        Self::json(resp).await
    }

    async fn download_extract(&self, id: &ExtractId) -> Result<Bytes> {
        let resp = self.client.get(self.download_url(id)).send().await?;
        let resp = Self::check(resp).await?;
        Ok(resp.bytes().await?)
    }
}
