//! Ice and Fire API client.

use super::types::{BookRecord, CharacterRecord};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors returned by the API client
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be built or the transport failed
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{url} returned status {status}")]
    Status { status: StatusCode, url: String },

    /// Response body was not the expected JSON shape
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Client for the Ice and Fire REST API
///
/// Resources are addressed two ways: the books listing lives under a fixed
/// path relative to the base URL, while individual books and characters are
/// fetched through the absolute references embedded in other resources.
#[derive(Debug, Clone)]
pub struct IceAndFireClient {
    client: Client,
    base_url: String,
}

impl IceAndFireClient {
    /// Create a new API client
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one page of the books listing
    ///
    /// `page` is 1-based, matching the API's own numbering.
    pub async fn list_books(&self, page: u32, page_size: u32) -> Result<Vec<BookRecord>, ApiError> {
        let url = format!(
            "{}/books?page={}&pageSize={}",
            self.base_url, page, page_size
        );
        self.get(&url).await
    }

    /// Fetch a single book through its resource reference
    pub async fn get_book(&self, reference: &str) -> Result<BookRecord, ApiError> {
        self.get(reference).await
    }

    /// Fetch a single character through its resource reference
    pub async fn get_character(&self, reference: &str) -> Result<CharacterRecord, ApiError> {
        self.get(reference).await
    }

    /// Make a GET request and decode the JSON response
    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!(url = %url, "Making API request");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            debug!(url = %url, status = %status, "Request failed");
            return Err(ApiError::Status {
                status,
                url: url.to_string(),
            });
        }

        response.json::<T>().await.map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
