//! HTTP transport over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use url::Url;

use super::Transport;
use super::VisitRequest;
use crate::error::FetchError;
use crate::model::PaginatedData;

/// Header listing the server resources a partial reload should refresh.
pub const PARTIAL_DATA_HEADER: &str = "X-Partial-Data";

/// Fetches pages with `GET base_url + path ? query`.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use datagrid_lib::fetch::HttpTransport;
///
/// let transport = HttpTransport::new("https://app.example.com")?
///     .with_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    http_client: Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Creates a transport with a default client.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_client(base_url, Client::new())
    }

    /// Creates a transport over an existing client.
    pub fn with_client(base_url: &str, http_client: Client) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            base_url,
            http_client,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full request URL for a visit.
    pub fn url_for(&self, request: &VisitRequest) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(&request.path)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let query = request.params.to_query_string();
        url.set_query((!query.is_empty()).then_some(query.as_str()));
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn visit(&self, request: VisitRequest) -> Result<PaginatedData, FetchError> {
        let url = self.url_for(&request)?;
        debug!("GET {} (generation {})", url, request.generation);

        let mut builder = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(only) = &request.only {
            builder = builder.header(PARTIAL_DATA_HEADER, only.join(","));
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::http(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| FetchError::parse_with_body(e.to_string(), body))
    }
}
