//! Transport seam between the table engine and whatever serves the rows.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::PaginatedData;
use crate::request::FlatParams;

/// One data fetch for the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRequest {
    /// Listing path, e.g. `/users`.
    pub path: String,
    pub params: FlatParams,
    /// Server resources to refresh; `None` refreshes everything.
    pub only: Option<Vec<String>>,
    /// Monotonic number of the signature change that caused this fetch.
    pub generation: u64,
}

/// Something that can turn a [`VisitRequest`] into a page of rows.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn visit(&self, request: VisitRequest) -> Result<PaginatedData, FetchError>;
}
