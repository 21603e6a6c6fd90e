//! Paginated page returned by the server.

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A page of rows with pagination metadata.
///
/// Rows are opaque to the table engine; only `meta` is read, to drive the
/// navigation controls.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::PaginatedData;
///
/// let page: PaginatedData = serde_json::from_str(r#"{
///     "data": [{"id": 1}],
///     "meta": {"current_page": 2, "last_page": 3, "per_page": 10, "total": 25,
///              "from": 11, "to": 20, "path": "/users", "links": []},
///     "links": {"first": "/users?page=1", "last": "/users?page=3",
///               "prev": "/users?page=1", "next": "/users?page=3"}
/// }"#).unwrap();
///
/// assert_eq!(page.meta.next_page(), Some(3));
/// assert!(!page.meta.is_first_page());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "Row: DeserializeOwned"))]
pub struct PaginatedData<Row = serde_json::Value> {
    #[serde(default)]
    pub data: Vec<Row>,
    pub meta: PageMeta,
    #[serde(default)]
    pub links: PageLinks,
}

impl<Row> PaginatedData<Row> {
    /// Returns the rows of this page.
    pub fn rows(&self) -> &[Row] {
        &self.data
    }

    /// Returns the number of rows in this page.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if this page has no rows.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Pagination metadata of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// 1-based index of this page.
    pub current_page: u32,
    /// 1-based position of the first row, `None` on an empty page.
    #[serde(default)]
    pub from: Option<u64>,
    /// 1-based position of the last row, `None` on an empty page.
    #[serde(default)]
    pub to: Option<u64>,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
    /// Request path of the listing; also the fallback table identity.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub links: Vec<PageLinkDescriptor>,
}

impl PageMeta {
    pub fn is_first_page(&self) -> bool {
        self.current_page <= 1
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page >= self.last_page
    }

    /// Previous page number, `None` on the first page.
    pub fn previous_page(&self) -> Option<u32> {
        if self.is_first_page() {
            None
        } else {
            Some(self.current_page - 1)
        }
    }

    /// Next page number, `None` on the last page.
    pub fn next_page(&self) -> Option<u32> {
        if self.is_last_page() {
            None
        } else {
            Some(self.current_page + 1)
        }
    }

    /// Clamps a requested page number into `1..=last_page`.
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.last_page.max(1))
    }
}

/// A numbered or prev/next link of the pager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinkDescriptor {
    pub url: Option<String>,
    pub label: String,
    #[serde(default)]
    pub active: bool,
}

/// First/last/prev/next URLs of the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}
