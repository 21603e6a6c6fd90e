//! Error types

mod config;
mod fetch;
mod rejection;
mod store;

pub use config::*;
pub use fetch::*;
pub use rejection::*;
pub use store::*;

/// Top-level error for operations that cross module boundaries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Preference storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Fetching a page of rows failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A user action was refused because it would break a table invariant.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The table configuration is inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
