//! Configuration error types

/// Errors reported by [`TableConfig::validate`](crate::TableConfig::validate).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No page sizes were configured.
    #[error("per_page_options must not be empty")]
    NoPerPageOptions,

    /// A page size of zero was configured.
    #[error("per_page_options must only contain positive sizes")]
    ZeroPerPage,

    /// The default page size is not one of the options.
    #[error("default_per_page {value} is not one of per_page_options")]
    DefaultPerPageNotAllowed { value: u32 },

    /// The schema version must start at 1.
    #[error("schema_version must be at least 1")]
    ZeroSchemaVersion,
}
