//! Table configuration

use serde::Deserialize;

use crate::error::ConfigError;

/// Limits and defaults shared by every table instance.
///
/// Controls the enumerated page sizes, how many columns may be pinned or
/// sorted at once, and how persisted records are keyed.
///
/// # Example
///
/// ```
/// use datagrid_lib::TableConfig;
///
/// let config = TableConfig::default()
///     .with_per_page_options(vec![20, 50])
///     .with_default_per_page(20)
///     .with_max_pinned(2);
///
/// assert!(config.validate().is_ok());
/// assert!(config.allows_per_page(50));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Page sizes a user may pick from.
    ///
    /// Default: `[10, 25, 50, 100]`
    pub per_page_options: Vec<u32>,

    /// Page size used when nothing else is known.
    ///
    /// Default: 10
    pub default_per_page: u32,

    /// Maximum number of pinned columns, left and right combined.
    ///
    /// Default: 3
    pub max_pinned: usize,

    /// Maximum number of entries in the sort priority list.
    ///
    /// Default: 3
    pub max_sorting: usize,

    /// Schema version stamped on every persisted record.
    ///
    /// Default: 1
    pub schema_version: u32,

    /// Separator used when a multi-value filter is flattened to one string.
    ///
    /// Default: `","`
    pub filter_delimiter: String,

    /// Prefix prepended to the table identity to form the storage key.
    ///
    /// Default: `"datatable.preferences."`
    pub key_prefix: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            per_page_options: vec![10, 25, 50, 100],
            default_per_page: 10,
            max_pinned: 3,
            max_sorting: 3,
            schema_version: 1,
            filter_delimiter: ",".to_string(),
            key_prefix: "datatable.preferences.".to_string(),
        }
    }
}

impl TableConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the enumerated page sizes.
    pub fn with_per_page_options(mut self, options: Vec<u32>) -> Self {
        self.per_page_options = options;
        self
    }

    /// Sets the default page size.
    pub fn with_default_per_page(mut self, per_page: u32) -> Self {
        self.default_per_page = per_page;
        self
    }

    /// Sets the pinned column limit.
    pub fn with_max_pinned(mut self, max: usize) -> Self {
        self.max_pinned = max;
        self
    }

    /// Sets the sort priority list limit.
    pub fn with_max_sorting(mut self, max: usize) -> Self {
        self.max_sorting = max;
        self
    }

    /// Sets the schema version.
    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    /// Sets the multi-value filter separator.
    pub fn with_filter_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.filter_delimiter = delimiter.into();
        self
    }

    /// Sets the storage key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Returns `true` if `per_page` is one of the enumerated page sizes.
    pub fn allows_per_page(&self, per_page: u32) -> bool {
        self.per_page_options.contains(&per_page)
    }

    /// Checks that the config is internally consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_page_options.is_empty() {
            return Err(ConfigError::NoPerPageOptions);
        }
        if self.per_page_options.contains(&0) {
            return Err(ConfigError::ZeroPerPage);
        }
        if !self.allows_per_page(self.default_per_page) {
            return Err(ConfigError::DefaultPerPageNotAllowed {
                value: self.default_per_page,
            });
        }
        if self.schema_version == 0 {
            return Err(ConfigError::ZeroSchemaVersion);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TableConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.per_page_options, vec![10, 25, 50, 100]);
        assert_eq!(config.max_pinned, 3);
        assert_eq!(config.max_sorting, 3);
    }

    #[test]
    fn test_default_per_page_must_be_an_option() {
        let config = TableConfig::default().with_default_per_page(40);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DefaultPerPageNotAllowed { value: 40 })
        ));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: TableConfig = serde_json::from_str(r#"{"max_pinned": 5}"#).unwrap();
        assert_eq!(config.max_pinned, 5);
        assert_eq!(config.default_per_page, 10);
        assert_eq!(config.filter_delimiter, ",");
    }
}
