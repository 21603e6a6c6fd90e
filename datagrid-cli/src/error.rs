//! CLI error type

use datagrid_lib::error::ConfigError;
use datagrid_lib::error::Rejection;
use datagrid_lib::error::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("no data directory available; pass --db or set DATAGRID_HOME")]
    NoDataDir,

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    ConfigFile(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CliError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
