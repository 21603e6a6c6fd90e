//! Preference persistence.
//!
//! A [`PreferenceStore`] reads and writes one versioned [`TablePreferences`]
//! record per table identity through a pluggable [`PreferenceBackend`].
//! Reads never fail: anything missing or unreadable yields a default record.

mod backend;
mod latch;
mod memory;
mod sanitize;
mod snapshot;
mod sqlite;

pub use backend::PreferenceBackend;
pub use latch::ErrorLatch;
pub use memory::MemoryBackend;
pub use sanitize::*;
pub use snapshot::PreferenceSnapshot;
pub use sqlite::SqliteBackend;

use std::sync::Arc;

use log::debug;
use log::error;
use log::warn;

use crate::TableConfig;
use crate::error::StoreError;
use crate::model::ColumnId;
use crate::model::TablePreferences;

/// Typed, fail-soft preference store.
///
/// Cheap to clone; clones share the backend and the error latch.
///
/// # Example
///
/// ```ignore
/// use datagrid_lib::prefs::{MemoryBackend, PreferenceStore};
/// use datagrid_lib::TableConfig;
///
/// let store = PreferenceStore::new(MemoryBackend::new(), TableConfig::default());
/// let prefs = store.load("users", None).await;
/// store.save("users", &prefs).await;
/// store.delete("users").await;
/// ```
#[derive(Clone)]
pub struct PreferenceStore {
    backend: Arc<dyn PreferenceBackend>,
    config: TableConfig,
    errors: ErrorLatch,
}

impl PreferenceStore {
    /// Creates a store over the given backend.
    pub fn new(backend: impl PreferenceBackend + 'static, config: TableConfig) -> Self {
        Self::from_arc(Arc::new(backend), config)
    }

    /// Creates a store over a shared backend.
    pub fn from_arc(backend: Arc<dyn PreferenceBackend>, config: TableConfig) -> Self {
        Self {
            backend,
            config,
            errors: ErrorLatch::new(),
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The channel load and save failures are reported on.
    pub fn errors(&self) -> &ErrorLatch {
        &self.errors
    }

    /// Storage key for a table identity.
    pub fn key_for(&self, table_id: &str) -> String {
        format!("{}{}", self.config.key_prefix, table_id)
    }

    /// Loads and sanitizes the record for a table.
    ///
    /// Missing, malformed or unreadable records yield a default record; the
    /// failure is logged and raised on the error latch, never returned.
    pub async fn load(&self, table_id: &str, valid_ids: Option<&[ColumnId]>) -> TablePreferences {
        match self.try_load(table_id, valid_ids).await {
            Ok(Some(prefs)) => prefs,
            Ok(None) => TablePreferences::defaults(&self.config),
            Err(StoreError::Deserialization(e)) => {
                warn!("Discarding unreadable preferences for '{}': {}", table_id, e);
                TablePreferences::defaults(&self.config)
            }
            Err(e) => {
                warn!("Failed to load preferences for '{}': {}", table_id, e);
                self.errors.raise(e.to_string());
                TablePreferences::defaults(&self.config)
            }
        }
    }

    /// Loads and sanitizes the record for a table, surfacing failures.
    ///
    /// Returns `Ok(None)` when nothing is stored.
    pub async fn try_load(
        &self,
        table_id: &str,
        valid_ids: Option<&[ColumnId]>,
    ) -> Result<Option<TablePreferences>, StoreError> {
        let Some(bytes) = self.backend.get_bytes(&self.key_for(table_id)).await? else {
            debug!("No stored preferences for '{}'", table_id);
            return Ok(None);
        };
        let raw: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(StoreError::Deserialization)?;
        Ok(Some(sanitize(&raw, valid_ids, &self.config)))
    }

    /// Persists the record for a table.
    ///
    /// Failures are logged and raised on the error latch; a successful write
    /// clears it. Returns whether the record was written.
    pub async fn save(&self, table_id: &str, prefs: &TablePreferences) -> bool {
        match self.try_save(table_id, prefs).await {
            Ok(()) => {
                self.errors.clear();
                true
            }
            Err(e) => {
                error!("Failed to save preferences for '{}': {}", table_id, e);
                self.errors.raise(e.to_string());
                false
            }
        }
    }

    /// Persists the record for a table, surfacing failures.
    pub async fn try_save(&self, table_id: &str, prefs: &TablePreferences) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(prefs).map_err(StoreError::Serialization)?;
        self.backend.set_bytes(&self.key_for(table_id), bytes).await?;
        debug!("Saved preferences for '{}'", table_id);
        Ok(())
    }

    /// Removes the record for a table. Removing a missing record is fine.
    pub async fn delete(&self, table_id: &str) -> bool {
        match self.backend.delete(&self.key_for(table_id)).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to delete preferences for '{}': {}", table_id, e);
                self.errors.raise(e.to_string());
                false
            }
        }
    }

    /// Table identities that have a stored record.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let prefix = &self.config.key_prefix;
        let keys = self.backend.keys_with_prefix(prefix).await?;
        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(prefix.as_str()).map(str::to_string))
            .collect())
    }

    /// Sanitizes an arbitrary JSON value with this store's limits.
    pub fn sanitize(&self, raw: &serde_json::Value, valid_ids: Option<&[ColumnId]>) -> TablePreferences {
        sanitize(raw, valid_ids, &self.config)
    }
}
