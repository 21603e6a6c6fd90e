//! SQLite preference backend with in-memory cache.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_trait::async_trait;
use dashmap::DashMap;

use super::PreferenceBackend;
use crate::error::StoreError;

/// SQLite-backed preference storage with a write-through DashMap cache.
///
/// Records persist across process restarts. File databases use WAL journal
/// mode.
///
/// # Example
///
/// ```ignore
/// use datagrid_lib::prefs::SqliteBackend;
///
/// // File-based
/// let backend = SqliteBackend::open("preferences.db").await?;
///
/// // In-memory (for testing)
/// let backend = SqliteBackend::open_in_memory().await?;
/// ```
pub struct SqliteBackend {
    client: Client,
    cache: DashMap<String, Vec<u8>>,
}

impl SqliteBackend {
    /// Opens a backend at the given path, creating the database if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;

        Self::init_schema(&client).await?;

        Ok(Self {
            client,
            cache: DashMap::new(),
        })
    }

    /// Opens an in-memory backend. Data is lost when it is dropped.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;

        Self::init_schema(&client).await?;

        Ok(Self {
            client,
            cache: DashMap::new(),
        })
    }

    async fn init_schema(client: &Client) -> Result<(), StoreError> {
        client
            .conn(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS preferences (
                        key TEXT PRIMARY KEY,
                        value BLOB NOT NULL
                    )",
                    [],
                )
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceBackend for SqliteBackend {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value.clone()));
        }

        let key_owned = key.to_string();
        let result = self
            .client
            .conn(move |conn| {
                let mut stmt = conn.prepare("SELECT value FROM preferences WHERE key = ?")?;
                let mut rows = stmt.query([&key_owned])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get::<_, Vec<u8>>(0)?)),
                    None => Ok(None),
                }
            })
            .await?;

        if let Some(ref value) = result {
            self.cache.insert(key.to_string(), value.clone());
        }

        Ok(result)
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let key_owned = key.to_string();
        let value_clone = value.clone();

        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT INTO preferences (key, value) VALUES (?, ?)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    rusqlite::params![&key_owned, &value_clone],
                )
            })
            .await?;

        self.cache.insert(key.to_string(), value);

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key_owned = key.to_string();

        self.client
            .conn(move |conn| conn.execute("DELETE FROM preferences WHERE key = ?", [&key_owned]))
            .await?;

        self.cache.remove(key);

        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        // Exact prefix match; LIKE would treat '%' and '_' in ids as wildcards.
        let prefix_owned = prefix.to_string();
        self.client
            .conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT key FROM preferences WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
                )?;
                let rows = stmt.query_map([&prefix_owned], |row| row.get(0))?;
                rows.collect::<Result<Vec<String>, _>>()
            })
            .await
            .map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_roundtrip() {
        let backend = SqliteBackend::open_in_memory().await.unwrap();
        backend.set_bytes("datatable.preferences.users", b"{}".to_vec()).await.unwrap();
        backend.set_bytes("datatable.preferences.users", b"[]".to_vec()).await.unwrap();

        assert_eq!(
            backend.get_bytes("datatable.preferences.users").await.unwrap(),
            Some(b"[]".to_vec())
        );
        assert_eq!(
            backend.keys_with_prefix("datatable.preferences.").await.unwrap(),
            vec!["datatable.preferences.users"]
        );

        backend.delete("datatable.preferences.users").await.unwrap();
        backend.delete("datatable.preferences.users").await.unwrap();
        assert_eq!(backend.get_bytes("datatable.preferences.users").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.db");

        {
            let backend = SqliteBackend::open(&path).await.unwrap();
            backend.set_bytes("k", b"v".to_vec()).await.unwrap();
        }

        let backend = SqliteBackend::open(&path).await.unwrap();
        assert_eq!(backend.get_bytes("k").await.unwrap(), Some(b"v".to_vec()));
    }
}
