//! Owner of the persisted preference record of one table.

use chrono::Utc;
use log::debug;

use crate::model::ColumnId;
use crate::model::PreferencesPatch;
use crate::model::TablePreferences;
use crate::model::ViewPreferences;
use crate::prefs::PreferenceSnapshot;
use crate::prefs::PreferenceStore;

/// Load lifecycle of the preference record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Loading,
    Ready,
}

/// Persistence lifecycle after a mutation.
///
/// `SuppressedOnce` swallows exactly one automatic save, the one caused by a
/// reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistState {
    Idle,
    Saving,
    SuppressedOnce,
}

/// Loads, mutates and persists the preference record of a table identity.
///
/// Without an identity the controller still holds an in-memory record but
/// never touches storage.
pub struct PreferenceController {
    store: PreferenceStore,
    identity: Option<String>,
    column_ids: Vec<ColumnId>,
    preferences: TablePreferences,
    load_state: LoadState,
    persist_state: PersistState,
    default_snapshot: PreferenceSnapshot,
}

impl PreferenceController {
    pub fn new(store: PreferenceStore) -> Self {
        let preferences = TablePreferences::defaults(store.config());
        let default_snapshot = PreferenceSnapshot::of(&preferences.view);
        Self {
            store,
            identity: None,
            column_ids: Vec::new(),
            preferences,
            load_state: LoadState::Uninitialized,
            persist_state: PersistState::Idle,
            default_snapshot,
        }
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn preferences(&self) -> &TablePreferences {
        &self.preferences
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn persist_state(&self) -> PersistState {
        self.persist_state
    }

    pub fn is_ready(&self) -> bool {
        self.load_state == LoadState::Ready
    }

    /// Binds the controller to a table identity and live column set.
    ///
    /// Reloads and sanitizes the record whenever either changes. Returns
    /// `true` if the in-memory record was replaced.
    pub async fn bind(&mut self, identity: Option<String>, column_ids: Vec<ColumnId>) -> bool {
        if self.is_ready() && self.identity == identity && self.column_ids == column_ids {
            return false;
        }

        self.load_state = LoadState::Loading;
        self.identity = identity;
        self.column_ids = column_ids;

        let valid_ids = (!self.column_ids.is_empty()).then_some(self.column_ids.as_slice());
        self.preferences = match &self.identity {
            Some(id) => {
                debug!("Loading preferences for '{}'", id);
                self.store.load(id, valid_ids).await
            }
            None => TablePreferences::defaults(self.store.config()),
        };

        self.persist_state = PersistState::Idle;
        self.load_state = LoadState::Ready;
        true
    }

    /// Merges a partial update into the record and persists it.
    pub async fn set_preferences(&mut self, patch: PreferencesPatch) {
        self.preferences.merge(patch);
        self.stamp();
        self.persist().await;
    }

    /// Updates the view part of the record through a closure and persists it.
    pub async fn update_preferences<F>(&mut self, update: F)
    where
        F: FnOnce(&mut ViewPreferences),
    {
        update(&mut self.preferences.view);
        self.stamp();
        self.persist().await;
    }

    /// Deletes the stored record and returns to schema defaults.
    ///
    /// The automatic save this change would otherwise cause is suppressed.
    pub async fn reset_preferences(&mut self) {
        if let Some(id) = &self.identity {
            debug!("Resetting preferences for '{}'", id);
            self.store.delete(id).await;
        }
        self.preferences = TablePreferences::defaults(self.store.config());
        self.persist_state = PersistState::SuppressedOnce;
        self.persist().await;
    }

    fn stamp(&mut self) {
        self.preferences.updated_at = Some(Utc::now());
        self.preferences.version = self.store.config().schema_version;
    }

    async fn persist(&mut self) {
        if self.persist_state == PersistState::SuppressedOnce {
            debug!("Skipping save right after reset");
            self.persist_state = PersistState::Idle;
            return;
        }
        if self.load_state != LoadState::Ready {
            return;
        }
        let Some(id) = &self.identity else {
            return;
        };

        self.persist_state = PersistState::Saving;
        self.store.save(id, &self.preferences).await;
        self.persist_state = PersistState::Idle;
    }

    // =========================================================================
    // Dirty tracking
    // =========================================================================

    /// Snapshot of the record as it currently stands.
    pub fn saved_snapshot(&self) -> PreferenceSnapshot {
        PreferenceSnapshot::of(&self.preferences.view)
    }

    /// Whether a live view differs from the record.
    pub fn is_dirty(&self, live: &ViewPreferences) -> bool {
        PreferenceSnapshot::of(live) != self.saved_snapshot()
    }

    /// Whether the record differs from schema defaults.
    pub fn has_saved_preferences(&self) -> bool {
        self.identity.is_some() && self.saved_snapshot() != self.default_snapshot
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// The current persistence error, if any.
    pub fn error(&self) -> Option<String> {
        self.identity.as_ref()?;
        self.store.errors().current()
    }

    /// The current persistence error, once per distinct message.
    pub fn take_error_notice(&self) -> Option<String> {
        if self.identity.is_none() {
            self.store.errors().clear();
            return None;
        }
        self.store.errors().take_notice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableConfig;
    use crate::model::SortEntry;
    use crate::prefs::MemoryBackend;

    fn ids(values: &[&str]) -> Vec<ColumnId> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn store() -> PreferenceStore {
        PreferenceStore::new(MemoryBackend::new(), TableConfig::default())
    }

    #[tokio::test]
    async fn test_bind_loads_and_sanitizes() {
        let store = store();
        let mut saved = TablePreferences::defaults(store.config());
        saved.view.column_order = ids(&["b", "gone", "a"]);
        saved.view.per_page = 25;
        store.save("users", &saved).await;

        let mut controller = PreferenceController::new(store);
        assert_eq!(controller.load_state(), LoadState::Uninitialized);

        assert!(controller.bind(Some("users".into()), ids(&["a", "b", "c"])).await);
        assert!(controller.is_ready());
        assert_eq!(controller.preferences().view.column_order, ids(&["b", "a"]));
        assert_eq!(controller.preferences().view.per_page, 25);

        // Same identity and columns: nothing to reload.
        assert!(!controller.bind(Some("users".into()), ids(&["a", "b", "c"])).await);
    }

    #[tokio::test]
    async fn test_rebind_on_new_identity_reloads() {
        let store = store();
        let mut orders = TablePreferences::defaults(store.config());
        orders.view.sorting = vec![SortEntry::desc("total")];
        store.save("orders", &orders).await;

        let mut controller = PreferenceController::new(store);
        controller.bind(Some("users".into()), ids(&["a", "total"])).await;
        controller.set_preferences(PreferencesPatch::new().per_page(50)).await;

        assert!(controller.bind(Some("orders".into()), ids(&["a", "total"])).await);
        assert_eq!(controller.identity(), Some("orders"));
        assert_eq!(controller.preferences().view.sorting, vec![SortEntry::desc("total")]);
        assert_eq!(controller.preferences().view.per_page, 10);

        assert!(controller.bind(Some("users".into()), ids(&["a", "total"])).await);
        assert_eq!(controller.preferences().view.per_page, 50);
        assert!(controller.preferences().view.sorting.is_empty());
    }

    #[tokio::test]
    async fn test_rebind_on_column_change_drops_stale_ids() {
        let store = store();
        let mut saved = TablePreferences::defaults(store.config());
        saved.view.column_order = ids(&["c", "b", "a"]);
        saved.view.sorting = vec![SortEntry::asc("c")];
        saved.view.column_pinning.left = ids(&["c"]);
        saved.view.column_visibility.insert("b".into(), false);
        store.save("users", &saved).await;

        let mut controller = PreferenceController::new(store.clone());
        controller.bind(Some("users".into()), ids(&["a", "b", "c"])).await;
        assert_eq!(controller.preferences().view.sorting, vec![SortEntry::asc("c")]);

        // Shrunk: every reference to the removed column goes.
        assert!(controller.bind(Some("users".into()), ids(&["a", "b"])).await);
        let view = &controller.preferences().view;
        assert_eq!(view.column_order, ids(&["b", "a"]));
        assert!(view.sorting.is_empty());
        assert!(view.column_pinning.is_empty());
        assert!(!view.resolve_visibility("b"));

        // Grown: reloaded from storage, which still knows the column.
        assert!(controller.bind(Some("users".into()), ids(&["a", "b", "c", "d"])).await);
        let view = &controller.preferences().view;
        assert_eq!(view.column_order, ids(&["c", "b", "a"]));
        assert_eq!(view.sorting, vec![SortEntry::asc("c")]);
        assert_eq!(view.column_pinning.left, ids(&["c"]));
    }

    #[tokio::test]
    async fn test_set_preferences_merges_and_persists() {
        let store = store();
        let mut controller = PreferenceController::new(store.clone());
        controller.bind(Some("users".into()), ids(&["a", "b"])).await;

        controller
            .set_preferences(PreferencesPatch::new().sorting(vec![SortEntry::desc("a")]))
            .await;
        controller.set_preferences(PreferencesPatch::new().per_page(50)).await;

        let prefs = controller.preferences();
        assert_eq!(prefs.view.sorting, vec![SortEntry::desc("a")]);
        assert_eq!(prefs.view.per_page, 50);
        assert!(prefs.updated_at.is_some());
        assert_eq!(prefs.version, 1);

        let stored = store.load("users", None).await;
        assert_eq!(stored.view, prefs.view);
        assert_eq!(controller.persist_state(), PersistState::Idle);
    }

    #[tokio::test]
    async fn test_reset_clears_storage_without_resaving() {
        let store = store();
        let mut controller = PreferenceController::new(store.clone());
        controller.bind(Some("users".into()), ids(&["a"])).await;
        controller.set_preferences(PreferencesPatch::new().per_page(25)).await;
        assert!(controller.has_saved_preferences());

        controller.reset_preferences().await;
        assert_eq!(store.list().await.unwrap(), Vec::<String>::new());
        assert_eq!(controller.persist_state(), PersistState::Idle);
        assert!(!controller.has_saved_preferences());

        // Only the reset's own save was swallowed.
        controller.set_preferences(PreferencesPatch::new().per_page(50)).await;
        assert_eq!(store.list().await.unwrap(), vec!["users"]);
    }

    #[tokio::test]
    async fn test_unbound_never_persists() {
        let store = store();
        let mut controller = PreferenceController::new(store.clone());
        controller.bind(None, ids(&["a"])).await;
        controller.set_preferences(PreferencesPatch::new().per_page(25)).await;

        assert!(store.list().await.unwrap().is_empty());
        assert!(!controller.has_saved_preferences());
        assert_eq!(controller.error(), None);
    }

    #[tokio::test]
    async fn test_dirty_tracking() {
        let mut controller = PreferenceController::new(store());
        controller.bind(Some("users".into()), ids(&["a", "b"])).await;

        let mut live = controller.preferences().view.clone();
        assert!(!controller.is_dirty(&live));

        live.column_visibility.insert("a".into(), true);
        assert!(!controller.is_dirty(&live));

        live.column_visibility.insert("a".into(), false);
        assert!(controller.is_dirty(&live));

        controller.update_preferences(|view| *view = live.clone()).await;
        assert!(!controller.is_dirty(&live));
        assert!(controller.has_saved_preferences());
    }
}
