//! End-to-end tests of a mounted table: preference loading, batching of
//! request changes and the save/reset flow.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use datagrid_lib::Datatable;
use datagrid_lib::TableConfig;
use datagrid_lib::error::FetchError;
use datagrid_lib::error::Rejection;
use datagrid_lib::fetch::Transport;
use datagrid_lib::fetch::VisitRequest;
use datagrid_lib::model::ColumnDef;
use datagrid_lib::model::FilterDef;
use datagrid_lib::model::PageMeta;
use datagrid_lib::model::PaginatedData;
use datagrid_lib::model::PinSide;
use datagrid_lib::model::TableDefinition;
use datagrid_lib::prefs::MemoryBackend;
use datagrid_lib::prefs::PreferenceBackend;
use datagrid_lib::prefs::PreferenceStore;
use datagrid_lib::prefs::SqliteBackend;
use serde_json::json;

// =============================================================================
// Fixtures
// =============================================================================

fn page(path: &str, current_page: u32, per_page: u32) -> PaginatedData {
    PaginatedData {
        data: vec![json!({ "id": current_page })],
        meta: PageMeta {
            current_page,
            from: Some(1),
            to: Some(1),
            last_page: 10,
            per_page,
            total: 100,
            path: path.to_string(),
            links: Vec::new(),
        },
        links: Default::default(),
    }
}

/// Records every visit and answers with a page matching its parameters.
#[derive(Default)]
struct ScriptedTransport {
    visits: Mutex<Vec<VisitRequest>>,
    failing: AtomicBool,
}

impl ScriptedTransport {
    fn visits(&self) -> Vec<VisitRequest> {
        self.visits.lock().unwrap().clone()
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn visit(&self, request: VisitRequest) -> Result<PaginatedData, FetchError> {
        self.visits.lock().unwrap().push(request.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::http(500, "server error"));
        }

        let number = |key: &str| {
            request
                .params
                .first(key)
                .and_then(|value| value.parse().ok())
                .unwrap_or(1)
        };
        Ok(page(&request.path, number("page"), number("per_page")))
    }
}

fn definition() -> TableDefinition {
    TableDefinition::new(vec![ColumnDef::new("a"), ColumnDef::new("b"), ColumnDef::new("c")])
        .with_table_id("users")
        .with_resource_key("users")
        .with_filters(vec![FilterDef::new("a"), FilterDef::new("b")])
}

fn memory_store() -> PreferenceStore {
    PreferenceStore::new(MemoryBackend::new(), TableConfig::default())
}

async fn mount(store: PreferenceStore) -> (Datatable, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::default());
    let table = Datatable::mount(definition(), store, transport.clone(), page("/users", 1, 10)).await;
    (table, transport)
}

// =============================================================================
// Loading
// =============================================================================

#[tokio::test]
async fn test_saved_preferences_shape_the_first_view() {
    let backend = MemoryBackend::new();
    let raw = json!({ "columnOrder": ["b", "a"], "perPage": 25 });
    backend
        .set_bytes("datatable.preferences.users", raw.to_string().into_bytes())
        .await
        .unwrap();
    let store = PreferenceStore::new(backend, TableConfig::default());

    let (mut table, transport) = mount(store).await;
    assert_eq!(table.state().effective_order(), vec!["b", "a", "c"]);
    assert_eq!(table.state().per_page(), 25);
    assert!(!table.is_dirty());

    table.settle().await;
    let visits = transport.visits();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].params.first("per_page"), Some("25"));
    assert_eq!(
        visits[0].only,
        Some(vec!["users".to_string(), "filters".to_string()])
    );
    assert_eq!(table.meta().per_page, 25);
}

#[tokio::test]
async fn test_mount_without_changes_does_not_fetch() {
    let (mut table, transport) = mount(memory_store()).await;
    table.settle().await;
    assert!(transport.visits().is_empty());
    assert!(!table.is_loading());
}

#[tokio::test]
async fn test_garbage_in_storage_falls_back_to_defaults() {
    let backend = MemoryBackend::new();
    backend
        .set_bytes("datatable.preferences.users", b"[1, 2".to_vec())
        .await
        .unwrap();
    let store = PreferenceStore::new(backend, TableConfig::default());

    let (table, _) = mount(store).await;
    assert_eq!(table.state().effective_order(), vec!["a", "b", "c"]);
    assert_eq!(table.state().per_page(), 10);
    assert_eq!(table.take_error_notice(), None);
}

#[tokio::test]
async fn test_new_definition_with_same_columns_keeps_the_view() {
    let (mut table, transport) = mount(memory_store()).await;
    table.update(|state| state.toggle_sort("b")).unwrap();
    table.update(|state| state.set_visibility("c", false)).unwrap();
    table.set_per_page(25).await.unwrap();
    assert!(table.save_preferences().await);
    table.settle().await;
    let fetched = transport.visits().len();

    let extended = definition().with_filters(vec![
        FilterDef::new("a"),
        FilterDef::new("b"),
        FilterDef::new("c"),
    ]);
    table.set_definition(extended).await;

    let view = table.state().view();
    assert_eq!(view.sorting.len(), 1);
    assert_eq!(view.sorting[0].column, "b");
    assert!(!table.state().is_visible("c"));
    assert_eq!(table.state().per_page(), 25);
    assert!(!table.is_dirty());

    table.settle().await;
    assert_eq!(transport.visits().len(), fetched);
}

#[tokio::test]
async fn test_new_column_set_reloads_preferences() {
    let (mut table, _) = mount(memory_store()).await;
    table.update(|state| state.toggle_sort("c")).unwrap();
    table.update(|state| state.pin("c", Some(PinSide::Left))).unwrap();
    table.update(|state| state.set_visibility("b", false)).unwrap();
    assert!(table.save_preferences().await);
    table.settle().await;

    let narrowed = TableDefinition::new(vec![ColumnDef::new("a"), ColumnDef::new("b")])
        .with_table_id("users")
        .with_resource_key("users");
    table.set_definition(narrowed).await;

    let view = table.state().view();
    assert!(view.sorting.is_empty());
    assert!(view.column_pinning.is_empty());
    assert!(!table.state().is_visible("b"));
    assert_eq!(table.state().effective_order(), vec!["a", "b"]);
    assert_eq!(table.preferences().view, *view);
    assert!(!table.is_dirty());
}

// =============================================================================
// Fetching
// =============================================================================

#[tokio::test]
async fn test_batched_filter_changes_fetch_once() {
    let (mut table, transport) = mount(memory_store()).await;

    table
        .update(|state| {
            state.set_filter("a", "x")?;
            state.set_filter("b", vec!["1", "2"])
        })
        .unwrap();
    table.settle().await;

    let visits = transport.visits();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].params.first("filter[a]"), Some("x"));
    assert_eq!(visits[0].params.first("filter[b]"), Some("1,2"));
    assert_eq!(visits[0].generation, 1);
}

#[tokio::test]
async fn test_unchanged_request_does_not_refetch() {
    let (mut table, transport) = mount(memory_store()).await;

    table.update(|state| state.set_search("ann"));
    table.settle().await;
    table.update(|state| state.set_search("ann"));
    // Visual-only changes never reach the server.
    table.update(|state| state.set_visibility("c", false)).unwrap();
    table.settle().await;

    assert_eq!(transport.visits().len(), 1);
}

#[tokio::test]
async fn test_failed_fetch_keeps_last_good_page() {
    let (mut table, transport) = mount(memory_store()).await;

    table.go_to_page(3);
    table.settle().await;
    assert_eq!(table.meta().current_page, 3);

    transport.fail(true);
    table.go_to_page(4);
    table.settle().await;

    assert!(!table.is_loading());
    assert_eq!(table.meta().current_page, 3);
    assert!(table.last_fetch_error().is_some());
    assert_eq!(table.state().page(), 4);
}

#[tokio::test]
async fn test_share_path_reflects_request_state() {
    let (mut table, _) = mount(memory_store()).await;
    table.update(|state| state.toggle_sort("b")).unwrap();

    assert_eq!(
        table.share_path().as_deref(),
        Some("/users?page=1&per_page=10&sort%5BorderBy%5D=b&sort%5Btype%5D=asc")
    );
}

// =============================================================================
// Rejected actions
// =============================================================================

#[tokio::test]
async fn test_per_page_outside_options_is_rejected() {
    let (mut table, transport) = mount(memory_store()).await;

    assert_eq!(
        table.set_per_page(40).await,
        Err(Rejection::PerPageNotAllowed { value: 40 })
    );
    assert_eq!(table.state().per_page(), 10);
    table.settle().await;
    assert!(transport.visits().is_empty());
}

#[tokio::test]
async fn test_pin_limit_and_last_visible_column() {
    let definition = TableDefinition::new(vec![
        ColumnDef::new("a"),
        ColumnDef::new("b"),
        ColumnDef::new("c"),
        ColumnDef::new("d"),
    ]);
    let transport = Arc::new(ScriptedTransport::default());
    let mut table =
        Datatable::mount(definition, memory_store(), transport, page("/pins", 1, 10)).await;

    for column in ["a", "b", "c"] {
        table.update(|state| state.pin(column, Some(PinSide::Left))).unwrap();
    }
    assert_eq!(
        table.update(|state| state.pin("d", Some(PinSide::Right))),
        Err(Rejection::PinLimitReached { max: 3 })
    );
    table.update(|state| state.pin("b", None)).unwrap();
    table.update(|state| state.pin("d", Some(PinSide::Right))).unwrap();

    for column in ["a", "b", "c"] {
        table.update(|state| state.set_visibility(column, false)).unwrap();
    }
    assert_eq!(
        table.update(|state| state.set_visibility("d", false)),
        Err(Rejection::LastVisibleColumn)
    );
    assert_eq!(table.state().visible_columns(), vec!["d"]);
}

// =============================================================================
// Save and reset
// =============================================================================

#[tokio::test]
async fn test_save_and_reset_against_sqlite() {
    let backend = SqliteBackend::open_in_memory().await.unwrap();
    let store = PreferenceStore::new(backend, TableConfig::default());
    let (mut table, _) = mount(store.clone()).await;

    assert!(!table.can_save());
    assert!(!table.can_reset());

    table
        .update(|state| state.reorder_column("c", "a", datagrid_lib::order::DropPosition::Before))
        .unwrap();
    assert!(table.is_dirty());
    assert!(table.can_save());
    assert!(table.can_reset());

    assert!(table.save_preferences().await);
    assert!(!table.is_dirty());
    assert!(!table.can_save());
    assert!(table.can_reset());

    let stored = store.load("users", None).await;
    assert_eq!(stored.view.column_order, vec!["c", "a", "b"]);
    assert!(stored.updated_at.is_some());

    table.reset_preferences().await;
    assert_eq!(table.state().effective_order(), vec!["a", "b", "c"]);
    assert!(!table.can_reset());
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_per_page_is_persisted_immediately() {
    let store = memory_store();
    let (mut table, transport) = mount(store.clone()).await;

    table.set_per_page(50).await.unwrap();
    table.settle().await;

    assert_eq!(store.load("users", None).await.view.per_page, 50);
    assert!(!table.is_dirty());
    assert_eq!(transport.visits()[0].params.first("per_page"), Some("50"));
}

#[tokio::test]
async fn test_path_is_the_fallback_identity() {
    let definition = TableDefinition::new(vec![ColumnDef::new("a"), ColumnDef::new("b")]);
    let transport = Arc::new(ScriptedTransport::default());
    let store = memory_store();
    let mut table =
        Datatable::mount(definition.clone(), store.clone(), transport.clone(), page("/orders", 1, 10))
            .await;
    assert_eq!(table.identity(), Some("/orders"));

    table.update(|state| state.toggle_sort("a")).unwrap();
    assert!(table.save_preferences().await);
    assert_eq!(store.list().await.unwrap(), vec!["/orders"]);

    let mut anonymous = Datatable::mount(definition, store, transport, page("", 1, 10)).await;
    assert_eq!(anonymous.identity(), None);
    anonymous.update(|state| state.toggle_sort("a")).unwrap();
    assert!(anonymous.is_dirty());
    assert!(!anonymous.can_save());
    assert!(!anonymous.can_reset());
    assert!(!anonymous.save_preferences().await);
}
