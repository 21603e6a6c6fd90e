//! The assembled table: live state, preference controller and fetch
//! orchestrator working off one page of server data.

use std::sync::Arc;

use log::debug;
use log::warn;
use tokio::sync::watch;

use crate::error::FetchError;
use crate::error::Rejection;
use crate::fetch::FetchOrchestrator;
use crate::fetch::Transport;
use crate::fetch::VisitRequest;
use crate::model::PageMeta;
use crate::model::PaginatedData;
use crate::model::PreferencesPatch;
use crate::model::TableDefinition;
use crate::model::TablePreferences;
use crate::prefs::PreferenceStore;
use crate::request;
use crate::request::RequestPayload;
use crate::request::RequestSignature;
use crate::state::LiveState;
use crate::state::PreferenceController;

/// One server-driven table instance.
///
/// Mutations go through [`Datatable::update`], which recomputes the request
/// signature once per call; a batch of changes therefore triggers at most one
/// fetch. Fetched pages arrive in the background and are applied by
/// [`Datatable::apply_outcomes`] or [`Datatable::settle`].
///
/// # Example
///
/// ```ignore
/// let mut table = Datatable::mount(definition, store, transport, initial_page).await;
///
/// table.update(|state| {
///     state.set_filter("status", "active")?;
///     state.set_search("ann");
///     Ok::<_, Rejection>(())
/// })?;
///
/// table.settle().await;
/// println!("{} rows", table.data().len());
/// ```
pub struct Datatable {
    state: LiveState,
    controller: PreferenceController,
    fetcher: FetchOrchestrator,
    data: PaginatedData,
    last_fetch_error: Option<String>,
}

impl Datatable {
    /// Mounts a table on the page it was first rendered with.
    ///
    /// Stored preferences for the table identity are loaded and adopted; if
    /// they change the request (e.g. a different page size) the matching
    /// fetch starts right away.
    pub async fn mount(
        definition: TableDefinition,
        store: PreferenceStore,
        transport: Arc<dyn Transport>,
        initial: PaginatedData,
    ) -> Self {
        let state = LiveState::new(definition, store.config().clone()).with_page(&initial.meta);
        let mut table = Self {
            state,
            controller: PreferenceController::new(store),
            fetcher: FetchOrchestrator::new(transport),
            data: initial,
            last_fetch_error: None,
        };

        table.sync();
        table.rebind().await;
        table
    }

    /// Replaces the table definition.
    ///
    /// The live view carries over, minus columns the new definition drops.
    /// A changed identity or column set reloads the stored preferences
    /// against the new columns.
    pub async fn set_definition(&mut self, definition: TableDefinition) {
        let mut state = LiveState::new(definition, self.state.config().clone());
        state.carry_over(&self.state);
        self.state = state;
        self.rebind().await;
    }

    async fn rebind(&mut self) {
        let identity = self
            .state
            .definition()
            .resolve_identity(Some(self.data.meta.path.as_str()));
        let column_ids = self.state.column_ids().to_vec();

        if self.controller.bind(identity, column_ids).await && self.controller.identity().is_some() {
            self.state.adopt(self.controller.preferences());
        }
        self.sync();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &LiveState {
        &self.state
    }

    pub fn data(&self) -> &PaginatedData {
        &self.data
    }

    pub fn meta(&self) -> &PageMeta {
        &self.data.meta
    }

    pub fn preferences(&self) -> &TablePreferences {
        self.controller.preferences()
    }

    /// Identity preferences are stored under, if any.
    pub fn identity(&self) -> Option<&str> {
        self.controller.identity()
    }

    pub fn is_loading(&self) -> bool {
        self.fetcher.is_loading()
    }

    /// Follows the loading flag.
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.fetcher.subscribe()
    }

    /// Message of the most recent failed fetch, cleared by the next success.
    pub fn last_fetch_error(&self) -> Option<&str> {
        self.last_fetch_error.as_deref()
    }

    /// A preference error to show, once per distinct message.
    pub fn take_error_notice(&self) -> Option<String> {
        self.controller.take_error_notice()
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// The payload the current view would be fetched with.
    pub fn payload(&self) -> RequestPayload {
        request::build(&self.state)
    }

    pub fn signature(&self) -> RequestSignature {
        RequestSignature::new(&self.data.meta.path, &self.payload())
    }

    /// Link reproducing the current filter, sort and pagination.
    pub fn share_path(&self) -> Option<String> {
        request::share_path(&self.data.meta.path, &self.payload())
    }

    fn sync(&mut self) -> Option<u64> {
        let payload = self.payload();
        let signature = RequestSignature::new(&self.data.meta.path, &payload);
        let visit = VisitRequest {
            path: self.data.meta.path.clone(),
            params: payload.flatten(),
            only: self.state.definition().partial_reload_keys(),
            generation: 0,
        };
        self.fetcher.observe(signature, visit)
    }

    /// Applies a batch of changes to the live state, then fetches once if the
    /// request changed.
    pub fn update<R>(&mut self, change: impl FnOnce(&mut LiveState) -> R) -> R {
        let result = change(&mut self.state);
        self.sync();
        result
    }

    /// Goes to a 1-based page, clamped to the last page.
    pub fn go_to_page(&mut self, page: u32) {
        self.state.set_page(page, &self.data.meta);
        self.sync();
    }

    /// Changes the page size; persisted right away when the table has an
    /// identity.
    pub async fn set_per_page(&mut self, per_page: u32) -> Result<(), Rejection> {
        self.state.set_per_page(per_page)?;
        if self.controller.identity().is_some() {
            self.controller
                .set_preferences(PreferencesPatch::new().per_page(per_page))
                .await;
        }
        self.sync();
        Ok(())
    }

    /// Applies every fetch that has finished. Failed fetches keep the current
    /// data. Returns the number of outcomes handled.
    pub fn apply_outcomes(&mut self) -> usize {
        let mut handled = 0;
        while let Some(outcome) = self.fetcher.try_next_outcome() {
            self.apply(outcome.generation, outcome.result);
            handled += 1;
        }
        handled
    }

    fn apply(&mut self, generation: u64, result: Result<PaginatedData, FetchError>) {
        match result {
            Ok(page) => {
                debug!("Applying page {} from generation {}", page.meta.current_page, generation);
                self.data = page;
                self.last_fetch_error = None;
            }
            Err(e) => {
                warn!("Fetch generation {} failed: {}", generation, e);
                self.last_fetch_error = Some(e.to_string());
            }
        }
    }

    /// Waits for the latest fetch, applies what arrived and reloads
    /// preferences if the page moved to another identity.
    pub async fn settle(&mut self) {
        self.fetcher.wait_idle().await;
        self.apply_outcomes();
        self.rebind().await;
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    /// Whether the live view differs from the preference record.
    pub fn is_dirty(&self) -> bool {
        self.controller.is_dirty(self.state.view())
    }

    pub fn has_saved_preferences(&self) -> bool {
        self.controller.has_saved_preferences()
    }

    pub fn can_save(&self) -> bool {
        self.controller.identity().is_some() && self.controller.is_ready() && self.is_dirty()
    }

    pub fn can_reset(&self) -> bool {
        self.controller.identity().is_some() && (self.is_dirty() || self.has_saved_preferences())
    }

    /// Stores the live view as the table's preferences. Returns `false` when
    /// the table has no identity.
    pub async fn save_preferences(&mut self) -> bool {
        if self.controller.identity().is_none() {
            return false;
        }
        let patch = PreferencesPatch::from_view(self.state.view());
        self.controller.set_preferences(patch).await;
        true
    }

    /// Reverts the view to defaults and deletes the stored preferences.
    pub async fn reset_preferences(&mut self) {
        self.state.reset_view();
        if self.controller.identity().is_some() {
            self.controller.reset_preferences().await;
        }
        self.sync();
    }
}
