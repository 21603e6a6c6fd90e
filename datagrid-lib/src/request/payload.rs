//! Outbound request payload for the current view.

use log::warn;
use serde_json::Value;

use super::FlatParams;
use super::ParamValue;
use crate::state::LiveState;

/// Method-override marker every payload carries; never part of share links.
pub const METHOD_KEY: &str = "_method";

const RESERVED_KEYS: [&str; 6] = [METHOD_KEY, "page", "per_page", "search", "filter", "sort"];

/// Ordered top-level request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPayload {
    entries: Vec<(String, ParamValue)>,
}

impl RequestPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a top-level parameter, replacing an existing one in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattens every parameter into bracket notation.
    pub fn flatten(&self) -> FlatParams {
        self.flatten_where(|_| true)
    }

    /// Flattens the parameters a fresh page load needs to rebuild the view.
    pub fn share_params(&self) -> FlatParams {
        self.flatten_where(|key| key != METHOD_KEY)
    }

    fn flatten_where(&self, keep: impl Fn(&str) -> bool) -> FlatParams {
        let mut params = FlatParams::new();
        for (key, value) in self.iter().filter(|(key, _)| keep(key)) {
            params.append_value(key, value);
        }
        params
    }

    /// JSON object form, keys sorted.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}

/// Builds the request payload for a live view.
///
/// Only the primary sort entry reaches the server. Filters whose definition
/// names a query key are sent under that key instead of `filter[column]`.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::{ColumnDef, TableDefinition};
/// use datagrid_lib::request::build;
/// use datagrid_lib::state::LiveState;
/// use datagrid_lib::TableConfig;
///
/// let definition = TableDefinition::new(vec![ColumnDef::new("name")]);
/// let mut state = LiveState::new(definition, TableConfig::default());
/// state.toggle_sort("name").unwrap();
///
/// let params = build(&state).flatten();
/// assert_eq!(params.first("page"), Some("1"));
/// assert_eq!(params.first("sort[orderBy]"), Some("name"));
/// assert_eq!(params.first("sort[type]"), Some("asc"));
/// ```
pub fn build(state: &LiveState) -> RequestPayload {
    let definition = state.definition();
    let delimiter = state.config().filter_delimiter.as_str();

    let mut payload = RequestPayload::new();
    payload.insert(METHOD_KEY, "get");
    payload.insert("page", state.page());
    payload.insert("per_page", state.per_page());

    if !state.search().is_empty() {
        payload.insert("search", state.search());
    }

    let mut filters: Vec<(String, ParamValue)> = Vec::new();
    let mut aliased: Vec<(String, String)> = Vec::new();
    for (column, value) in state.filters() {
        if value.is_empty() {
            continue;
        }
        let joined = value.joined(delimiter);
        let alias = definition
            .filter(column)
            .and_then(|filter| filter.query_key.as_deref())
            .filter(|key| !key.is_empty());

        match alias {
            Some(key) if RESERVED_KEYS.contains(&key) => {
                warn!("Filter '{}' uses reserved query key '{}'", column, key);
                filters.push((column.clone(), joined.into()));
            }
            Some(key) => aliased.push((key.to_string(), joined)),
            None => filters.push((column.clone(), joined.into())),
        }
    }

    if !filters.is_empty() {
        payload.insert("filter", ParamValue::Map(filters));
    }
    for (key, value) in aliased {
        payload.insert(key, value);
    }

    if let Some(primary) = state.view().sorting.first() {
        payload.insert(
            "sort",
            ParamValue::map([("orderBy", primary.column.as_str()), ("type", primary.direction())]),
        );
    }

    payload
}

/// Path plus query string that reproduces the payload's filter, sort and
/// pagination on a fresh load. `None` without a path.
pub fn share_path(path: &str, payload: &RequestPayload) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    let query = payload.share_params().to_query_string();
    if query.is_empty() {
        Some(path.to_string())
    } else {
        Some(format!("{path}?{query}"))
    }
}
