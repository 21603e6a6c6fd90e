//! Subcommand implementations

use datagrid_lib::TableConfig;
use datagrid_lib::error::StoreError;
use datagrid_lib::model::ColumnDef;
use datagrid_lib::model::ColumnId;
use datagrid_lib::model::PageMeta;
use datagrid_lib::model::TableDefinition;
use datagrid_lib::order;
use datagrid_lib::prefs::PreferenceStore;
use datagrid_lib::request;
use datagrid_lib::state::LiveState;
use log::info;

use crate::error::CliError;

pub async fn show(store: &PreferenceStore, table: &str, columns: &[String]) -> Result<(), CliError> {
    let valid_ids = (!columns.is_empty()).then_some(columns);
    let Some(prefs) = store.try_load(table, valid_ids).await? else {
        println!("No stored preferences for '{}'", table);
        return Ok(());
    };

    println!("{}", serde_json::to_string_pretty(&prefs)?);
    if !columns.is_empty() {
        let effective = order::effective_order(&prefs.view.column_order, columns);
        println!("Effective column order: {}", effective.join(", "));
    }
    Ok(())
}

pub async fn reset(store: &PreferenceStore, table: &str) -> Result<(), CliError> {
    if !store.delete(table).await {
        let message = store.errors().current().unwrap_or_default();
        return Err(StoreError::backend(message).into());
    }
    info!("Deleted preferences for '{}'", table);
    println!("Reset preferences for '{}'", table);
    Ok(())
}

pub async fn list(store: &PreferenceStore) -> Result<(), CliError> {
    for table in store.list().await? {
        println!("{}", table);
    }
    Ok(())
}

/// View state a share link is built from.
pub struct ShareRequest {
    pub path: String,
    pub page: u32,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub filters: Vec<String>,
    pub sort: Option<String>,
}

pub fn share(config: &TableConfig, request: ShareRequest) -> Result<String, CliError> {
    let filters = request
        .filters
        .iter()
        .map(|filter| parse_filter(filter))
        .collect::<Result<Vec<_>, _>>()?;
    let sort = request.sort.as_deref().map(parse_sort);

    // The columns the link refers to are all the definition needs.
    let mut column_ids: Vec<ColumnId> = filters.iter().map(|(column, _)| column.clone()).collect();
    if let Some((column, _)) = &sort {
        if !column_ids.contains(column) {
            column_ids.push(column.clone());
        }
    }
    let definition = TableDefinition::new(column_ids.into_iter().map(ColumnDef::new).collect());

    let mut state = LiveState::new(definition, config.clone());
    if let Some(per_page) = request.per_page {
        state.set_per_page(per_page)?;
    }
    state.set_page(request.page, &unbounded_meta(&request.path, state.per_page()));
    if let Some(search) = request.search {
        state.set_search(search);
    }
    for (column, value) in filters {
        let values: Vec<String> = value.split(config.filter_delimiter.as_str()).map(str::to_string).collect();
        if values.len() > 1 {
            state.set_filter(&column, values)?;
        } else {
            state.set_filter(&column, value)?;
        }
    }
    if let Some((column, descending)) = sort {
        state.toggle_sort(&column)?;
        if descending {
            state.toggle_sort(&column)?;
        }
    }

    let payload = request::build(&state);
    request::share_path(&request.path, &payload)
        .ok_or_else(|| CliError::invalid_argument("path must not be empty"))
}

fn parse_filter(filter: &str) -> Result<(String, String), CliError> {
    match filter.split_once('=') {
        Some((column, value)) if !column.is_empty() => Ok((column.to_string(), value.to_string())),
        _ => Err(CliError::invalid_argument(format!(
            "filter '{}' must look like column=value",
            filter
        ))),
    }
}

fn parse_sort(sort: &str) -> (String, bool) {
    match sort.rsplit_once(':') {
        Some((column, "desc")) => (column.to_string(), true),
        Some((column, "asc")) => (column.to_string(), false),
        _ => (sort.to_string(), false),
    }
}

fn unbounded_meta(path: &str, per_page: u32) -> PageMeta {
    PageMeta {
        current_page: 1,
        from: None,
        to: None,
        last_page: u32::MAX,
        per_page,
        total: 0,
        path: path.to_string(),
        links: Vec::new(),
    }
}
