mod cli;
mod commands;
mod error;
mod paths;

use std::fs;
use std::fs::File;
use std::io;
use std::process::ExitCode;

use clap::Parser;
use datagrid_lib::TableConfig;
use datagrid_lib::prefs::PreferenceStore;
use datagrid_lib::prefs::SqliteBackend;
use log::error;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;

use crate::cli::Args;
use crate::cli::Command;
use crate::commands::ShareRequest;
use crate::error::CliError;
use crate::paths::KEPT_LOGS;
use crate::paths::Paths;

fn init_logging(paths: &Paths, debug: bool) -> io::Result<()> {
    paths.rotate_logs(KEPT_LOGS)?;
    let file = File::create(paths.log_file())?;

    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };
    // Only fails if a logger is already installed.
    let _ = WriteLogger::init(level, Config::default(), file);
    Ok(())
}

fn load_config(args: &Args) -> Result<TableConfig, CliError> {
    let config = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => TableConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

async fn open_store(
    args: &Args,
    paths: Option<&Paths>,
    config: TableConfig,
) -> Result<PreferenceStore, CliError> {
    let path = match (&args.db, paths) {
        (Some(path), _) => path.clone(),
        (None, Some(paths)) => paths.preferences_db(),
        (None, None) => return Err(CliError::NoDataDir),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let backend = SqliteBackend::open(&path).await?;
    Ok(PreferenceStore::new(backend, config))
}

async fn run(args: Args, paths: Option<Paths>) -> Result<(), CliError> {
    let config = load_config(&args)?;

    match args.command {
        Command::Share {
            ref path,
            page,
            per_page,
            ref search,
            ref filters,
            ref sort,
        } => {
            let link = commands::share(
                &config,
                ShareRequest {
                    path: path.clone(),
                    page,
                    per_page,
                    search: search.clone(),
                    filters: filters.clone(),
                    sort: sort.clone(),
                },
            )?;
            println!("{}", link);
            Ok(())
        }
        Command::Show {
            ref table,
            ref columns,
        } => {
            let store = open_store(&args, paths.as_ref(), config).await?;
            commands::show(&store, table, columns).await
        }
        Command::Reset { ref table } => {
            let store = open_store(&args, paths.as_ref(), config).await?;
            commands::reset(&store, table).await
        }
        Command::List => {
            let store = open_store(&args, paths.as_ref(), config).await?;
            commands::list(&store).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let paths = Paths::resolve();
    if let Some(paths) = &paths {
        if let Err(e) = init_logging(paths, args.debug) {
            eprintln!("Warning: logging disabled: {}", e);
        }
    }

    match run(args, paths).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
