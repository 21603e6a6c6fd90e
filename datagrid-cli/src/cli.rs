//! Command line arguments

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(version, about = "Inspect and manage stored data table preferences")]
pub struct Args {
    /// Preference database to use instead of the platform default
    #[arg(long = "db", global = true)]
    pub db: Option<PathBuf>,

    /// JSON file with table limits (page sizes, pin and sort maximums)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long = "debug", action, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the stored preferences of a table
    Show {
        /// Table identity: explicit table id or page path
        table: String,

        /// Current column ids, comma separated; stale ids are dropped
        #[arg(long = "columns", value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Delete the stored preferences of a table
    Reset { table: String },

    /// List tables with stored preferences
    List,

    /// Print a shareable link for a view
    Share {
        /// Listing path, e.g. /users
        path: String,

        #[arg(long = "page", default_value_t = 1)]
        page: u32,

        #[arg(long = "per-page")]
        per_page: Option<u32>,

        #[arg(long = "search")]
        search: Option<String>,

        /// Column filter as column=value; repeat for more filters
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Sort column, optionally suffixed with :desc
        #[arg(long = "sort")]
        sort: Option<String>,
    },
}
