mod cli_tests;
mod execute;
mod execute_tests;
mod output;

pub use execute::MigrateResult;

use std::path::PathBuf;

use clap::Args;

use super::input::validate_file_exists;
use crate::schema::SqlFlavor;

/// Assemble a versioned migration with rollback for a set of entities
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  schemagen migrate blog.json                       # Print up and down scripts
  schemagen migrate blog.json -v 2024_06_01         # Explicit version
  schemagen migrate user.json post.json --out-dir migrations

With --out-dir the scripts are written to <version>_up.sql and <version>_down.sql.")]
pub struct MigrateCmd {
    /// Entity JSON files
    #[arg(required = true, value_parser = validate_file_exists)]
    pub files: Vec<PathBuf>,

    /// Migration version (default: config, then v1)
    #[arg(short, long)]
    pub version: Option<String>,

    /// SQL flavor (default: config, then postgres)
    #[arg(short, long, value_enum)]
    pub flavor: Option<SqlFlavor>,

    /// Directory to write the up and down scripts into
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}
