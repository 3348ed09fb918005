mod cli_tests;
mod execute;
mod output;

pub use execute::TableResult;

use std::path::PathBuf;

use clap::Args;

use super::input::validate_file_exists;
use crate::schema::{Dialect, SqlFlavor};

/// Compile one entity's table into a dialect
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  schemagen table user.json                    # Postgres DDL for the entity in user.json
  schemagen table user.json -d prisma          # Prisma model block
  schemagen table blog.json --entity post      # Pick one entity from a multi-entity file
  schemagen table user.json --flavor mysql     # MySQL DDL")]
pub struct TableCmd {
    /// Entity JSON file
    #[arg(value_parser = validate_file_exists)]
    pub file: PathBuf,

    /// Entity id to compile when the file holds several
    #[arg(short, long)]
    pub entity: Option<String>,

    /// Target dialect (default: config, then sql)
    #[arg(short, long, value_enum)]
    pub dialect: Option<Dialect>,

    /// SQL flavor (default: config, then postgres)
    #[arg(short, long, value_enum)]
    pub flavor: Option<SqlFlavor>,
}
