mod cli_tests;
mod execute;
mod output;
mod output_tests;

use std::path::PathBuf;

use clap::Args;

use super::input::validate_file_exists;
use crate::schema::{Dialect, SqlFlavor};

/// Compile every entity into one schema file
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  schemagen schema blog.json                   # One Postgres file with every table
  schemagen schema user.json post.json -d seaorm
  schemagen schema blog.json -d document -o json")]
pub struct SchemaCmd {
    /// Entity JSON files
    #[arg(required = true, value_parser = validate_file_exists)]
    pub files: Vec<PathBuf>,

    /// Target dialect (default: config, then sql)
    #[arg(short, long, value_enum)]
    pub dialect: Option<Dialect>,

    /// SQL flavor (default: config, then postgres)
    #[arg(short, long, value_enum)]
    pub flavor: Option<SqlFlavor>,
}
