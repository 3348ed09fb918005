mod execute;
mod output;

pub use execute::{RelationsResult, RelationshipDdl};

use std::path::PathBuf;

use clap::Args;

use super::input::validate_file_exists;
use crate::schema::SqlFlavor;

/// Compile relationships into foreign keys, indexes and junction tables
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  schemagen relations blog.json                # FK and junction DDL for every relationship
  schemagen relations blog.json -e post        # Only the relationships declared on post
  schemagen relations user.json post.json -f mysql

Column references are checked against every table in the given files.")]
pub struct RelationsCmd {
    /// Entity JSON files
    #[arg(required = true, value_parser = validate_file_exists)]
    pub files: Vec<PathBuf>,

    /// Only compile relationships declared on this entity
    #[arg(short, long)]
    pub entity: Option<String>,

    /// SQL flavor (default: config, then postgres)
    #[arg(short, long, value_enum)]
    pub flavor: Option<SqlFlavor>,
}
