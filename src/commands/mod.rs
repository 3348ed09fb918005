//! Command definitions and implementations.
//!
//! Each command is defined in its own module with:
//! - The command struct with clap attributes for CLI parsing
//! - An `Execute` impl producing a serializable result
//! - An `Outputable` impl for the human-readable format

mod input;
mod migrate;
mod relations;
mod schema;
mod table;

pub use input::{InputError, LoadedEntities, read_all, read_entities};
pub use migrate::{MigrateCmd, MigrateResult};
pub use relations::{RelationsCmd, RelationsResult, RelationshipDdl};
pub use schema::SchemaCmd;
pub use table::{TableCmd, TableResult};

use clap::Subcommand;
use std::error::Error;

use crate::config::Config;
use crate::output::{OutputFormat, Outputable};

/// Trait for executing commands with command-specific result types.
pub trait Execute {
    type Output: Outputable;

    fn execute(self, config: &Config) -> Result<Self::Output, Box<dyn Error>>;
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile one entity's table into a dialect
    Table(TableCmd),

    /// Compile every entity into one schema file
    Schema(SchemaCmd),

    /// Compile relationships into foreign keys, indexes and junction tables
    Relations(RelationsCmd),

    /// Assemble a versioned migration with rollback
    Migrate(MigrateCmd),

    /// Catch-all for unknown commands
    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

impl Command {
    /// Execute the command and return formatted output
    pub fn run(self, config: &Config, format: OutputFormat) -> Result<String, Box<dyn Error>> {
        match self {
            Command::Table(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::Schema(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::Relations(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::Migrate(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::Unknown(args) => {
                Err(format!("Unknown command: {}", args.first().unwrap_or(&String::new())).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use crate::test_utils::{USER_JSON, create_temp_json_file};
    use clap::Parser;
    use rstest::rstest;

    #[rstest]
    fn test_run_formats_json() {
        let file = create_temp_json_file(USER_JSON);
        let args =
            Args::try_parse_from(["schemagen", "-o", "json", "table", file.path().to_str().unwrap()])
                .unwrap();
        let output = args.command.run(&Config::default(), args.format).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["table"], "user");
    }

    #[rstest]
    fn test_unknown_command() {
        let args = Args::try_parse_from(["schemagen", "frobnicate"]).unwrap();
        let err = args.command.run(&Config::default(), args.format).unwrap_err();
        assert!(err.to_string().contains("Unknown command: frobnicate"));
    }
}
