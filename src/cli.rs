//! CLI argument definitions.
//!
//! This module contains the top-level CLI structure and shared types.
//! Individual command definitions are in the `commands` module.

use clap::Parser;
use std::path::PathBuf;

use crate::commands::Command;
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile entity definitions into schema text", long_about = None)]
pub struct Args {
    /// Path to a .schemagen.json configuration file (default: ./.schemagen.json if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}
