//! Output formatting for command results.
//!
//! Supports multiple output formats: table (the generated text plus a
//! human-readable report), JSON, and toon.

use clap::ValueEnum;
use serde::Serialize;

use crate::schema::{CoverageWarning, EntityFailure};

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Generated text followed by warnings and failures
    #[default]
    Table,
    /// JSON format
    Json,
    /// Token-efficient toon format
    Toon,
}

/// Trait for types that can be formatted for output
pub trait Outputable: Serialize {
    /// Format as human-readable text
    fn to_table(&self) -> String;

    /// Format according to the specified output format
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => self.to_table(),
            OutputFormat::Json => serde_json::to_string_pretty(self).unwrap_or_default(),
            OutputFormat::Toon => {
                let json_value = serde_json::to_value(self).unwrap_or_default();
                toon::encode(&json_value, None)
            }
        }
    }
}

/// Append a `Warnings (n):` block, one indented line per warning.
pub(crate) fn push_warnings(out: &mut String, warnings: &[CoverageWarning]) {
    if warnings.is_empty() {
        return;
    }
    out.push_str(&format!("\n\nWarnings ({}):", warnings.len()));
    for warning in warnings {
        out.push_str(&format!("\n  {}", warning));
    }
}

/// Append a `Failed (n):` block, one indented line per failed entity.
pub(crate) fn push_failures(out: &mut String, failures: &[EntityFailure]) {
    if failures.is_empty() {
        return;
    }
    out.push_str(&format!("\n\nFailed ({}):", failures.len()));
    for failure in failures {
        out.push_str(&format!("\n  {}", failure));
    }
}
