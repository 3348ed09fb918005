use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::MigrateCmd;
use crate::commands::Execute;
use crate::commands::input::read_all;
use crate::config::Config;
use crate::schema::{CoverageWarning, EntityFailure, compile_migration_batch};

/// Result of the migrate command execution
#[derive(Debug, Clone, Serialize)]
pub struct MigrateResult {
    pub version: String,
    pub description: String,
    pub generated_at: String,
    pub compiled: usize,
    pub up: String,
    pub down: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub written: Vec<PathBuf>,
    pub warnings: Vec<CoverageWarning>,
    pub failures: Vec<EntityFailure>,
}

fn write_script(dir: &Path, file_name: String, content: &str) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join(file_name);
    fs::write(&path, content).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    tracing::info!(path = %path.display(), "wrote migration script");
    Ok(path)
}

impl Execute for MigrateCmd {
    type Output = MigrateResult;

    fn execute(self, config: &Config) -> Result<Self::Output, Box<dyn Error>> {
        let loaded = read_all(&self.files)?;
        let version = config.version_or(self.version);
        let options = config.options_or(self.flavor);

        let outcome = compile_migration_batch(&loaded.entities, &version, &options);
        let mut failures = loaded.failures;
        failures.extend(outcome.failures);
        let now = Utc::now();
        let up = outcome.batch.render_up(now);
        let down = outcome.batch.render_down(now);

        let mut written = Vec::new();
        if let Some(dir) = &self.out_dir {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
            written.push(write_script(dir, format!("{}_up.sql", version), &up)?);
            written.push(write_script(dir, format!("{}_down.sql", version), &down)?);
        }

        Ok(MigrateResult {
            compiled: outcome.batch.up.len(),
            version: outcome.batch.version,
            description: outcome.batch.description,
            generated_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            up,
            down,
            written,
            warnings: outcome.warnings,
            failures,
        })
    }
}
