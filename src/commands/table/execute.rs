use std::error::Error;

use serde::Serialize;

use super::TableCmd;
use crate::commands::Execute;
use crate::commands::input::read_entities;
use crate::config::Config;
use crate::schema::{CoverageWarning, Dialect, Entity, compile_table};

/// Result of the table command execution
#[derive(Debug, Clone, Serialize)]
pub struct TableResult {
    pub entity_id: String,
    pub table: String,
    pub dialect: Dialect,
    pub text: String,
    pub warnings: Vec<CoverageWarning>,
}

fn select_entity(entities: Vec<Entity>, wanted: Option<&str>) -> Result<Entity, Box<dyn Error>> {
    match wanted {
        Some(id) => {
            let known: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
            entities
                .into_iter()
                .find(|e| e.id == id)
                .ok_or_else(|| format!("No entity '{}' (file has: {})", id, known.join(", ")).into())
        }
        None => {
            let count = entities.len();
            let mut iter = entities.into_iter();
            match (iter.next(), count) {
                (Some(entity), 1) => Ok(entity),
                (None, _) => Err("File contains no entities".into()),
                _ => Err(format!("File contains {} entities; choose one with --entity", count).into()),
            }
        }
    }
}

impl Execute for TableCmd {
    type Output = TableResult;

    fn execute(self, config: &Config) -> Result<Self::Output, Box<dyn Error>> {
        let loaded = read_entities(&self.file)?;
        let failed = loaded.failures.iter().find(|f| match self.entity.as_deref() {
            Some(id) => f.entity_id == id,
            None => loaded.entities.is_empty() && loaded.failures.len() == 1,
        });
        if let Some(failure) = failed {
            return Err(failure.to_string().into());
        }
        let entity = select_entity(loaded.entities, self.entity.as_deref())?;
        let dialect = config.dialect_or(self.dialect);
        let options = config.options_or(self.flavor);

        let emission = compile_table(&entity.table, dialect, &options)?;

        Ok(TableResult {
            entity_id: entity.id,
            table: entity.table.name,
            dialect,
            text: emission.text,
            warnings: emission.warnings,
        })
    }
}
