use std::error::Error;

use serde::Serialize;

use super::RelationsCmd;
use crate::commands::Execute;
use crate::commands::input::read_all;
use crate::config::Config;
use crate::schema::{EntityFailure, Table, compile_relationship_with};

/// DDL for one relationship
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipDdl {
    pub entity_id: String,
    pub name: String,
    pub relation_type: String,
    pub statements: Vec<String>,
}

/// Result of the relations command execution
#[derive(Debug, Default, Serialize)]
pub struct RelationsResult {
    pub relationships: Vec<RelationshipDdl>,
    pub failures: Vec<EntityFailure>,
}

impl Execute for RelationsCmd {
    type Output = RelationsResult;

    fn execute(self, config: &Config) -> Result<Self::Output, Box<dyn Error>> {
        let loaded = read_all(&self.files)?;
        let wanted = |id: &str| self.entity.as_deref().is_none_or(|w| w == id);
        if let Some(id) = &self.entity {
            let loaded_ok = loaded.entities.iter().any(|e| &e.id == id);
            let failed = loaded.failures.iter().any(|f| &f.entity_id == id);
            if !loaded_ok && !failed {
                return Err(format!("No entity '{}' in the given files", id).into());
            }
        }

        let options = config.options_or(self.flavor);
        let known: Vec<&Table> = loaded.entities.iter().map(|e| &e.table).collect();
        let mut result = RelationsResult {
            failures: loaded
                .failures
                .iter()
                .filter(|f| wanted(&f.entity_id))
                .cloned()
                .collect(),
            ..Default::default()
        };

        let selected = loaded
            .entities
            .iter()
            .filter(|e| wanted(&e.id));
        for entity in selected {
            for relationship in &entity.relationships {
                match compile_relationship_with(relationship, &known, &options) {
                    Ok(statements) => result.relationships.push(RelationshipDdl {
                        entity_id: entity.id.clone(),
                        name: relationship.name.clone(),
                        relation_type: relationship.relation_type.to_string(),
                        statements,
                    }),
                    Err(error) => {
                        tracing::warn!(
                            entity = %entity.id,
                            relationship = %relationship.name,
                            code = error.code(),
                            "{}",
                            error
                        );
                        result.failures.push(EntityFailure::new(&entity.id, error));
                    }
                }
            }
        }

        Ok(result)
    }
}
