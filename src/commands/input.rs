//! Entity file loading shared by the commands.
//!
//! An entity file holds either one entity object or an array of them.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::error::CompileError;
use crate::schema::{Entity, EntityFailure};

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid entity JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate entity id '{id}' in {}", path.display())]
    DuplicateEntity { id: String, path: PathBuf },
}

pub(crate) fn validate_file_exists(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("File not found: {}", path.display()))
    }
}

/// Entities loaded from one or more files, plus the ones that did not parse.
#[derive(Debug, Default)]
pub struct LoadedEntities {
    pub entities: Vec<Entity>,
    pub failures: Vec<EntityFailure>,
}

/// Label for an entity that failed to parse: its `id` when it has one,
/// otherwise its position in the file.
fn entity_label(raw: &JsonValue, path: &Path, position: usize) -> String {
    raw.get("id")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}[{}]", path.display(), position))
}

/// Read the entities in one file, in file order.
///
/// Malformed JSON fails the whole file. An element that is valid JSON but
/// not a valid entity is reported in `failures` and the rest still load.
pub fn read_entities(path: &Path) -> Result<LoadedEntities, InputError> {
    let content = fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let json: JsonValue = serde_json::from_str(&content).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let elements = match json {
        JsonValue::Array(elements) => elements,
        other => vec![other],
    };

    let mut loaded = LoadedEntities::default();
    for (position, raw) in elements.into_iter().enumerate() {
        let label = entity_label(&raw, path, position);
        match serde_json::from_value::<Entity>(raw) {
            Ok(entity) => loaded.entities.push(entity),
            Err(e) => {
                let error = CompileError::InvalidEntity {
                    message: e.to_string(),
                };
                tracing::warn!(path = %path.display(), entity = %label, "{}", error);
                loaded.failures.push(EntityFailure::new(&label, error));
            }
        }
    }
    tracing::debug!(
        path = %path.display(),
        count = loaded.entities.len(),
        failed = loaded.failures.len(),
        "loaded entities"
    );
    Ok(loaded)
}

/// Read several files, keeping file order then in-file order. Entity ids
/// must be unique across all files.
pub fn read_all(paths: &[PathBuf]) -> Result<LoadedEntities, InputError> {
    let mut all = LoadedEntities::default();
    for path in paths {
        let loaded = read_entities(path)?;
        for entity in loaded.entities {
            if all.entities.iter().any(|e| e.id == entity.id) {
                return Err(InputError::DuplicateEntity {
                    id: entity.id,
                    path: path.clone(),
                });
            }
            all.entities.push(entity);
        }
        all.failures.extend(loaded.failures);
    }
    Ok(all)
}
