//! Migration assembly.
//!
//! A per-entity script is the entity's table DDL followed by its index,
//! constraint and relationship DDL. Each non-empty section is preceded by a
//! `-- <entity> (<version>): <section>` header. A batch collects the scripts
//! of several entities plus the matching rollback statements.
//!
//! Scripts are relational DDL regardless of which dialect the tables are
//! also emitted in; the SQL flavor comes from [`DialectOptions`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::compilers::{
    CoverageWarning, EntityFailure, RelationshipCompiler, SchemaCompiler, SqlCompiler,
    compile_relationship_with,
};
use super::dialect::DialectOptions;
use super::table::{Constraint, Entity, Table};
use crate::error::CompileError;

/// Migration script for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMigration {
    pub entity_id: String,
    pub table: String,
    pub version: String,
    pub script: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CoverageWarning>,
}

/// Forward and rollback scripts for a set of entities.
///
/// `up[i]` and `down[i]` belong to the same entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationBatch {
    pub version: String,
    pub description: String,
    pub up: Vec<String>,
    pub down: Vec<String>,
}

impl MigrationBatch {
    /// Forward migration file with a generation header.
    pub fn render_up(&self, generated_at: DateTime<Utc>) -> String {
        self.render("Migration", &self.up, generated_at)
    }

    /// Rollback file with a generation header.
    pub fn render_down(&self, generated_at: DateTime<Utc>) -> String {
        self.render("Rollback", &self.down, generated_at)
    }

    fn render(&self, label: &str, scripts: &[String], generated_at: DateTime<Utc>) -> String {
        let mut out = format!(
            "-- {} {}: {}\n-- Generated at {}\n",
            label,
            self.version,
            self.description,
            generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        for script in scripts {
            out.push('\n');
            out.push_str(script);
            out.push('\n');
        }
        out
    }
}

/// Result of a batch: the successful part plus what failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub batch: MigrationBatch,
    pub failures: Vec<EntityFailure>,
    pub warnings: Vec<CoverageWarning>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

fn section(entity: &Entity, version: &str, name: &str, statements: &[String]) -> Option<String> {
    if statements.is_empty() {
        return None;
    }
    Some(format!(
        "-- {} ({}): {}\n{}",
        entity.name.singular,
        version,
        name,
        statements.join("\n")
    ))
}

fn require_columns(table: &Table, columns: &[String], context: &str) -> Result<(), CompileError> {
    match columns.iter().find(|c| !table.has_column(c)) {
        Some(missing) => Err(CompileError::UnknownColumn {
            table: table.name.clone(),
            column: missing.clone(),
            context: context.to_string(),
        }),
        None => Ok(()),
    }
}

/// Compile one entity's migration script.
pub fn compile_migration(
    entity: &Entity,
    version: &str,
    options: &DialectOptions,
) -> Result<EntityMigration, CompileError> {
    compile_migration_with(entity, version, &[], options)
}

/// Compile one entity's migration, resolving relationship references
/// against `known_tables` as well as the entity's own table.
///
/// With an empty `known_tables` only the entity's own table is checked and
/// references to other tables are taken as given.
pub fn compile_migration_with(
    entity: &Entity,
    version: &str,
    known_tables: &[&Table],
    options: &DialectOptions,
) -> Result<EntityMigration, CompileError> {
    let table = &entity.table;
    let emission = SqlCompiler::compile_table(table, options)?;

    let mut indexes = Vec::with_capacity(entity.indexes.len());
    for index in &entity.indexes {
        if index.table_name == table.name {
            require_columns(table, &index.columns, &format!("index {}", index.name))?;
        }
        indexes.push(SqlCompiler::create_index(index, options));
    }

    let mut constraints = Vec::with_capacity(entity.constraints.len());
    for constraint in &entity.constraints {
        if let Constraint::Unique { columns, .. } = constraint {
            require_columns(table, columns, &format!("constraint {}", constraint.name()))?;
        }
        constraints.push(SqlCompiler::add_constraint(&table.name, constraint));
    }

    let mut tables: Vec<&Table> = known_tables.to_vec();
    if !tables.iter().any(|t| t.name == table.name) {
        tables.push(table);
    }
    let mut relationships = Vec::new();
    for relationship in &entity.relationships {
        let statements = if known_tables.is_empty() {
            RelationshipCompiler::compile_lenient(relationship, &tables, options)?
        } else {
            compile_relationship_with(relationship, &tables, options)?
        };
        relationships.extend(statements);
    }

    let sections: Vec<String> = [
        section(entity, version, "table", std::slice::from_ref(&emission.text)),
        section(entity, version, "indexes", &indexes),
        section(entity, version, "constraints", &constraints),
        section(entity, version, "relationships", &relationships),
    ]
    .into_iter()
    .flatten()
    .collect();

    tracing::debug!(entity = %entity.id, %version, sections = sections.len(), "compiled migration");

    Ok(EntityMigration {
        entity_id: entity.id.clone(),
        table: table.name.clone(),
        version: version.to_string(),
        script: sections.join("\n\n"),
        warnings: emission.warnings,
    })
}

/// Compile a batch. Entities that fail are reported in `failures` and left
/// out of both `up` and `down`; the others still compile.
pub fn compile_migration_batch(
    entities: &[Entity],
    version: &str,
    options: &DialectOptions,
) -> BatchOutcome {
    let known: Vec<&Table> = entities.iter().map(|e| &e.table).collect();
    let mut outcome = BatchOutcome {
        batch: MigrationBatch {
            version: version.to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut created: Vec<&str> = Vec::new();

    for entity in entities {
        match compile_migration_with(entity, version, &known, options) {
            Ok(migration) => {
                outcome.batch.up.push(migration.script);
                outcome.batch.down.push(SqlCompiler::drop_table(&entity.table.name));
                outcome.warnings.extend(migration.warnings);
                created.push(&entity.table.name);
            }
            Err(error) => {
                tracing::warn!(entity = %entity.id, code = error.code(), "{}", error);
                outcome.failures.push(EntityFailure::new(&entity.id, error));
            }
        }
    }

    outcome.batch.description = if created.is_empty() {
        "no tables".to_string()
    } else {
        format!("create {}", created.join(", "))
    };
    tracing::info!(
        %version,
        compiled = outcome.batch.up.len(),
        failed = outcome.failures.len(),
        "migration batch assembled"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::column_type::ColumnType;
    use crate::schema::relationship::{EntityRef, ForeignKey, Relationship, RelationType};
    use crate::schema::table::{Column, Index};
    use crate::test_utils::{post_entity, tag_entity, user_entity};
    use chrono::TimeZone;
    use rstest::rstest;

    fn options() -> DialectOptions {
        DialectOptions::default()
    }

    #[rstest]
    fn test_sections_in_order_with_headers() {
        let entity = post_entity()
            .with_index(Index::new("idx_post_title", "post", ["title"]))
            .with_constraint(Constraint::Check {
                name: "chk_title".to_string(),
                expression: "length(title) > 0".to_string(),
            });
        let migration = compile_migration(&entity, "v2", &options()).unwrap();
        let script = &migration.script;

        let table = script.find("-- post (v2): table\nCREATE TABLE post (").unwrap();
        let indexes = script
            .find("-- post (v2): indexes\nCREATE INDEX idx_post_title ON post (title);")
            .unwrap();
        let constraints = script
            .find("-- post (v2): constraints\nALTER TABLE post ADD CONSTRAINT chk_title")
            .unwrap();
        let relationships = script.find("-- post (v2): relationships\n").unwrap();
        assert!(table < indexes && indexes < constraints && constraints < relationships);
    }

    #[rstest]
    fn test_empty_sections_are_omitted() {
        let migration = compile_migration(&user_entity(), "v1", &options()).unwrap();
        assert!(migration.script.starts_with("-- user (v1): table\n"));
        assert!(!migration.script.contains("indexes"));
        assert!(!migration.script.contains("constraints"));
        assert!(!migration.script.contains("relationships"));
    }

    #[rstest]
    fn test_index_on_unknown_column_fails() {
        let entity = user_entity().with_index(Index::new("idx_user_name", "user", ["name"]));
        let err = compile_migration(&entity, "v1", &options()).unwrap_err();
        assert_eq!(err.code(), "DB_UNKNOWN_COLUMN");
    }

    #[rstest]
    fn test_batch_up_and_down_match_successes() {
        let broken = Entity::new(
            "broken",
            "broken",
            "brokens",
            Table::new("broken").with_column("x", Column::new(ColumnType::integer())),
        );
        let entities = vec![user_entity(), broken, post_entity(), tag_entity()];
        let outcome = compile_migration_batch(&entities, "2024_01", &options());

        assert_eq!(outcome.batch.up.len(), 3);
        assert_eq!(outcome.batch.down.len(), 3);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].entity_id, "broken");
        assert!(!outcome.is_complete());
        assert_eq!(
            outcome.batch.down,
            vec![
                "DROP TABLE IF EXISTS user CASCADE;",
                "DROP TABLE IF EXISTS post CASCADE;",
                "DROP TABLE IF EXISTS tag CASCADE;",
            ]
        );
        assert_eq!(outcome.batch.description, "create user, post, tag");
        assert!(outcome.batch.up.iter().all(|s| s.contains("(2024_01)")));
    }

    #[rstest]
    fn test_batch_resolves_relationships_against_batch_tables() {
        let bad = post_entity().with_relationship(Relationship::new(
            "editor",
            RelationType::ManyToOne,
            "post",
            "user",
            ForeignKey::new("authorId", "missing"),
        ));
        let outcome = compile_migration_batch(&[user_entity(), bad], "v1", &options());
        assert_eq!(outcome.batch.up.len(), 1);
        assert_eq!(outcome.failures[0].code, "DB_UNRESOLVED_REFERENCE");
    }

    #[rstest]
    fn test_batch_rejects_reference_to_table_outside_batch() {
        let mut post = post_entity();
        post.relationships[0].foreign = EntityRef::from("usr");
        let outcome = compile_migration_batch(&[user_entity(), post], "v1", &options());

        assert_eq!(outcome.batch.up.len(), 1);
        assert_eq!(outcome.batch.down, vec!["DROP TABLE IF EXISTS user CASCADE;"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].entity_id, "post");
        assert_eq!(outcome.failures[0].code, "DB_UNRESOLVED_REFERENCE");
        assert!(outcome.failures[0].message.contains("table usr"));
        assert!(outcome.batch.up.iter().all(|s| !s.contains("REFERENCES usr")));
    }

    #[rstest]
    fn test_section_header_uses_entity_name() {
        let entity = Entity::new(
            "ent_42",
            "person",
            "people",
            Table::new("people")
                .with_column("id", Column::new(ColumnType::uuid()))
                .with_primary_key(["id"]),
        );
        let migration = compile_migration(&entity, "v1", &options()).unwrap();
        assert!(migration.script.starts_with("-- person (v1): table\nCREATE TABLE people ("));
        assert_eq!(migration.entity_id, "ent_42");
    }

    #[rstest]
    fn test_batch_is_deterministic() {
        let entities = vec![user_entity(), post_entity(), tag_entity()];
        let a = compile_migration_batch(&entities, "v1", &options());
        let b = compile_migration_batch(&entities, "v1", &options());
        assert_eq!(a.batch, b.batch);
    }

    #[rstest]
    fn test_render_carries_timestamp_only_in_header() {
        let outcome = compile_migration_batch(&[user_entity()], "v3", &options());
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let up = outcome.batch.render_up(at);
        assert!(up.starts_with("-- Migration v3: create user\n-- Generated at 2024-05-06T07:08:09Z\n"));
        assert!(up.contains("CREATE TABLE user ("));
        let down = outcome.batch.render_down(at);
        assert!(down.starts_with("-- Rollback v3: create user\n"));
        assert!(down.contains("DROP TABLE IF EXISTS user CASCADE;"));
        assert!(outcome.batch.up.iter().all(|s| !s.contains("2024-05-06")));
    }
}
