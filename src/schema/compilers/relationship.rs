//! Relationship DDL: foreign keys, their supporting indexes, and junction
//! tables for many-to-many relationships.
//!
//! Output is relational DDL in the configured SQL flavor. Each returned
//! string is one complete statement.

use super::SqlCompiler;
use crate::error::CompileError;
use crate::schema::column_type::ColumnKind;
use crate::schema::dialect::DialectOptions;
use crate::schema::relationship::{EntityRef, JunctionTable, Relationship, RelationType};
use crate::schema::table::{Index, Table};

pub struct RelationshipCompiler;

impl RelationshipCompiler {
    /// Compile a relationship, resolving name references against `known_tables`.
    ///
    /// A non-empty `known_tables` is the full set of tables the relationship
    /// may point at, so a name that matches none of them is an error.
    pub fn compile(
        relationship: &Relationship,
        known_tables: &[&Table],
        options: &DialectOptions,
    ) -> Result<Vec<String>, CompileError> {
        Self::compile_resolving(relationship, known_tables, !known_tables.is_empty(), options)
    }

    /// Like [`Self::compile`], but names missing from `known_tables` are
    /// left unchecked instead of rejected.
    pub(crate) fn compile_lenient(
        relationship: &Relationship,
        known_tables: &[&Table],
        options: &DialectOptions,
    ) -> Result<Vec<String>, CompileError> {
        Self::compile_resolving(relationship, known_tables, false, options)
    }

    fn compile_resolving(
        relationship: &Relationship,
        known_tables: &[&Table],
        strict: bool,
        options: &DialectOptions,
    ) -> Result<Vec<String>, CompileError> {
        let local = resolve(relationship, &relationship.local, known_tables, strict)?;
        let foreign = resolve(relationship, &relationship.foreign, known_tables, strict)?;
        let fk = &relationship.foreign_key;

        if let Some(table) = local {
            require_column(relationship, table, &fk.local_column)?;
        }
        if let Some(table) = foreign {
            require_column(relationship, table, &fk.foreign_column)?;
        }

        tracing::debug!(
            relationship = %relationship.name,
            relation_type = %relationship.relation_type,
            "compiling relationship"
        );

        match relationship.relation_type {
            RelationType::OneToOne => Ok(Self::foreign_key(relationship, true, options)),
            RelationType::OneToMany | RelationType::ManyToOne => {
                Ok(Self::foreign_key(relationship, false, options))
            }
            RelationType::ManyToMany => {
                let junction = relationship.junction.as_ref().ok_or_else(|| {
                    CompileError::MissingJunctionTable {
                        relationship: relationship.name.clone(),
                    }
                })?;
                Self::junction(relationship, junction, local, foreign, options)
            }
        }
    }

    fn foreign_key(relationship: &Relationship, unique: bool, options: &DialectOptions) -> Vec<String> {
        let local = relationship.local.table_name();
        let foreign = relationship.foreign.table_name();
        let fk = &relationship.foreign_key;

        let mut statements = vec![format!(
            "ALTER TABLE {} ADD CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {} ON UPDATE {};",
            local,
            local,
            fk.local_column,
            fk.local_column,
            foreign,
            fk.foreign_column,
            fk.on_delete.sql(),
            fk.on_update.sql()
        )];

        if fk.indexed {
            let mut index = Index::new(
                format!("idx_{}_{}", local, fk.local_column),
                local,
                [fk.local_column.as_str()],
            );
            if unique {
                index = index.unique();
            }
            statements.push(SqlCompiler::create_index(&index, options));
        }
        statements
    }

    fn junction(
        relationship: &Relationship,
        junction: &JunctionTable,
        local: Option<&Table>,
        foreign: Option<&Table>,
        options: &DialectOptions,
    ) -> Result<Vec<String>, CompileError> {
        check_junction_columns(relationship, junction)?;

        let fk = &relationship.foreign_key;
        let local_name = relationship.local.table_name();
        let foreign_name = relationship.foreign.table_name();

        let mut lines = vec![
            format!(
                "{} {} NOT NULL",
                junction.local_column,
                referenced_type(local, &fk.local_column, &junction.local_column, options)
            ),
            format!(
                "{} {} NOT NULL",
                junction.foreign_column,
                referenced_type(foreign, &fk.foreign_column, &junction.foreign_column, options)
            ),
        ];
        for (name, column) in &junction.extra_columns {
            let (definition, fallback) = SqlCompiler::column_definition(name, column, options);
            if fallback {
                tracing::warn!(
                    junction = %junction.name,
                    column = %name,
                    type_name = %column.column_type().type_name(),
                    "no sql emitter for junction column type; rendered fallback"
                );
            }
            lines.push(definition);
        }
        lines.push(format!(
            "PRIMARY KEY ({}, {})",
            junction.local_column, junction.foreign_column
        ));
        lines.push(format!(
            "CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE",
            junction.name, junction.local_column, junction.local_column, local_name, fk.local_column
        ));
        lines.push(format!(
            "CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE",
            junction.name,
            junction.foreign_column,
            junction.foreign_column,
            foreign_name,
            fk.foreign_column
        ));

        let body: Vec<String> = lines.iter().map(|line| format!("  {}", line)).collect();
        let mut statements = vec![format!(
            "CREATE TABLE {} (\n{}\n);",
            junction.name,
            body.join(",\n")
        )];

        for column in [&junction.local_column, &junction.foreign_column] {
            let index = Index::new(
                format!("idx_{}_{}", junction.name, column),
                junction.name.as_str(),
                [column.as_str()],
            );
            statements.push(SqlCompiler::create_index(&index, options));
        }
        Ok(statements)
    }
}

/// Compile a relationship on its own. Name references are not checked.
pub fn compile_relationship(
    relationship: &Relationship,
    options: &DialectOptions,
) -> Result<Vec<String>, CompileError> {
    RelationshipCompiler::compile(relationship, &[], options)
}

/// Compile a relationship against the tables the caller knows about.
///
/// Every name reference must match one of `known_tables` and every referenced
/// column must exist. Embedded tables are checked as well.
pub fn compile_relationship_with(
    relationship: &Relationship,
    known_tables: &[&Table],
    options: &DialectOptions,
) -> Result<Vec<String>, CompileError> {
    RelationshipCompiler::compile(relationship, known_tables, options)
}

fn resolve<'a>(
    relationship: &Relationship,
    entity: &'a EntityRef,
    known_tables: &[&'a Table],
    strict: bool,
) -> Result<Option<&'a Table>, CompileError> {
    if let Some(table) = entity.table() {
        return Ok(Some(table));
    }
    let name = entity.table_name();
    match known_tables.iter().copied().find(|t| t.name == name) {
        Some(table) => Ok(Some(table)),
        None if strict => Err(CompileError::UnresolvedReference {
            relationship: relationship.name.clone(),
            target: format!("table {}", name),
        }),
        None => Ok(None),
    }
}

fn require_column(relationship: &Relationship, table: &Table, column: &str) -> Result<(), CompileError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(CompileError::UnresolvedReference {
            relationship: relationship.name.clone(),
            target: format!("column {}.{}", table.name, column),
        })
    }
}

fn check_junction_columns(relationship: &Relationship, junction: &JunctionTable) -> Result<(), CompileError> {
    let collision = |column: &str| CompileError::JunctionColumnCollision {
        relationship: relationship.name.clone(),
        junction: junction.name.clone(),
        column: column.to_string(),
    };
    if junction.local_column == junction.foreign_column {
        return Err(collision(&junction.local_column));
    }
    for name in junction.extra_columns.keys() {
        if *name == junction.local_column || *name == junction.foreign_column {
            return Err(collision(name));
        }
    }
    Ok(())
}

/// SQL type of a junction column: the referenced column's kind when the
/// table is known, otherwise uuid.
fn referenced_type(
    table: Option<&Table>,
    referenced: &str,
    junction_column: &str,
    options: &DialectOptions,
) -> String {
    let kind = table
        .and_then(|t| t.column(referenced))
        .map(|c| c.kind().clone())
        .unwrap_or(ColumnKind::Uuid);
    SqlCompiler::type_sql(&kind, junction_column, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::column_type::{ColumnType, DefaultGenerator};
    use crate::schema::dialect::SqlFlavor;
    use crate::schema::relationship::{ForeignKey, ReferentialAction};
    use crate::schema::table::Column;
    use crate::test_utils::{post_entity, post_tags_relationship, tag_entity, user_entity};
    use rstest::rstest;

    fn author() -> Relationship {
        Relationship::new(
            "author",
            RelationType::ManyToOne,
            "post",
            "user",
            ForeignKey::new("authorId", "id")
                .on_delete(ReferentialAction::Cascade)
                .indexed(),
        )
    }

    #[rstest]
    fn test_many_to_one_emits_fk_and_plain_index() {
        let statements = compile_relationship(&author(), &DialectOptions::default()).unwrap();
        assert_eq!(
            statements,
            vec![
                "ALTER TABLE post ADD CONSTRAINT fk_post_authorId FOREIGN KEY (authorId) \
                 REFERENCES user (id) ON DELETE CASCADE ON UPDATE NO ACTION;"
                    .to_string(),
                "CREATE INDEX idx_post_authorId ON post (authorId);".to_string(),
            ]
        );
    }

    #[rstest]
    fn test_one_to_one_index_is_unique() {
        let rel = Relationship::new(
            "profile",
            RelationType::OneToOne,
            "profile",
            "user",
            ForeignKey::new("userId", "id").indexed(),
        );
        let statements = compile_relationship(&rel, &DialectOptions::default()).unwrap();
        assert_eq!(
            statements[1],
            "CREATE UNIQUE INDEX idx_profile_userId ON profile (userId);"
        );
    }

    #[rstest]
    fn test_unindexed_fk_has_no_index() {
        let rel = Relationship::new(
            "owner",
            RelationType::OneToMany,
            "item",
            "user",
            ForeignKey::new("ownerId", "id").on_delete(ReferentialAction::SetNull),
        );
        let statements = compile_relationship(&rel, &DialectOptions::default()).unwrap();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("ON DELETE SET NULL"));
    }

    #[rstest]
    fn test_many_to_many_junction_table() {
        let post = post_entity().table;
        let tag = tag_entity().table;
        let statements = compile_relationship_with(
            &post_tags_relationship(),
            &[&post, &tag],
            &DialectOptions::default(),
        )
        .unwrap();

        assert_eq!(statements.len(), 3);
        let create = &statements[0];
        assert!(create.starts_with("CREATE TABLE post_tags (\n"));
        assert!(create.contains("  postId UUID NOT NULL,\n"));
        assert!(create.contains("  tagId INTEGER NOT NULL,\n"));
        assert!(create.contains("PRIMARY KEY (postId, tagId)"));
        assert!(create.contains("FOREIGN KEY (postId) REFERENCES post (id) ON DELETE CASCADE"));
        assert!(create.contains("FOREIGN KEY (tagId) REFERENCES tag (id) ON DELETE CASCADE"));
        assert_eq!(statements[1], "CREATE INDEX idx_post_tags_postId ON post_tags (postId);");
        assert_eq!(statements[2], "CREATE INDEX idx_post_tags_tagId ON post_tags (tagId);");
    }

    #[rstest]
    fn test_junction_defaults_to_uuid_columns_when_tables_unknown() {
        let statements =
            compile_relationship(&post_tags_relationship(), &DialectOptions::default()).unwrap();
        assert!(statements[0].contains("  tagId UUID NOT NULL,\n"));

        let mysql = DialectOptions::with_flavor(SqlFlavor::MySql);
        let statements = compile_relationship(&post_tags_relationship(), &mysql).unwrap();
        assert!(statements[0].contains("  postId CHAR(36) NOT NULL,\n"));
    }

    #[rstest]
    fn test_junction_extra_columns_are_rendered() {
        let mut rel = post_tags_relationship();
        if let Some(junction) = rel.junction.take() {
            rel.junction = Some(junction.with_extra_column(
                "created_at",
                Column::new(ColumnType::timestamp(true).with_default(DefaultGenerator::Now)),
            ));
        }
        let statements = compile_relationship(&rel, &DialectOptions::default()).unwrap();
        assert!(statements[0].contains(
            "  created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,\n  PRIMARY KEY"
        ));
    }

    #[rstest]
    fn test_many_to_many_without_junction_is_an_error() {
        let rel = Relationship::new(
            "tags",
            RelationType::ManyToMany,
            "post",
            "tag",
            ForeignKey::new("id", "id"),
        );
        let err = compile_relationship(&rel, &DialectOptions::default()).unwrap_err();
        assert_eq!(
            err,
            CompileError::MissingJunctionTable {
                relationship: "tags".to_string()
            }
        );
    }

    #[rstest]
    fn test_junction_column_collisions() {
        let same = Relationship::new(
            "friends",
            RelationType::ManyToMany,
            "user",
            "user",
            ForeignKey::new("id", "id"),
        )
        .with_junction(JunctionTable::new("friendship", "userId", "userId"));
        let err = compile_relationship(&same, &DialectOptions::default()).unwrap_err();
        assert_eq!(err.code(), "DB_JUNCTION_COLUMN_COLLISION");

        let mut rel = post_tags_relationship();
        if let Some(junction) = rel.junction.take() {
            rel.junction =
                Some(junction.with_extra_column("tagId", Column::new(ColumnType::integer())));
        }
        let err = compile_relationship(&rel, &DialectOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::JunctionColumnCollision { ref column, .. } if column == "tagId"
        ));
    }

    #[rstest]
    fn test_known_table_must_have_referenced_column() {
        let post = post_entity().table;
        let user = user_entity().table;
        let rel = Relationship::new(
            "author",
            RelationType::ManyToOne,
            "post",
            "user",
            ForeignKey::new("authorId", "uid"),
        );
        let err =
            compile_relationship_with(&rel, &[&post, &user], &DialectOptions::default()).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnresolvedReference {
                relationship: "author".to_string(),
                target: "column user.uid".to_string(),
            }
        );
    }

    #[rstest]
    fn test_name_missing_from_known_tables_is_unresolved() {
        let post = post_entity().table;
        let user = user_entity().table;
        let mut rel = author();
        rel.foreign = EntityRef::from("usr");
        let err =
            compile_relationship_with(&rel, &[&post, &user], &DialectOptions::default()).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnresolvedReference {
                relationship: "author".to_string(),
                target: "table usr".to_string(),
            }
        );
    }

    #[rstest]
    fn test_lenient_compile_skips_unknown_names() {
        let post = post_entity().table;
        let mut rel = author();
        rel.foreign = EntityRef::from("usr");
        let statements =
            RelationshipCompiler::compile_lenient(&rel, &[&post], &DialectOptions::default()).unwrap();
        assert!(statements[0].contains("REFERENCES usr (id)"));
    }

    #[rstest]
    fn test_embedded_table_reference_is_checked() {
        let rel = Relationship::new(
            "author",
            RelationType::ManyToOne,
            post_entity().table,
            "user",
            ForeignKey::new("writerId", "id"),
        );
        let err = compile_relationship(&rel, &DialectOptions::default()).unwrap_err();
        assert_eq!(err.code(), "DB_UNRESOLVED_REFERENCE");
    }
}
