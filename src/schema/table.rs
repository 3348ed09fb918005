//! Table model: columns, tables, indexes, constraints and the entity root.
//!
//! All types here are read-only inputs to the compilers. They deserialize
//! from JSON so an external collaborator can hand entities over as files;
//! columns go through [`ColumnSpec`] so literal defaults are decoded by the
//! column kind's own codec.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::column_type::{ColumnKind, ColumnType, DefaultGenerator, DefaultValue};
use super::dialect::Dialect;
use super::relationship::Relationship;
use crate::error::CompileError;

/// Identity generation mode for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generated {
    Always,
    ByDefault,
}

/// A column: a shared column type plus column-level attributes.
///
/// Nullability, uniqueness, primary key, default and auto increment are
/// modifiers on the column type; the accessors here read them from there.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    column_type: Arc<ColumnType>,
    pub generated: Option<Generated>,
    pub generated_as: Option<String>,
    pub comment: Option<String>,
}

impl Column {
    pub fn new(column_type: ColumnType) -> Self {
        Self::shared(Arc::new(column_type))
    }

    /// A column backed by a column type shared with other columns.
    pub fn shared(column_type: Arc<ColumnType>) -> Self {
        Self {
            column_type,
            generated: None,
            generated_as: None,
            comment: None,
        }
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    pub fn shared_type(&self) -> &Arc<ColumnType> {
        &self.column_type
    }

    pub fn kind(&self) -> &ColumnKind {
        self.column_type.kind()
    }

    pub fn is_nullable(&self) -> bool {
        self.column_type.is_nullable()
    }

    pub fn is_unique(&self) -> bool {
        self.column_type.is_unique()
    }

    pub fn is_primary(&self) -> bool {
        self.column_type.is_primary_key()
    }

    pub fn is_auto_increment(&self) -> bool {
        self.column_type.is_auto_increment()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.column_type.default_value()
    }

    fn retyped(self, column_type: ColumnType) -> Self {
        Self {
            column_type: Arc::new(column_type),
            ..self
        }
    }

    pub fn nullable(self) -> Self {
        let ty = self.column_type.with_nullable();
        self.retyped(ty)
    }

    pub fn unique(self) -> Self {
        let ty = self.column_type.with_unique();
        self.retyped(ty)
    }

    pub fn primary(self) -> Self {
        let ty = self.column_type.with_primary_key();
        self.retyped(ty)
    }

    pub fn default(self, default: impl Into<DefaultValue>) -> Self {
        let ty = self.column_type.with_default(default);
        self.retyped(ty)
    }

    pub fn auto_increment(self) -> Self {
        let ty = self.column_type.with_auto_increment();
        self.retyped(ty)
    }

    pub fn generated(mut self, generated: Generated) -> Self {
        self.generated = Some(generated);
        self
    }

    pub fn generated_as(mut self, expression: impl Into<String>) -> Self {
        self.generated_as = Some(expression.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// JSON form of a default: a generator or a literal decoded by the column codec.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DefaultSpec {
    Generator { generator: DefaultGenerator },
    Literal(serde_json::Value),
}

/// JSON form of a column.
///
/// Modifiers are applied in the conventional order: nullable, unique,
/// primary key, default, auto increment.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ColumnSpec {
    #[serde(flatten)]
    kind: ColumnKind,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    default: Option<DefaultSpec>,
    #[serde(default)]
    auto_increment: bool,
    #[serde(default)]
    generated: Option<Generated>,
    #[serde(default)]
    generated_as: Option<String>,
    #[serde(default)]
    comment: Option<String>,
}

impl ColumnSpec {
    pub(crate) fn into_column(self, name: &str) -> Result<Column, CompileError> {
        let mut ty = ColumnType::new(self.kind);
        if self.nullable {
            ty = ty.with_nullable();
        }
        if self.unique {
            ty = ty.with_unique();
        }
        if self.primary {
            ty = ty.with_primary_key();
        }
        match self.default {
            Some(DefaultSpec::Generator { generator }) => ty = ty.with_default(generator),
            Some(DefaultSpec::Literal(wire)) => {
                let value = ty
                    .deserialize(&wire)
                    .map_err(|source| CompileError::InvalidDefault {
                        column: name.to_string(),
                        source,
                    })?;
                ty = ty.with_default(value);
            }
            None => {}
        }
        if self.auto_increment {
            ty = ty.with_auto_increment();
        }

        Ok(Column {
            column_type: Arc::new(ty),
            generated: self.generated,
            generated_as: self.generated_as,
            comment: self.comment,
        })
    }
}

pub(crate) fn build_columns(
    specs: IndexMap<String, ColumnSpec>,
) -> Result<IndexMap<String, Column>, CompileError> {
    specs
        .into_iter()
        .map(|(name, spec)| {
            let column = spec.into_column(&name)?;
            Ok((name, column))
        })
        .collect()
}

/// Named boolean check over a table's rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConstraint {
    pub name: String,
    pub expression: String,
}

/// One entity's table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "TableSpec")]
pub struct Table {
    pub name: String,
    /// Columns in declaration order; the order is reproduced in emitted text.
    pub columns: IndexMap<String, Column>,
    pub primary_key: Vec<String>,
    pub unique_constraints: Vec<Vec<String>>,
    pub check_constraints: Vec<CheckConstraint>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TableSpec {
    name: String,
    columns: IndexMap<String, ColumnSpec>,
    #[serde(default)]
    primary_key: Vec<String>,
    #[serde(default)]
    unique_constraints: Vec<Vec<String>>,
    #[serde(default)]
    check_constraints: Vec<CheckConstraint>,
    #[serde(default)]
    comment: Option<String>,
}

impl TryFrom<TableSpec> for Table {
    type Error = CompileError;

    fn try_from(spec: TableSpec) -> Result<Self, Self::Error> {
        Ok(Table {
            name: spec.name,
            columns: build_columns(spec.columns)?,
            primary_key: spec.primary_key,
            unique_constraints: spec.unique_constraints,
            check_constraints: spec.check_constraints,
            comment: spec.comment,
        })
    }
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            primary_key: Vec::new(),
            unique_constraints: Vec::new(),
            check_constraints: Vec::new(),
            comment: None,
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unique<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_constraints
            .push(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_check(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.check_constraints.push(CheckConstraint {
            name: name.into(),
            expression: expression.into(),
        });
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Columns whose type carries the primary-key modifier, in table order.
    pub fn flagged_primary_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, c)| c.is_primary())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Name of a unique constraint over `columns`.
    pub fn unique_constraint_name(&self, columns: &[String]) -> String {
        format!("uq_{}_{}", self.name, columns.join("_"))
    }

    fn require_column(&self, column: &str, context: &str) -> Result<(), CompileError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(CompileError::UnknownColumn {
                table: self.name.clone(),
                column: column.to_string(),
                context: context.to_string(),
            })
        }
    }

    /// Cross-check the table's structure and return its primary key columns.
    ///
    /// The relational dialect requires the table-level list. The other
    /// dialects accept exactly one flagged column instead. When both are
    /// given they must agree.
    pub fn resolve_primary_key(&self, dialect: Dialect) -> Result<Vec<String>, CompileError> {
        if self.columns.is_empty() {
            return Err(CompileError::EmptyTable {
                table: self.name.clone(),
            });
        }

        for column in &self.primary_key {
            self.require_column(column, "primary key")?;
        }
        for group in &self.unique_constraints {
            for column in group {
                self.require_column(column, "unique constraint")?;
            }
        }

        let flagged = self.flagged_primary_columns();
        if !self.primary_key.is_empty() && !flagged.is_empty() {
            let declared: HashSet<&str> = self.primary_key.iter().map(String::as_str).collect();
            let marked: HashSet<&str> = flagged.iter().copied().collect();
            if declared != marked {
                return Err(CompileError::InconsistentPrimaryKey {
                    table: self.name.clone(),
                    declared: self.primary_key.clone(),
                    flagged: flagged.iter().map(|s| s.to_string()).collect(),
                });
            }
        }

        let resolved = if !self.primary_key.is_empty() {
            self.primary_key.clone()
        } else if dialect.is_relational() {
            return Err(CompileError::MissingPrimaryKey {
                table: self.name.clone(),
            });
        } else {
            match flagged.as_slice() {
                [] => {
                    return Err(CompileError::MissingPrimaryKey {
                        table: self.name.clone(),
                    });
                }
                [single] => vec![single.to_string()],
                several => {
                    return Err(CompileError::AmbiguousPrimaryKey {
                        table: self.name.clone(),
                        columns: several.iter().map(|s| s.to_string()).collect(),
                    });
                }
            }
        };

        for name in &resolved {
            if self.columns.get(name).is_some_and(Column::is_nullable) {
                return Err(CompileError::NullablePrimaryKey {
                    table: self.name.clone(),
                    column: name.clone(),
                });
            }
        }

        Ok(resolved)
    }
}

/// Access method of an index. Dialects that do not know a type ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Btree,
    Hash,
    Gist,
    Gin,
}

impl IndexType {
    pub fn keyword(&self) -> &'static str {
        match self {
            IndexType::Btree => "btree",
            IndexType::Hash => "hash",
            IndexType::Gist => "gist",
            IndexType::Gin => "gin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub table_name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    /// Partial-index predicate
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    #[serde(default, rename = "type")]
    pub index_type: Option<IndexType>,
}

impl Index {
    pub fn new<I, S>(name: impl Into<String>, table_name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            where_clause: None,
            index_type: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn partial(mut self, predicate: impl Into<String>) -> Self {
        self.where_clause = Some(predicate.into());
        self
    }

    pub fn using(mut self, index_type: IndexType) -> Self {
        self.index_type = Some(index_type);
        self
    }
}

/// Entity-level constraint, emitted as `ALTER TABLE ... ADD CONSTRAINT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    Unique { name: String, columns: Vec<String> },
    Check { name: String, expression: String },
}

impl Constraint {
    pub fn name(&self) -> &str {
        match self {
            Constraint::Unique { name, .. } | Constraint::Check { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityName {
    pub singular: String,
    pub plural: String,
}

/// Aggregate root handed to the compiler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: EntityName,
    pub table: Table,
    /// Field-level metadata owned by other generators; passed through untouched.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Entity {
    pub fn new(id: impl Into<String>, singular: &str, plural: &str, table: Table) -> Self {
        Self {
            id: id.into(),
            name: EntityName {
                singular: singular.to_string(),
                plural: plural.to_string(),
            },
            table,
            metadata: serde_json::Map::new(),
            relationships: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::value::Value;
    use rstest::rstest;

    fn user_table() -> Table {
        Table::new("user")
            .with_column("id", Column::new(ColumnType::uuid()).primary())
            .with_column("email", Column::new(ColumnType::string(255)).unique())
            .with_primary_key(["id"])
    }

    #[rstest]
    fn test_columns_keep_insertion_order() {
        let table = Table::new("t")
            .with_column("z", Column::new(ColumnType::integer()))
            .with_column("a", Column::new(ColumnType::integer()))
            .with_column("m", Column::new(ColumnType::integer()));
        let names: Vec<_> = table.columns.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[rstest]
    fn test_resolve_primary_key_consistent_declaration() {
        for dialect in Dialect::ALL {
            assert_eq!(user_table().resolve_primary_key(dialect).unwrap(), vec!["id"]);
        }
    }

    #[rstest]
    fn test_relational_requires_table_level_primary_key() {
        let table = Table::new("user").with_column("id", Column::new(ColumnType::uuid()).primary());
        let err = table.resolve_primary_key(Dialect::Sql).unwrap_err();
        assert_eq!(err.code(), "DB_MISSING_PRIMARY_KEY");
        assert_eq!(table.resolve_primary_key(Dialect::Prisma).unwrap(), vec!["id"]);
    }

    #[rstest]
    #[case(Dialect::SeaOrm)]
    #[case(Dialect::Prisma)]
    #[case(Dialect::Document)]
    fn test_orm_dialects_reject_zero_or_several_flagged(#[case] dialect: Dialect) {
        let none = Table::new("t").with_column("a", Column::new(ColumnType::integer()));
        assert!(matches!(
            none.resolve_primary_key(dialect),
            Err(CompileError::MissingPrimaryKey { .. })
        ));

        let several = Table::new("t")
            .with_column("a", Column::new(ColumnType::integer()).primary())
            .with_column("b", Column::new(ColumnType::integer()).primary());
        assert!(matches!(
            several.resolve_primary_key(dialect),
            Err(CompileError::AmbiguousPrimaryKey { .. })
        ));
    }

    #[rstest]
    fn test_inconsistent_primary_key_declarations() {
        let table = Table::new("t")
            .with_column("a", Column::new(ColumnType::integer()).primary())
            .with_column("b", Column::new(ColumnType::integer()))
            .with_primary_key(["b"]);
        let err = table.resolve_primary_key(Dialect::Prisma).unwrap_err();
        assert_eq!(err.code(), "DB_INCONSISTENT_PRIMARY_KEY");
    }

    #[rstest]
    fn test_unknown_and_nullable_primary_key_columns() {
        let unknown = user_table().with_primary_key(["uid"]);
        assert!(matches!(
            unknown.resolve_primary_key(Dialect::Sql),
            Err(CompileError::UnknownColumn { .. })
        ));

        let nullable = Table::new("t")
            .with_column("a", Column::new(ColumnType::integer()).nullable())
            .with_primary_key(["a"]);
        assert!(matches!(
            nullable.resolve_primary_key(Dialect::Sql),
            Err(CompileError::NullablePrimaryKey { .. })
        ));

        let empty = Table::new("t").with_primary_key(["a"]);
        assert!(matches!(
            empty.resolve_primary_key(Dialect::Sql),
            Err(CompileError::EmptyTable { .. })
        ));
    }

    #[rstest]
    fn test_unique_constraint_columns_must_exist() {
        let table = user_table().with_unique(["email", "tenant"]);
        let err = table.resolve_primary_key(Dialect::Sql).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownColumn {
                table: "user".to_string(),
                column: "tenant".to_string(),
                context: "unique constraint".to_string(),
            }
        );
    }

    #[rstest]
    fn test_table_deserializes_with_modifiers_in_conventional_order() {
        let json = r#"{
            "name": "post",
            "columns": {
                "id": {"type": "uuid", "primary": true, "default": {"generator": "random_uuid"}},
                "title": {"type": "string", "max_length": 120},
                "views": {"type": "integer", "default": 0, "nullable": true, "unique": true},
                "published_at": {"type": "timestamp", "nullable": true}
            },
            "primary_key": ["id"]
        }"#;
        let table: Table = serde_json::from_str(json).unwrap();

        let names: Vec<_> = table.columns.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "title", "views", "published_at"]);

        let views = table.column("views").unwrap();
        assert!(views.is_nullable() && views.is_unique());
        assert_eq!(
            views.default_value(),
            Some(&DefaultValue::Literal(Value::Integer(0)))
        );

        let id = table.column("id").unwrap();
        assert_eq!(
            id.default_value(),
            Some(&DefaultValue::Generator(DefaultGenerator::RandomUuid))
        );
    }

    #[rstest]
    fn test_literal_default_is_decoded_by_column_codec() {
        let json = r#"{
            "name": "t",
            "columns": {"age": {"type": "integer", "default": "ten"}}
        }"#;
        let err = serde_json::from_str::<Table>(json).unwrap_err();
        assert!(err.to_string().contains("Invalid default for column 'age'"));
    }

    #[rstest]
    fn test_column_builder_shares_nothing_mutable() {
        let shared = Arc::new(ColumnType::string(64));
        let a = Column::shared(Arc::clone(&shared)).unique();
        let b = Column::shared(Arc::clone(&shared));
        assert!(a.is_unique());
        assert!(!b.is_unique());
        assert!(shared.modifiers().is_empty());
    }
}
