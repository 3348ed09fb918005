//! Dialect compilers.
//!
//! Each compiler turns a backend-agnostic [`Table`] into one dialect's
//! schema text. Column types are rendered through a per-dialect emitter
//! lookup ([`SchemaCompiler::base_fragment`]) that returns `None` when the
//! dialect has no emitter for a kind; the compiler then falls back to a
//! generic fragment and reports a [`CoverageWarning`] instead of failing.

pub mod document;
pub mod prisma;
pub mod relationship;
pub mod seaorm;
pub mod sql;

use std::fmt;

use serde::Serialize;

pub use document::DocumentCompiler;
pub use prisma::PrismaCompiler;
pub use relationship::{RelationshipCompiler, compile_relationship, compile_relationship_with};
pub use seaorm::SeaOrmCompiler;
pub use sql::SqlCompiler;

use super::column_type::{ColumnKind, ColumnType, Modifier};
use super::dialect::{Dialect, DialectOptions};
use super::table::{Entity, Table};
use crate::error::CompileError;

/// Text for one column type, plus whether the generic fallback was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFragment {
    pub text: String,
    pub fallback: bool,
}

/// A column kind had no emitter for the requested dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageWarning {
    pub table: String,
    pub column: String,
    pub dialect: Dialect,
    pub type_name: String,
    pub fallback: String,
}

impl fmt::Display for CoverageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no {} emitter for type '{}' on column {}.{}; rendered fallback '{}'",
            self.dialect, self.type_name, self.table, self.column, self.fallback
        )
    }
}

/// Rendered text plus the coverage warnings collected while rendering it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Emission {
    pub text: String,
    pub warnings: Vec<CoverageWarning>,
}

/// An entity that failed to compile inside a multi-entity operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityFailure {
    pub entity_id: String,
    pub code: String,
    pub message: String,
    #[serde(skip)]
    pub error: CompileError,
}

impl EntityFailure {
    pub fn new(entity_id: &str, error: CompileError) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            code: error.code().to_string(),
            message: error.to_string(),
            error,
        }
    }
}

impl fmt::Display for EntityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.entity_id, self.code, self.message)
    }
}

/// One dialect's schema compiler.
pub trait SchemaCompiler {
    const DIALECT: Dialect;

    /// The dialect's emitter for a column kind, or `None` if it has none.
    fn base_fragment(kind: &ColumnKind, column: &str, options: &DialectOptions) -> Option<String>;

    /// Generic fragment used when [`Self::base_fragment`] has no emitter.
    fn fallback_fragment(options: &DialectOptions) -> String;

    /// Render a column type: base fragment followed by its modifiers.
    fn emit_column_type(ty: &ColumnType, column: &str, options: &DialectOptions) -> ColumnFragment;

    fn compile_table(table: &Table, options: &DialectOptions) -> Result<Emission, CompileError>;

    /// Wrap already compiled tables into one schema file.
    fn compile_schema_file(tables: &[(&str, &str)], options: &DialectOptions) -> String;
}

/// Base fragment with the documented fallback.
///
/// Returns the fragment and whether the fallback was used.
pub(crate) fn base_or_fallback<C: SchemaCompiler>(
    kind: &ColumnKind,
    column: &str,
    options: &DialectOptions,
) -> (String, bool) {
    match C::base_fragment(kind, column, options) {
        Some(fragment) => (fragment, false),
        None => (C::fallback_fragment(options), true),
    }
}

/// Record a coverage warning for a column that was rendered with the fallback.
pub(crate) fn note_fallback<C: SchemaCompiler>(
    warnings: &mut Vec<CoverageWarning>,
    table: &Table,
    column: &str,
    ty: &ColumnType,
    options: &DialectOptions,
) {
    let warning = CoverageWarning {
        table: table.name.clone(),
        column: column.to_string(),
        dialect: C::DIALECT,
        type_name: ty.type_name(),
        fallback: C::fallback_fragment(options),
    };
    tracing::warn!(
        table = %warning.table,
        column = %warning.column,
        dialect = %warning.dialect,
        "{}",
        warning
    );
    warnings.push(warning);
}

/// Modifiers a table-aware ORM emitter should render for one column.
///
/// With a single-column primary key the column carries the primary-key
/// modifier even when only the table-level list named it. With a composite
/// key the table renders it, so column-level primary-key modifiers are
/// dropped.
pub(crate) fn orm_column_modifiers(
    ty: &ColumnType,
    column: &str,
    primary_key: &[String],
) -> Vec<Modifier> {
    let mut modifiers: Vec<Modifier> = ty.modifiers().to_vec();
    let in_key = primary_key.iter().any(|c| c == column);
    if primary_key.len() > 1 {
        modifiers.retain(|m| *m != Modifier::PrimaryKey);
    } else if in_key && !ty.is_primary_key() {
        modifiers.push(Modifier::PrimaryKey);
    }
    modifiers
}

/// Render one column type for a dialect.
pub fn emit_column_type(
    ty: &ColumnType,
    column: &str,
    dialect: Dialect,
    options: &DialectOptions,
) -> ColumnFragment {
    match dialect {
        Dialect::Sql => SqlCompiler::emit_column_type(ty, column, options),
        Dialect::SeaOrm => SeaOrmCompiler::emit_column_type(ty, column, options),
        Dialect::Prisma => PrismaCompiler::emit_column_type(ty, column, options),
        Dialect::Document => DocumentCompiler::emit_column_type(ty, column, options),
    }
}

/// Render a table for a dialect.
pub fn compile_table(
    table: &Table,
    dialect: Dialect,
    options: &DialectOptions,
) -> Result<Emission, CompileError> {
    tracing::debug!(table = %table.name, %dialect, "compiling table");
    match dialect {
        Dialect::Sql => SqlCompiler::compile_table(table, options),
        Dialect::SeaOrm => SeaOrmCompiler::compile_table(table, options),
        Dialect::Prisma => PrismaCompiler::compile_table(table, options),
        Dialect::Document => DocumentCompiler::compile_table(table, options),
    }
}

/// A full schema file for several entities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaOutcome {
    pub dialect: Dialect,
    pub text: String,
    pub warnings: Vec<CoverageWarning>,
    pub failures: Vec<EntityFailure>,
}

/// Compile every entity's table and wrap them into one schema file.
///
/// An entity that fails is reported in `failures`; the others are still
/// rendered.
pub fn compile_schema(entities: &[Entity], dialect: Dialect, options: &DialectOptions) -> SchemaOutcome {
    let mut compiled: Vec<(String, String)> = Vec::new();
    let mut outcome = SchemaOutcome {
        dialect,
        ..Default::default()
    };

    for entity in entities {
        match compile_table(&entity.table, dialect, options) {
            Ok(emission) => {
                outcome.warnings.extend(emission.warnings);
                compiled.push((entity.table.name.clone(), emission.text));
            }
            Err(error) => {
                tracing::warn!(entity = %entity.id, code = error.code(), "{}", error);
                outcome.failures.push(EntityFailure::new(&entity.id, error));
            }
        }
    }

    let tables: Vec<(&str, &str)> = compiled
        .iter()
        .map(|(name, text)| (name.as_str(), text.as_str()))
        .collect();
    outcome.text = match dialect {
        Dialect::Sql => SqlCompiler::compile_schema_file(&tables, options),
        Dialect::SeaOrm => SeaOrmCompiler::compile_schema_file(&tables, options),
        Dialect::Prisma => PrismaCompiler::compile_schema_file(&tables, options),
        Dialect::Document => DocumentCompiler::compile_schema_file(&tables, options),
    };
    outcome
}
