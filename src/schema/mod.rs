//! Schema model and compilers.
//!
//! The model ([`table`], [`relationship`], [`column_type`]) is a read-only
//! description of an entity's storage. The [`compilers`] render it as text
//! for one of four dialects, and [`migrations`] assembles relational
//! migration scripts from it.
//!
//! Every compilation is a pure function of its inputs: the same entity,
//! dialect and options always produce byte-identical text.

pub mod column_type;
pub mod compilers;
pub mod dialect;
pub mod escape;
pub mod migrations;
pub mod relationship;
pub mod table;
pub mod value;

pub use column_type::{ColumnKind, ColumnType, DefaultGenerator, DefaultValue, Modifier};
pub use compilers::{
    CoverageWarning, Emission, EntityFailure, SchemaOutcome, compile_relationship,
    compile_relationship_with, compile_schema, compile_table, emit_column_type,
};
pub use dialect::{Dialect, DialectOptions, SqlFlavor};
pub use migrations::{
    BatchOutcome, EntityMigration, MigrationBatch, compile_migration, compile_migration_batch,
};
pub use relationship::{
    EntityRef, ForeignKey, JunctionTable, ReferentialAction, RelationType, Relationship,
};
pub use table::{
    CheckConstraint, Column, Constraint, Entity, EntityName, Generated, Index, IndexType, Table,
};
pub use value::Value;
