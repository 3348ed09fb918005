//! Error types for schema compilation and value codecs.
//!
//! Structural problems in an entity are [`CompileError`]s and abort the
//! compilation of that entity. Codec problems are [`CodecError`]s and only
//! surface when a caller runs a column type's codec or validation.

use thiserror::Error;

/// A schema-structural error. Fatal to the entity being compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Table '{table}' has no primary key")]
    MissingPrimaryKey { table: String },

    #[error("Table '{table}' has several columns flagged as primary key: {}", columns.join(", "))]
    AmbiguousPrimaryKey { table: String, columns: Vec<String> },

    #[error(
        "Table '{table}' declares primary key ({}) but columns flagged primary are ({})",
        declared.join(", "),
        flagged.join(", ")
    )]
    InconsistentPrimaryKey {
        table: String,
        declared: Vec<String>,
        flagged: Vec<String>,
    },

    #[error("Primary key column '{table}.{column}' is nullable")]
    NullablePrimaryKey { table: String, column: String },

    #[error("Table '{table}' has no column '{column}' (referenced by {context})")]
    UnknownColumn {
        table: String,
        column: String,
        context: String,
    },

    #[error("Table '{table}' has no columns")]
    EmptyTable { table: String },

    #[error("Relationship '{relationship}' references unknown {target}")]
    UnresolvedReference { relationship: String, target: String },

    #[error("Many-to-many relationship '{relationship}' has no junction table")]
    MissingJunctionTable { relationship: String },

    #[error("Junction table '{junction}' of relationship '{relationship}' reuses column '{column}'")]
    JunctionColumnCollision {
        relationship: String,
        junction: String,
        column: String,
    },

    #[error("Unknown relation type '{value}'")]
    UnknownRelationType { value: String },

    #[error("Unknown dialect '{value}' (expected sql, seaorm, prisma or document)")]
    UnknownDialect { value: String },

    #[error("Unknown column type '{value}'")]
    UnknownColumnType { value: String },

    #[error("Invalid entity definition: {message}")]
    InvalidEntity { message: String },

    #[error("Invalid default for column '{column}': {source}")]
    InvalidDefault {
        column: String,
        #[source]
        source: CodecError,
    },
}

impl CompileError {
    /// Stable error code, grouped by class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingPrimaryKey { .. } => "DB_MISSING_PRIMARY_KEY",
            Self::AmbiguousPrimaryKey { .. } => "DB_AMBIGUOUS_PRIMARY_KEY",
            Self::InconsistentPrimaryKey { .. } => "DB_INCONSISTENT_PRIMARY_KEY",
            Self::NullablePrimaryKey { .. } => "DB_NULLABLE_PRIMARY_KEY",
            Self::UnknownColumn { .. } => "DB_UNKNOWN_COLUMN",
            Self::EmptyTable { .. } => "DB_EMPTY_TABLE",
            Self::UnresolvedReference { .. } => "DB_UNRESOLVED_REFERENCE",
            Self::MissingJunctionTable { .. } => "DB_MISSING_JUNCTION_TABLE",
            Self::JunctionColumnCollision { .. } => "DB_JUNCTION_COLUMN_COLLISION",
            Self::UnknownRelationType { .. } => "DB_UNKNOWN_RELATION_TYPE",
            Self::UnknownDialect { .. } => "DB_UNKNOWN_DIALECT",
            Self::UnknownColumnType { .. } => "DB_UNKNOWN_COLUMN_TYPE",
            Self::InvalidDefault { .. } => "DB_INVALID_DEFAULT",
            Self::InvalidEntity { .. } => "DB_INVALID_ENTITY",
        }
    }
}

/// A value did not fit the domain of a column type's codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Expected a {expected} value, got {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Value outside the domain of {type_name}: {message}")]
    OutOfDomain { type_name: String, message: String },

    #[error("Null is not allowed for a non-nullable {type_name}")]
    NullNotAllowed { type_name: String },

    #[error("Non-finite number cannot be stored")]
    NonFinite,

    #[error("Failed to parse {type_name} from '{input}': {message}")]
    Parse {
        type_name: String,
        input: String,
        message: String,
    },
}
