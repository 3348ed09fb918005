//! Dialect selector and dialect hints.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// The four schema-text targets.
///
/// | Dialect | Output |
/// |---------|--------|
/// | `Sql` | Relational DDL (`CREATE TABLE ...`) |
/// | `SeaOrm` | SeaORM migration `Table::create()` builder chain |
/// | `Prisma` | Prisma schema `model` block |
/// | `Document` | Convex-style `defineTable({ ... })` document table |
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Dialect {
    #[default]
    Sql,
    #[value(name = "seaorm")]
    SeaOrm,
    Prisma,
    Document,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [Dialect::Sql, Dialect::SeaOrm, Dialect::Prisma, Dialect::Document];

    pub fn tag(&self) -> &'static str {
        match self {
            Dialect::Sql => "sql",
            Dialect::SeaOrm => "seaorm",
            Dialect::Prisma => "prisma",
            Dialect::Document => "document",
        }
    }

    /// Whether the dialect models the primary key as a table-level clause
    /// rather than a per-column modifier.
    pub fn is_relational(&self) -> bool {
        matches!(self, Dialect::Sql)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Dialect {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sql" | "relational" => Ok(Dialect::Sql),
            "seaorm" | "sea-orm" | "sea_orm" => Ok(Dialect::SeaOrm),
            "prisma" => Ok(Dialect::Prisma),
            "document" | "convex" => Ok(Dialect::Document),
            _ => Err(CompileError::UnknownDialect {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Dialect {
    type Error = CompileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// SQL variant targeted by the relational dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SqlFlavor {
    #[default]
    Postgres,
    #[value(name = "mysql")]
    MySql,
}

/// Hints passed to every emitter alongside the column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialectOptions {
    #[serde(default)]
    pub sql_flavor: SqlFlavor,
}

impl DialectOptions {
    pub fn with_flavor(sql_flavor: SqlFlavor) -> Self {
        Self { sql_flavor }
    }
}
