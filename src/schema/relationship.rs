//! Relationship definitions between entities.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::table::{Column, ColumnSpec, Table, build_columns};
use crate::error::CompileError;

/// Cardinality of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum RelationType {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationType {
    pub fn tag(&self) -> &'static str {
        match self {
            RelationType::OneToOne => "one-to-one",
            RelationType::OneToMany => "one-to-many",
            RelationType::ManyToOne => "many-to-one",
            RelationType::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for RelationType {
    type Err = CompileError;

    /// Accepts kebab, snake and camel spellings (`many-to-one`,
    /// `many_to_one`, `manyToOne`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "onetoone" => Ok(RelationType::OneToOne),
            "onetomany" => Ok(RelationType::OneToMany),
            "manytoone" => Ok(RelationType::ManyToOne),
            "manytomany" => Ok(RelationType::ManyToMany),
            _ => Err(CompileError::UnknownRelationType {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for RelationType {
    type Error = CompileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Action taken on dependent rows when the referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferentialAction {
    Cascade,
    #[serde(alias = "set_null")]
    SetNull,
    Restrict,
    #[default]
    #[serde(alias = "no_action")]
    NoAction,
}

impl ReferentialAction {
    pub fn sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

/// Either side of a relationship: a table name, or the full table when the
/// caller has it (which lets the compiler check columns and copy types).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Name(String),
    Table(Box<Table>),
}

impl EntityRef {
    pub fn table_name(&self) -> &str {
        match self {
            EntityRef::Name(name) => name,
            EntityRef::Table(table) => &table.name,
        }
    }

    pub fn table(&self) -> Option<&Table> {
        match self {
            EntityRef::Name(_) => None,
            EntityRef::Table(table) => Some(table.as_ref()),
        }
    }
}

impl From<&str> for EntityRef {
    fn from(name: &str) -> Self {
        EntityRef::Name(name.to_string())
    }
}

impl From<Table> for EntityRef {
    fn from(table: Table) -> Self {
        EntityRef::Table(Box::new(table))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub local_column: String,
    pub foreign_column: String,
    #[serde(default)]
    pub on_delete: ReferentialAction,
    #[serde(default)]
    pub on_update: ReferentialAction,
    #[serde(default)]
    pub indexed: bool,
}

impl ForeignKey {
    pub fn new(local_column: impl Into<String>, foreign_column: impl Into<String>) -> Self {
        Self {
            local_column: local_column.into(),
            foreign_column: foreign_column.into(),
            on_delete: ReferentialAction::default(),
            on_update: ReferentialAction::default(),
            indexed: false,
        }
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}

/// Junction table realising a many-to-many relationship.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "JunctionSpec")]
pub struct JunctionTable {
    pub name: String,
    /// Column referencing the local table
    pub local_column: String,
    /// Column referencing the foreign table
    pub foreign_column: String,
    pub extra_columns: IndexMap<String, Column>,
}

#[derive(Debug, Clone, Deserialize)]
struct JunctionSpec {
    name: String,
    local_column: String,
    foreign_column: String,
    #[serde(default)]
    extra_columns: IndexMap<String, ColumnSpec>,
}

impl TryFrom<JunctionSpec> for JunctionTable {
    type Error = CompileError;

    fn try_from(spec: JunctionSpec) -> Result<Self, Self::Error> {
        Ok(JunctionTable {
            name: spec.name,
            local_column: spec.local_column,
            foreign_column: spec.foreign_column,
            extra_columns: build_columns(spec.extra_columns)?,
        })
    }
}

impl JunctionTable {
    pub fn new(
        name: impl Into<String>,
        local_column: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            local_column: local_column.into(),
            foreign_column: foreign_column.into(),
            extra_columns: IndexMap::new(),
        }
    }

    pub fn with_extra_column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.extra_columns.insert(name.into(), column);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Relationship {
    pub name: String,
    pub relation_type: RelationType,
    pub local: EntityRef,
    pub foreign: EntityRef,
    pub foreign_key: ForeignKey,
    #[serde(default)]
    pub junction: Option<JunctionTable>,
}

impl Relationship {
    pub fn new(
        name: impl Into<String>,
        relation_type: RelationType,
        local: impl Into<EntityRef>,
        foreign: impl Into<EntityRef>,
        foreign_key: ForeignKey,
    ) -> Self {
        Self {
            name: name.into(),
            relation_type,
            local: local.into(),
            foreign: foreign.into(),
            foreign_key,
            junction: None,
        }
    }

    pub fn with_junction(mut self, junction: JunctionTable) -> Self {
        self.junction = Some(junction);
        self
    }
}
