//! Relational DDL compiler.
//!
//! Column clauses are accumulated per column and rendered in canonical
//! order, whatever order the modifiers were applied in:
//!
//! ```text
//! <name> <TYPE> NOT NULL|NULL [UNIQUE] [DEFAULT x] [identity/generated]
//! ```
//!
//! The primary key is always a table-level clause. The SQL flavor
//! (Postgres or MySQL) changes type names, identity syntax, default
//! functions and comment placement.

use chrono::SecondsFormat;

use super::{
    ColumnFragment, CoverageWarning, Emission, SchemaCompiler, base_or_fallback, note_fallback,
};
use crate::error::CompileError;
use crate::schema::column_type::{ColumnKind, ColumnType, DefaultGenerator, DefaultValue, Modifier};
use crate::schema::dialect::{Dialect, DialectOptions, SqlFlavor};
use crate::schema::escape::{quote_sql, single_line};
use crate::schema::table::{Column, Constraint, Generated, Index, IndexType, Table};
use crate::schema::value::Value;

pub struct SqlCompiler;

/// Clause fragments for one column, before canonical ordering.
#[derive(Debug, Clone, Default)]
struct ColumnClauses {
    base: String,
    nullable: bool,
    unique: bool,
    default: Option<String>,
    identity: Option<String>,
    /// `identity` is a stored expression rather than an identity counter.
    computed: bool,
    inline_comment: Option<String>,
}

impl ColumnClauses {
    fn from_type(ty: &ColumnType, column: &str, options: &DialectOptions) -> (Self, bool) {
        let (base, fallback) = base_or_fallback::<SqlCompiler>(ty.kind(), column, options);
        let mut clauses = ColumnClauses {
            base,
            ..Default::default()
        };
        for modifier in ty.modifiers() {
            match modifier {
                Modifier::Nullable => clauses.nullable = true,
                Modifier::Unique => clauses.unique = true,
                // Rendered as the table-level PRIMARY KEY clause.
                Modifier::PrimaryKey => {}
                Modifier::Default(default) => {
                    clauses.default = Some(default_sql(default, options))
                }
                Modifier::AutoIncrement => {
                    clauses.identity = Some(identity_sql(Generated::ByDefault, options))
                }
            }
        }
        (clauses, fallback)
    }

    fn from_column(column: &Column, name: &str, options: &DialectOptions) -> (Self, bool) {
        let (mut clauses, fallback) = Self::from_type(column.column_type(), name, options);
        if let Some(generated) = column.generated {
            clauses.identity = Some(identity_sql(generated, options));
        }
        if let Some(expression) = &column.generated_as {
            clauses.identity = Some(format!("GENERATED ALWAYS AS ({}) STORED", expression));
            clauses.computed = true;
        }
        if options.sql_flavor == SqlFlavor::MySql {
            clauses.inline_comment = column.comment.as_deref().map(single_line);
        }
        (clauses, fallback)
    }

    /// Identity and generated columns take their value from the database, so
    /// they never carry a `DEFAULT`, and identity columns are always
    /// `NOT NULL`.
    fn render(&self, column: &str) -> String {
        let counter = self.identity.is_some() && !self.computed;
        let mut parts = vec![column.to_string(), self.base.clone()];
        parts.push(if self.nullable && !counter { "NULL" } else { "NOT NULL" }.to_string());
        if self.unique {
            parts.push("UNIQUE".to_string());
        }
        match (&self.default, &self.identity) {
            (Some(default), None) => parts.push(format!("DEFAULT {}", default)),
            (Some(default), Some(_)) => {
                tracing::warn!(column, default = %default, "default dropped on generated column")
            }
            (None, _) => {}
        }
        if self.nullable && counter {
            tracing::warn!(column, "identity column rendered NOT NULL");
        }
        if let Some(identity) = &self.identity {
            parts.push(identity.clone());
        }
        if let Some(comment) = &self.inline_comment {
            parts.push(format!("COMMENT {}", quote_sql(comment)));
        }
        parts.join(" ")
    }
}

fn identity_sql(generated: Generated, options: &DialectOptions) -> String {
    match (options.sql_flavor, generated) {
        (SqlFlavor::Postgres, Generated::Always) => "GENERATED ALWAYS AS IDENTITY".to_string(),
        (SqlFlavor::Postgres, Generated::ByDefault) => {
            "GENERATED BY DEFAULT AS IDENTITY".to_string()
        }
        (SqlFlavor::MySql, _) => "AUTO_INCREMENT".to_string(),
    }
}

fn default_sql(default: &DefaultValue, options: &DialectOptions) -> String {
    match default {
        DefaultValue::Literal(value) => literal_sql(value, options),
        DefaultValue::Generator(DefaultGenerator::Now) => "CURRENT_TIMESTAMP".to_string(),
        DefaultValue::Generator(DefaultGenerator::RandomUuid) => match options.sql_flavor {
            SqlFlavor::Postgres => "gen_random_uuid()".to_string(),
            SqlFlavor::MySql => "(UUID())".to_string(),
        },
        DefaultValue::Generator(DefaultGenerator::Expression(expression)) => {
            format!("({})", expression)
        }
    }
}

/// SQL literal for a default value.
pub(crate) fn literal_sql(value: &Value, options: &DialectOptions) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => quote_sql(s),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Boolean(true) => "TRUE".to_string(),
        Value::Boolean(false) => "FALSE".to_string(),
        Value::Date(d) => quote_sql(&d.format("%Y-%m-%d").to_string()),
        Value::Timestamp(t) => quote_sql(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::Uuid(u) => quote_sql(&u.hyphenated().to_string()),
        Value::Json(j) => match options.sql_flavor {
            SqlFlavor::Postgres => format!("{}::jsonb", quote_sql(&j.to_string())),
            SqlFlavor::MySql => format!("({})", quote_sql(&j.to_string())),
        },
        Value::Array(elements) => {
            let items: Vec<String> = elements.iter().map(|e| literal_sql(e, options)).collect();
            match options.sql_flavor {
                SqlFlavor::Postgres => format!("ARRAY[{}]", items.join(", ")),
                SqlFlavor::MySql => format!("(JSON_ARRAY({}))", items.join(", ")),
            }
        }
    }
}

impl SqlCompiler {
    /// Type name for a kind, with the generic fallback. Used for junction
    /// columns, which copy the referenced column's kind.
    pub fn type_sql(kind: &ColumnKind, column: &str, options: &DialectOptions) -> String {
        base_or_fallback::<SqlCompiler>(kind, column, options).0
    }

    /// One column definition line, without indentation or trailing comma.
    ///
    /// Returns the text and whether the generic fallback was used.
    pub fn column_definition(
        name: &str,
        column: &Column,
        options: &DialectOptions,
    ) -> (String, bool) {
        let (clauses, fallback) = ColumnClauses::from_column(column, name, options);
        (clauses.render(name), fallback)
    }

    /// `CREATE [UNIQUE] INDEX` statement.
    ///
    /// MySQL has no partial indexes and no GiST/GIN; those parts are dropped
    /// with a warning.
    pub fn create_index(index: &Index, options: &DialectOptions) -> String {
        let unique = if index.unique { "UNIQUE " } else { "" };
        let columns = index.columns.join(", ");
        match options.sql_flavor {
            SqlFlavor::Postgres => {
                let using = index
                    .index_type
                    .map(|t| format!(" USING {}", t.keyword()))
                    .unwrap_or_default();
                let predicate = index
                    .where_clause
                    .as_ref()
                    .map(|w| format!(" WHERE {}", w))
                    .unwrap_or_default();
                format!(
                    "CREATE {}INDEX {} ON {}{} ({}){};",
                    unique, index.name, index.table_name, using, columns, predicate
                )
            }
            SqlFlavor::MySql => {
                if index.where_clause.is_some() {
                    tracing::warn!(index = %index.name, "MySQL has no partial indexes; predicate dropped");
                }
                let using = match index.index_type {
                    Some(IndexType::Btree) => " USING BTREE",
                    Some(IndexType::Hash) => " USING HASH",
                    Some(other) => {
                        tracing::warn!(index = %index.name, index_type = other.keyword(), "index type not supported by MySQL; dropped");
                        ""
                    }
                    None => "",
                };
                format!(
                    "CREATE {}INDEX {} ON {} ({}){};",
                    unique, index.name, index.table_name, columns, using
                )
            }
        }
    }

    /// `ALTER TABLE ... ADD CONSTRAINT` statement.
    pub fn add_constraint(table: &str, constraint: &Constraint) -> String {
        match constraint {
            Constraint::Unique { name, columns } => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({});",
                table,
                name,
                columns.join(", ")
            ),
            Constraint::Check { name, expression } => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} CHECK ({});",
                table, name, expression
            ),
        }
    }

    pub fn drop_table(table: &str) -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE;", table)
    }

    fn enum_check(column: &str, values: &[String]) -> String {
        let quoted: Vec<String> = values.iter().map(|v| quote_sql(v)).collect();
        format!("TEXT CHECK ({} IN ({}))", column, quoted.join(", "))
    }

    /// Element type inside a Postgres array. Enum elements lose their CHECK.
    fn array_element(kind: &ColumnKind, column: &str, options: &DialectOptions) -> Option<String> {
        match kind {
            ColumnKind::Enum { .. } => Some("TEXT".to_string()),
            other => Self::base_fragment(other, column, options),
        }
    }
}

impl SchemaCompiler for SqlCompiler {
    const DIALECT: Dialect = Dialect::Sql;

    fn base_fragment(kind: &ColumnKind, column: &str, options: &DialectOptions) -> Option<String> {
        let pg = options.sql_flavor == SqlFlavor::Postgres;
        let fragment = match kind {
            ColumnKind::String {
                max_length: Some(n),
            } => format!("VARCHAR({})", n),
            ColumnKind::String { max_length: None } => "TEXT".to_string(),
            ColumnKind::Integer if pg => "INTEGER".to_string(),
            ColumnKind::Integer => "INT".to_string(),
            ColumnKind::BigInt => "BIGINT".to_string(),
            ColumnKind::Float if pg => "DOUBLE PRECISION".to_string(),
            ColumnKind::Float => "DOUBLE".to_string(),
            ColumnKind::Decimal { precision, scale } if pg => {
                format!("NUMERIC({}, {})", precision, scale)
            }
            ColumnKind::Decimal { precision, scale } => {
                format!("DECIMAL({}, {})", precision, scale)
            }
            ColumnKind::Boolean => "BOOLEAN".to_string(),
            ColumnKind::Date => "DATE".to_string(),
            ColumnKind::Timestamp { with_timezone } => match (pg, with_timezone) {
                (true, true) => "TIMESTAMPTZ".to_string(),
                (true, false) => "TIMESTAMP".to_string(),
                (false, _) => "DATETIME".to_string(),
            },
            ColumnKind::Uuid if pg => "UUID".to_string(),
            ColumnKind::Uuid => "CHAR(36)".to_string(),
            ColumnKind::Json if pg => "JSONB".to_string(),
            ColumnKind::Json => "JSON".to_string(),
            ColumnKind::Array { items } if pg => {
                format!("{}[]", Self::array_element(items, column, options)?)
            }
            ColumnKind::Array { .. } => return None,
            ColumnKind::Enum { values, .. } if pg => Self::enum_check(column, values),
            ColumnKind::Enum { values, .. } => {
                let quoted: Vec<String> = values.iter().map(|v| quote_sql(v)).collect();
                format!("ENUM({})", quoted.join(", "))
            }
            ColumnKind::Custom { renderings, .. } => renderings.get(&Self::DIALECT)?.clone(),
        };
        Some(fragment)
    }

    fn fallback_fragment(_options: &DialectOptions) -> String {
        "TEXT".to_string()
    }

    fn emit_column_type(ty: &ColumnType, column: &str, options: &DialectOptions) -> ColumnFragment {
        let (clauses, fallback) = ColumnClauses::from_type(ty, column, options);
        ColumnFragment {
            text: clauses.render(column),
            fallback,
        }
    }

    fn compile_table(table: &Table, options: &DialectOptions) -> Result<Emission, CompileError> {
        let primary_key = table.resolve_primary_key(Self::DIALECT)?;
        let mut warnings: Vec<CoverageWarning> = Vec::new();
        let mut lines: Vec<String> = Vec::new();

        for (name, column) in &table.columns {
            let (definition, fallback) = Self::column_definition(name, column, options);
            if fallback {
                note_fallback::<Self>(&mut warnings, table, name, column.column_type(), options);
            }
            lines.push(definition);
        }

        lines.push(format!("PRIMARY KEY ({})", primary_key.join(", ")));
        for group in &table.unique_constraints {
            lines.push(format!(
                "CONSTRAINT {} UNIQUE ({})",
                table.unique_constraint_name(group),
                group.join(", ")
            ));
        }
        for check in &table.check_constraints {
            lines.push(format!(
                "CONSTRAINT {} CHECK ({})",
                check.name, check.expression
            ));
        }

        let body = lines
            .iter()
            .map(|line| format!("  {}", line))
            .collect::<Vec<_>>()
            .join(",\n");

        let mut text = match (options.sql_flavor, &table.comment) {
            (SqlFlavor::MySql, Some(comment)) => format!(
                "CREATE TABLE {} (\n{}\n) COMMENT = {};",
                table.name,
                body,
                quote_sql(&single_line(comment))
            ),
            _ => format!("CREATE TABLE {} (\n{}\n);", table.name, body),
        };

        if options.sql_flavor == SqlFlavor::Postgres {
            if let Some(comment) = &table.comment {
                text.push_str(&format!(
                    "\nCOMMENT ON TABLE {} IS {};",
                    table.name,
                    quote_sql(&single_line(comment))
                ));
            }
            for (name, column) in &table.columns {
                if let Some(comment) = &column.comment {
                    text.push_str(&format!(
                        "\nCOMMENT ON COLUMN {}.{} IS {};",
                        table.name,
                        name,
                        quote_sql(&single_line(comment))
                    ));
                }
            }
        }

        Ok(Emission { text, warnings })
    }

    fn compile_schema_file(tables: &[(&str, &str)], _options: &DialectOptions) -> String {
        let mut out = String::new();
        for (_, text) in tables {
            out.push_str(text);
            out.push_str("\n\n");
        }
        out
    }
}
