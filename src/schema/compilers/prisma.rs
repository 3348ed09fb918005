//! Prisma schema compiler.
//!
//! A table becomes a `model` block; enum kinds become `enum` blocks emitted
//! before the model. Modifiers render as field attributes in application
//! order, except nullability which is the `?` suffix on the type.

use std::fmt::Write as _;

use super::{
    ColumnFragment, CoverageWarning, Emission, SchemaCompiler, base_or_fallback, note_fallback,
    orm_column_modifiers,
};
use crate::error::CompileError;
use crate::schema::column_type::{ColumnKind, ColumnType, DefaultGenerator, DefaultValue, Modifier};
use crate::schema::dialect::{Dialect, DialectOptions, SqlFlavor};
use crate::schema::escape::{quote_double, single_line};
use crate::schema::table::{Column, Table};
use crate::schema::value::Value;

pub struct PrismaCompiler;

/// `status_kind` -> `StatusKind`
fn pascal_case(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn enum_type_name(name: Option<&str>, column: &str) -> String {
    pascal_case(name.unwrap_or(column))
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "dbgenerated(\"NULL\")".to_string(),
        Value::String(s) => quote_double(s),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Date(d) => quote_double(&format!("{}T00:00:00Z", d.format("%Y-%m-%d"))),
        Value::Timestamp(t) => quote_double(&t.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)),
        Value::Uuid(u) => quote_double(&u.hyphenated().to_string()),
        Value::Json(j) => quote_double(&j.to_string()),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", rendered.join(", "))
        }
    }
}

fn default_attribute(default: &DefaultValue, kind: &ColumnKind) -> String {
    let inner = match (default, kind) {
        // Enum defaults name the variant, unquoted.
        (DefaultValue::Literal(Value::String(s)), ColumnKind::Enum { .. }) => s.clone(),
        (DefaultValue::Literal(value), _) => literal(value),
        (DefaultValue::Generator(DefaultGenerator::Now), _) => "now()".to_string(),
        (DefaultValue::Generator(DefaultGenerator::RandomUuid), _) => "uuid()".to_string(),
        (DefaultValue::Generator(DefaultGenerator::Expression(e)), _) => {
            format!("dbgenerated({})", quote_double(e))
        }
    };
    format!("@default({})", inner)
}

impl PrismaCompiler {
    /// Field type and attributes for `modifiers` on top of `base`.
    fn field(base: &str, kind: &ColumnKind, modifiers: &[Modifier]) -> String {
        let (type_token, native) = match base.split_once(' ') {
            Some((token, rest)) => (token.to_string(), Some(rest.to_string())),
            None => (base.to_string(), None),
        };
        let mut parts = vec![if modifiers.contains(&Modifier::Nullable) {
            format!("{}?", type_token)
        } else {
            type_token
        }];
        parts.extend(native);
        for modifier in modifiers {
            match modifier {
                Modifier::Nullable => {}
                Modifier::Unique => parts.push("@unique".to_string()),
                Modifier::PrimaryKey => parts.push("@id".to_string()),
                Modifier::Default(default) => parts.push(default_attribute(default, kind)),
                Modifier::AutoIncrement => parts.push("@default(autoincrement())".to_string()),
            }
        }
        parts.join(" ")
    }

    fn enum_block(name: &str, values: &[String]) -> String {
        let mut block = format!("enum {} {{\n", name);
        for value in values {
            let _ = writeln!(block, "  {}", value);
        }
        block.push('}');
        block
    }

    fn column_extras(column: &Column, modifiers: &[Modifier]) -> Vec<String> {
        let mut extras = Vec::new();
        if column.generated.is_some()
            && !modifiers.contains(&Modifier::AutoIncrement)
            && !modifiers.iter().any(|m| matches!(m, Modifier::Default(_)))
        {
            extras.push("@default(autoincrement())".to_string());
        }
        if let Some(expression) = &column.generated_as {
            extras.push(format!("// GENERATED ALWAYS AS ({})", expression));
        }
        extras
    }

    fn provider(options: &DialectOptions) -> &'static str {
        match options.sql_flavor {
            SqlFlavor::Postgres => "postgresql",
            SqlFlavor::MySql => "mysql",
        }
    }
}

/// Split one compiled table into its leading enum blocks and the model.
fn split_enum_blocks(text: &str) -> (Vec<&str>, &str) {
    let mut blocks = Vec::new();
    let mut rest = text;
    while rest.starts_with("enum ") {
        match rest.find("\n}\n\n") {
            Some(end) => {
                blocks.push(&rest[..end + 2]);
                rest = &rest[end + 4..];
            }
            None => break,
        }
    }
    (blocks, rest)
}

impl SchemaCompiler for PrismaCompiler {
    const DIALECT: Dialect = Dialect::Prisma;

    fn base_fragment(kind: &ColumnKind, column: &str, options: &DialectOptions) -> Option<String> {
        let pg = options.sql_flavor == SqlFlavor::Postgres;
        let fragment = match kind {
            ColumnKind::String {
                max_length: Some(n),
            } => format!("String @db.VarChar({})", n),
            ColumnKind::String { max_length: None } => "String".to_string(),
            ColumnKind::Integer => "Int".to_string(),
            ColumnKind::BigInt => "BigInt".to_string(),
            ColumnKind::Float => "Float".to_string(),
            ColumnKind::Decimal { precision, scale } => {
                format!("Decimal @db.Decimal({}, {})", precision, scale)
            }
            ColumnKind::Boolean => "Boolean".to_string(),
            ColumnKind::Date => "DateTime @db.Date".to_string(),
            ColumnKind::Timestamp {
                with_timezone: true,
            } if pg => "DateTime @db.Timestamptz".to_string(),
            ColumnKind::Timestamp { .. } => "DateTime".to_string(),
            ColumnKind::Uuid if pg => "String @db.Uuid".to_string(),
            ColumnKind::Uuid => "String @db.Char(36)".to_string(),
            ColumnKind::Json => "Json".to_string(),
            // Scalar lists exist on Postgres only.
            ColumnKind::Array { items } if pg => match items.as_ref() {
                ColumnKind::Array { .. } | ColumnKind::Custom { .. } => return None,
                ColumnKind::Enum { name, .. } => {
                    format!("{}[]", enum_type_name(name.as_deref(), column))
                }
                element => {
                    let base = Self::base_fragment(element, column, options)?;
                    let token = base.split(' ').next().unwrap_or("String");
                    format!("{}[]", token)
                }
            },
            ColumnKind::Array { .. } => return None,
            ColumnKind::Enum { name, .. } => enum_type_name(name.as_deref(), column),
            ColumnKind::Custom { renderings, .. } => renderings.get(&Self::DIALECT)?.clone(),
        };
        Some(fragment)
    }

    fn fallback_fragment(_options: &DialectOptions) -> String {
        "String".to_string()
    }

    fn emit_column_type(ty: &ColumnType, column: &str, options: &DialectOptions) -> ColumnFragment {
        let (base, fallback) = base_or_fallback::<Self>(ty.kind(), column, options);
        ColumnFragment {
            text: format!("{} {}", column, Self::field(&base, ty.kind(), ty.modifiers())),
            fallback,
        }
    }

    fn compile_table(table: &Table, options: &DialectOptions) -> Result<Emission, CompileError> {
        let primary_key = table.resolve_primary_key(Self::DIALECT)?;
        let mut warnings: Vec<CoverageWarning> = Vec::new();
        let mut enums: Vec<String> = Vec::new();
        let mut fields: Vec<(String, String, Option<String>)> = Vec::new();

        for (name, column) in &table.columns {
            let ty = column.column_type();
            let (base, fallback) = base_or_fallback::<Self>(ty.kind(), name, options);
            if fallback {
                note_fallback::<Self>(&mut warnings, table, name, ty, options);
            }
            let enum_kind = match ty.kind() {
                ColumnKind::Enum { name: enum_name, values } => Some((enum_name, values)),
                ColumnKind::Array { items } => match items.as_ref() {
                    ColumnKind::Enum { name: enum_name, values } if !fallback => {
                        Some((enum_name, values))
                    }
                    _ => None,
                },
                _ => None,
            };
            if let Some((enum_name, values)) = enum_kind {
                let block = Self::enum_block(&enum_type_name(enum_name.as_deref(), name), values);
                if !enums.contains(&block) {
                    enums.push(block);
                }
            }

            let modifiers = orm_column_modifiers(ty, name, &primary_key);
            let mut field = Self::field(&base, ty.kind(), &modifiers);
            for extra in Self::column_extras(column, &modifiers) {
                field.push(' ');
                field.push_str(&extra);
            }
            let doc = column.comment.as_deref().map(single_line);
            fields.push((name.clone(), field, doc));
        }

        let width = fields.iter().map(|(n, _, _)| n.len()).max().unwrap_or(0);
        let mut model = format!("model {} {{\n", table.name);
        for (name, field, doc) in &fields {
            if let Some(doc) = doc {
                let _ = writeln!(model, "  /// {}", doc);
            }
            let _ = writeln!(model, "  {:<width$} {}", name, field, width = width);
        }

        let mut block_attributes: Vec<String> = Vec::new();
        if primary_key.len() > 1 {
            block_attributes.push(format!("@@id([{}])", primary_key.join(", ")));
        }
        for group in &table.unique_constraints {
            block_attributes.push(format!(
                "@@unique([{}], map: {})",
                group.join(", "),
                quote_double(&table.unique_constraint_name(group))
            ));
        }
        // Prisma has no check constraints.
        for check in &table.check_constraints {
            block_attributes.push(format!("// CHECK {}: ({})", check.name, check.expression));
        }
        if let Some(comment) = &table.comment {
            block_attributes.push(format!("// {}", single_line(comment)));
        }
        if !block_attributes.is_empty() {
            model.push('\n');
            for attribute in &block_attributes {
                let _ = writeln!(model, "  {}", attribute);
            }
        }
        model.push('}');

        enums.push(model);
        Ok(Emission {
            text: enums.join("\n\n"),
            warnings,
        })
    }

    fn compile_schema_file(tables: &[(&str, &str)], options: &DialectOptions) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "datasource db {{\n  provider = {}\n  url      = env(\"DATABASE_URL\")\n}}\n",
            quote_double(Self::provider(options))
        );
        out.push_str("generator client {\n  provider = \"prisma-client-js\"\n}\n");

        // Models may share an enum; the file declares each enum once, ahead
        // of every model.
        let mut enums: Vec<&str> = Vec::new();
        let mut models: Vec<&str> = Vec::new();
        for (table, text) in tables {
            let (blocks, model) = split_enum_blocks(text);
            for block in blocks {
                let header = block.lines().next().unwrap_or(block);
                match enums.iter().find(|e| e.lines().next() == Some(header)) {
                    Some(existing) if *existing != block => tracing::warn!(
                        %table,
                        enum_header = header,
                        "conflicting enum definition; keeping the first"
                    ),
                    Some(_) => {}
                    None => enums.push(block),
                }
            }
            models.push(model);
        }
        for block in enums.iter().chain(models.iter()) {
            out.push('\n');
            out.push_str(block);
            out.push('\n');
        }
        out
    }
}
