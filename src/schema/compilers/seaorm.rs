//! SeaORM migration builder compiler.
//!
//! Emits the `Table::create()` statement a SeaORM migration would pass to
//! `manager.create_table(..)`. Column modifiers are rendered as builder calls
//! in the order they were applied; a non-nullable column gets `.not_null()`
//! right after its type.

use super::sql::literal_sql;
use super::{
    ColumnFragment, CoverageWarning, Emission, SchemaCompiler, base_or_fallback, note_fallback,
    orm_column_modifiers,
};
use crate::error::CompileError;
use crate::schema::column_type::{ColumnKind, ColumnType, DefaultGenerator, DefaultValue, Modifier};
use crate::schema::dialect::{Dialect, DialectOptions};
use crate::schema::escape::{quote_double, single_line};
use crate::schema::table::{Column, Generated, Table};
use crate::schema::value::Value;

pub struct SeaOrmCompiler;

const INDENT: &str = "    ";

fn alias(name: &str) -> String {
    format!("Alias::new({})", quote_double(name))
}

fn cust(sql: &str) -> String {
    format!("Expr::cust({})", quote_double(sql))
}

fn default_expr(default: &DefaultValue) -> String {
    match default {
        DefaultValue::Literal(value) => literal_expr(value),
        DefaultValue::Generator(DefaultGenerator::Now) => "Expr::current_timestamp()".to_string(),
        DefaultValue::Generator(DefaultGenerator::RandomUuid) => cust("gen_random_uuid()"),
        DefaultValue::Generator(DefaultGenerator::Expression(expression)) => cust(expression),
    }
}

fn literal_expr(value: &Value) -> String {
    match value {
        Value::String(s) => quote_double(s),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => format!("{:?}", f),
        Value::Boolean(b) => b.to_string(),
        Value::Date(_) | Value::Timestamp(_) | Value::Uuid(_) => {
            // literal_sql gives the single-quoted form; the builder wants a Rust string.
            let sql = literal_sql(value, &DialectOptions::default());
            quote_double(sql.trim_matches('\''))
        }
        Value::Null | Value::Decimal(_) | Value::Json(_) | Value::Array(_) => {
            cust(&literal_sql(value, &DialectOptions::default()))
        }
    }
}

/// `sea_query::ColumnType` variant for an array element.
fn element_type(kind: &ColumnKind) -> Option<String> {
    let variant = match kind {
        ColumnKind::String {
            max_length: Some(n),
        } => format!("ColumnType::String(StringLen::N({}))", n),
        ColumnKind::String { max_length: None } | ColumnKind::Enum { .. } => {
            "ColumnType::Text".to_string()
        }
        ColumnKind::Integer => "ColumnType::Integer".to_string(),
        ColumnKind::BigInt => "ColumnType::BigInteger".to_string(),
        ColumnKind::Float => "ColumnType::Double".to_string(),
        ColumnKind::Decimal { precision, scale } => {
            format!("ColumnType::Decimal(Some(({}, {})))", precision, scale)
        }
        ColumnKind::Boolean => "ColumnType::Boolean".to_string(),
        ColumnKind::Date => "ColumnType::Date".to_string(),
        ColumnKind::Timestamp {
            with_timezone: true,
        } => "ColumnType::TimestampWithTimeZone".to_string(),
        ColumnKind::Timestamp {
            with_timezone: false,
        } => "ColumnType::Timestamp".to_string(),
        ColumnKind::Uuid => "ColumnType::Uuid".to_string(),
        ColumnKind::Json => "ColumnType::JsonBinary".to_string(),
        ColumnKind::Array { items } => format!("ColumnType::Array(RcOrArc::new({}))", element_type(items)?),
        ColumnKind::Custom { .. } => return None,
    };
    Some(variant)
}

impl SeaOrmCompiler {
    /// Builder calls for `modifiers` on top of `base`, in application order.
    fn chain(base: &str, modifiers: &[Modifier]) -> Vec<String> {
        let mut calls = vec![base.to_string()];
        if !modifiers.contains(&Modifier::Nullable) {
            calls.push(".not_null()".to_string());
        }
        for modifier in modifiers {
            match modifier {
                Modifier::Nullable => calls.push(".null()".to_string()),
                Modifier::Unique => calls.push(".unique_key()".to_string()),
                Modifier::PrimaryKey => calls.push(".primary_key()".to_string()),
                Modifier::Default(default) => {
                    calls.push(format!(".default({})", default_expr(default)))
                }
                Modifier::AutoIncrement => calls.push(".auto_increment()".to_string()),
            }
        }
        calls
    }

    fn column_extras(column: &Column, modifiers: &[Modifier]) -> Vec<String> {
        let mut calls = Vec::new();
        match column.generated {
            Some(Generated::Always) => {
                calls.push(".extra(\"GENERATED ALWAYS AS IDENTITY\")".to_string())
            }
            Some(Generated::ByDefault) if !modifiers.contains(&Modifier::AutoIncrement) => {
                calls.push(".auto_increment()".to_string())
            }
            _ => {}
        }
        if let Some(expression) = &column.generated_as {
            calls.push(format!(
                ".extra({})",
                quote_double(&format!("GENERATED ALWAYS AS ({}) STORED", expression))
            ));
        }
        if let Some(comment) = &column.comment {
            calls.push(format!(".comment({})", quote_double(&single_line(comment))));
        }
        calls
    }
}

impl SchemaCompiler for SeaOrmCompiler {
    const DIALECT: Dialect = Dialect::SeaOrm;

    fn base_fragment(kind: &ColumnKind, column: &str, _options: &DialectOptions) -> Option<String> {
        let fragment = match kind {
            ColumnKind::String {
                max_length: Some(n),
            } => format!(".string_len({})", n),
            ColumnKind::String { max_length: None } => ".text()".to_string(),
            ColumnKind::Integer => ".integer()".to_string(),
            ColumnKind::BigInt => ".big_integer()".to_string(),
            ColumnKind::Float => ".double()".to_string(),
            ColumnKind::Decimal { precision, scale } => {
                format!(".decimal_len({}, {})", precision, scale)
            }
            ColumnKind::Boolean => ".boolean()".to_string(),
            ColumnKind::Date => ".date()".to_string(),
            ColumnKind::Timestamp {
                with_timezone: true,
            } => ".timestamp_with_time_zone()".to_string(),
            ColumnKind::Timestamp {
                with_timezone: false,
            } => ".timestamp()".to_string(),
            ColumnKind::Uuid => ".uuid()".to_string(),
            ColumnKind::Json => ".json_binary()".to_string(),
            ColumnKind::Array { items } => format!(".array({})", element_type(items)?),
            ColumnKind::Enum { name, values } => {
                let variants: Vec<String> = values.iter().map(|v| alias(v)).collect();
                format!(
                    ".enumeration({}, [{}])",
                    alias(name.as_deref().unwrap_or(column)),
                    variants.join(", ")
                )
            }
            ColumnKind::Custom { renderings, .. } => renderings.get(&Self::DIALECT)?.clone(),
        };
        Some(fragment)
    }

    fn fallback_fragment(_options: &DialectOptions) -> String {
        ".text()".to_string()
    }

    fn emit_column_type(ty: &ColumnType, column: &str, options: &DialectOptions) -> ColumnFragment {
        let (base, fallback) = base_or_fallback::<Self>(ty.kind(), column, options);
        ColumnFragment {
            text: format!(
                "ColumnDef::new({}){}",
                alias(column),
                Self::chain(&base, ty.modifiers()).concat()
            ),
            fallback,
        }
    }

    fn compile_table(table: &Table, options: &DialectOptions) -> Result<Emission, CompileError> {
        let primary_key = table.resolve_primary_key(Self::DIALECT)?;
        let mut warnings: Vec<CoverageWarning> = Vec::new();
        let mut lines = vec![
            "Table::create()".to_string(),
            format!(".table({})", alias(&table.name)),
            ".if_not_exists()".to_string(),
        ];

        for (name, column) in &table.columns {
            let ty = column.column_type();
            let (base, fallback) = base_or_fallback::<Self>(ty.kind(), name, options);
            if fallback {
                note_fallback::<Self>(&mut warnings, table, name, ty, options);
            }
            let modifiers = orm_column_modifiers(ty, name, &primary_key);
            let mut calls = Self::chain(&base, &modifiers);
            calls.extend(Self::column_extras(column, &modifiers));
            lines.push(format!(
                ".col(ColumnDef::new({}){})",
                alias(name),
                calls.concat()
            ));
        }

        if primary_key.len() > 1 {
            let cols: String = primary_key
                .iter()
                .map(|c| format!(".col({})", alias(c)))
                .collect();
            lines.push(format!(".primary_key(Index::create(){})", cols));
        }
        for group in &table.unique_constraints {
            let cols: String = group.iter().map(|c| format!(".col({})", alias(c))).collect();
            lines.push(format!(
                ".index(Index::create().name({}){}.unique())",
                quote_double(&table.unique_constraint_name(group)),
                cols
            ));
        }
        for check in &table.check_constraints {
            lines.push(format!("// {}", check.name));
            lines.push(format!(".check({})", cust(&check.expression)));
        }
        if let Some(comment) = &table.comment {
            lines.push(format!(".comment({})", quote_double(&single_line(comment))));
        }
        lines.push(".to_owned()".to_string());

        let mut text = lines[0].clone();
        for line in &lines[1..] {
            text.push('\n');
            text.push_str(INDENT);
            text.push_str(line);
        }
        Ok(Emission { text, warnings })
    }

    fn compile_schema_file(tables: &[(&str, &str)], _options: &DialectOptions) -> String {
        let mut out = String::from("use sea_orm_migration::prelude::*;\n\n");
        out.push_str("pub fn create_tables() -> Vec<TableCreateStatement> {\n");
        out.push_str(&format!("{}vec![\n", INDENT));
        for (_, text) in tables {
            let indented: Vec<String> = text
                .lines()
                .map(|line| format!("{}{}{}", INDENT, INDENT, line))
                .collect();
            out.push_str(&indented.join("\n"));
            out.push_str(",\n");
        }
        out.push_str(&format!("{}]\n}}\n", INDENT));
        out
    }
}
