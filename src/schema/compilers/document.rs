//! Document-store (Convex-style) compiler.
//!
//! Tables become `defineTable({ ... })` validators. Nullable types are
//! wrapped in `v.optional(..)`; the other modifiers have no validator
//! equivalent and are kept as trailing annotations. Unique columns and
//! unique constraints also get an index.

use std::fmt::Write as _;

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

pub struct DocumentCompiler;

/// A validator expression and its annotations.
struct Field {
    validator: String,
    annotations: Vec<String>,
}

impl Field {
    fn trailing_comment(&self) -> String {
        if self.annotations.is_empty() {
            String::new()
        } else {
            format!(" // {}", self.annotations.join(", "))
        }
    }

    fn render(&self) -> String {
        format!("{}{}", self.validator, self.trailing_comment())
    }
}

fn default_annotation(default: &DefaultValue) -> String {
    let rendered = match default {
        DefaultValue::Generator(DefaultGenerator::Now) => "now".to_string(),
        DefaultValue::Generator(DefaultGenerator::RandomUuid) => "random uuid".to_string(),
        DefaultValue::Generator(DefaultGenerator::Expression(e)) => e.clone(),
        DefaultValue::Literal(value) => literal(value),
    };
    format!("default: {}", rendered)
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => quote_double(s),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Decimal(d) => quote_double(&d.to_string()),
        Value::Boolean(b) => b.to_string(),
        Value::Date(d) => quote_double(&d.format("%Y-%m-%d").to_string()),
        // Timestamps are stored as epoch milliseconds.
        Value::Timestamp(t) => t.timestamp_millis().to_string(),
        Value::Uuid(u) => quote_double(&u.hyphenated().to_string()),
        Value::Json(j) => j.to_string(),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", rendered.join(", "))
        }
    }
}

impl DocumentCompiler {
    fn field(base: &str, modifiers: &[Modifier]) -> Field {
        let mut validator = base.to_string();
        let mut annotations = Vec::new();
        for modifier in modifiers {
            match modifier {
                Modifier::Nullable => validator = format!("v.optional({})", validator),
                Modifier::Unique => annotations.push("unique".to_string()),
                Modifier::PrimaryKey => annotations.push("primary key".to_string()),
                Modifier::Default(default) => annotations.push(default_annotation(default)),
                Modifier::AutoIncrement => annotations.push("auto increment".to_string()),
            }
        }
        Field {
            validator,
            annotations,
        }
    }

    fn column_annotations(column: &Column) -> Vec<String> {
        let mut annotations = Vec::new();
        match column.generated {
            Some(Generated::Always) => annotations.push("generated always".to_string()),
            Some(Generated::ByDefault) => annotations.push("generated by default".to_string()),
            None => {}
        }
        if let Some(expression) = &column.generated_as {
            annotations.push(format!("generated: {}", expression));
        }
        if let Some(comment) = &column.comment {
            annotations.push(single_line(comment));
        }
        annotations
    }

    fn index_line(name: &str, columns: &[String]) -> String {
        let fields: Vec<String> = columns.iter().map(|c| quote_double(c)).collect();
        format!(".index({}, [{}])", quote_double(name), fields.join(", "))
    }
}

impl SchemaCompiler for DocumentCompiler {
    const DIALECT: Dialect = Dialect::Document;

    fn base_fragment(kind: &ColumnKind, column: &str, options: &DialectOptions) -> Option<String> {
        let fragment = match kind {
            ColumnKind::String { .. }
            | ColumnKind::Decimal { .. }
            | ColumnKind::Date
            | ColumnKind::Uuid => "v.string()".to_string(),
            ColumnKind::Integer | ColumnKind::Float | ColumnKind::Timestamp { .. } => {
                "v.number()".to_string()
            }
            ColumnKind::BigInt => "v.int64()".to_string(),
            ColumnKind::Boolean => "v.boolean()".to_string(),
            ColumnKind::Json => "v.any()".to_string(),
            ColumnKind::Array { items } => {
                format!("v.array({})", Self::base_fragment(items, column, options)?)
            }
            ColumnKind::Enum { values, .. } => {
                let literals: Vec<String> = values
                    .iter()
                    .map(|v| format!("v.literal({})", quote_double(v)))
                    .collect();
                match literals.as_slice() {
                    [single] => single.clone(),
                    _ => format!("v.union({})", literals.join(", ")),
                }
            }
            ColumnKind::Custom { renderings, .. } => renderings.get(&Self::DIALECT)?.clone(),
        };
        Some(fragment)
    }

    fn fallback_fragment(_options: &DialectOptions) -> String {
        "v.any()".to_string()
    }

    fn emit_column_type(ty: &ColumnType, column: &str, options: &DialectOptions) -> ColumnFragment {
        let (base, fallback) = base_or_fallback::<Self>(ty.kind(), column, options);
        ColumnFragment {
            text: format!("{}: {}", column, Self::field(&base, ty.modifiers()).render()),
            fallback,
        }
    }

    fn compile_table(table: &Table, options: &DialectOptions) -> Result<Emission, CompileError> {
        let primary_key = table.resolve_primary_key(Self::DIALECT)?;
        let mut warnings: Vec<CoverageWarning> = Vec::new();
        let mut text = format!("export const {} = defineTable({{\n", table.name);
        let mut indexes: Vec<String> = Vec::new();

        for (name, column) in &table.columns {
            let ty = column.column_type();
            let (base, fallback) = base_or_fallback::<Self>(ty.kind(), name, options);
            if fallback {
                note_fallback::<Self>(&mut warnings, table, name, ty, options);
            }
            let modifiers = orm_column_modifiers(ty, name, &primary_key);
            let mut field = Self::field(&base, &modifiers);
            field.annotations.extend(Self::column_annotations(column));
            let _ = writeln!(text, "  {}: {},{}", name, field.validator, field.trailing_comment());
            if ty.is_unique() {
                indexes.push(Self::index_line(&format!("by_{}", name), std::slice::from_ref(name)));
            }
        }
        text.push_str("})");

        if primary_key.len() > 1 {
            indexes.push(Self::index_line(
                &format!("by_{}", primary_key.join("_")),
                &primary_key,
            ));
        }
        for group in &table.unique_constraints {
            indexes.push(Self::index_line(&table.unique_constraint_name(group), group));
        }
        for index in &indexes {
            text.push_str("\n  ");
            text.push_str(index);
        }
        text.push(';');

        for check in &table.check_constraints {
            let _ = write!(text, "\n// check {}: {}", check.name, check.expression);
        }
        if let Some(comment) = &table.comment {
            let _ = write!(text, "\n// {}", single_line(comment));
        }

        Ok(Emission { text, warnings })
    }

    fn compile_schema_file(tables: &[(&str, &str)], _options: &DialectOptions) -> String {
        let mut out = String::from(
            "import { defineSchema, defineTable } from \"convex/server\";\nimport { v } from \"convex/values\";\n",
        );
        for (_, text) in tables {
            out.push('\n');
            out.push_str(text);
            out.push('\n');
        }
        let names: Vec<&str> = tables.iter().map(|(name, _)| *name).collect();
        let _ = writeln!(out, "\nexport default defineSchema({{ {} }});", names.join(", "));
        out
    }
}
