//! Column type registry and modifier builder.
//!
//! A [`ColumnType`] is a shared base [`ColumnKind`] plus an ordered list of
//! [`Modifier`]s. Every `with_*` call returns a new value; the base kind sits
//! behind an `Arc` so one kind can back many columns across many entities.
//!
//! # Type Mapping
//!
//! | Kind | SQL (Postgres / MySQL) | SeaORM | Prisma | Document |
//! |------|------------------------|--------|--------|----------|
//! | String(n) | VARCHAR(n) | `.string_len(n)` | `String @db.VarChar(n)` | `v.string()` |
//! | String | TEXT | `.text()` | `String` | `v.string()` |
//! | Integer | INTEGER / INT | `.integer()` | `Int` | `v.number()` |
//! | BigInt | BIGINT | `.big_integer()` | `BigInt` | `v.int64()` |
//! | Float | DOUBLE PRECISION / DOUBLE | `.double()` | `Float` | `v.number()` |
//! | Decimal(p,s) | NUMERIC(p,s) / DECIMAL(p,s) | `.decimal_len(p, s)` | `Decimal @db.Decimal(p, s)` | `v.string()` |
//! | Boolean | BOOLEAN | `.boolean()` | `Boolean` | `v.boolean()` |
//! | Date | DATE | `.date()` | `DateTime @db.Date` | `v.string()` |
//! | Timestamp | TIMESTAMPTZ / DATETIME | `.timestamp_with_time_zone()` | `DateTime` | `v.number()` |
//! | Uuid | UUID / CHAR(36) | `.uuid()` | `String @db.Uuid` | `v.string()` |
//! | Json | JSONB / JSON | `.json_binary()` | `Json` | `v.any()` |
//! | Array(T) | T[] / (none) | `.array(..)` | `T[]` | `v.array(..)` |
//! | Enum | TEXT CHECK / ENUM(..) | `.enumeration(..)` | enum block | `v.union(v.literal(..))` |
//! | Custom | per-dialect rendering or fallback | | | |

use std::collections::BTreeMap;
use std::mem;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dialect::Dialect;
use super::value::{Value, json_type_name};
use crate::error::{CodecError, CompileError};

/// Base column kind, independent of any modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnKind {
    /// Text, bounded when `max_length` is set
    String {
        #[serde(default)]
        max_length: Option<u32>,
    },
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    #[serde(alias = "bigint")]
    BigInt,
    /// Double precision float
    Float,
    /// Fixed-point number
    Decimal {
        #[serde(default = "default_precision")]
        precision: u32,
        #[serde(default = "default_scale")]
        scale: u32,
    },
    Boolean,
    Date,
    Timestamp {
        #[serde(default = "default_true")]
        with_timezone: bool,
    },
    Uuid,
    Json,
    Array {
        items: Box<ColumnKind>,
    },
    /// Closed set of string values. `name` is used by dialects that declare
    /// the enum as a named type.
    Enum {
        #[serde(default)]
        name: Option<String>,
        values: Vec<String>,
    },
    /// Caller-defined type with explicit per-dialect renderings.
    Custom {
        name: String,
        #[serde(default)]
        renderings: BTreeMap<Dialect, String>,
    },
}

fn default_precision() -> u32 {
    18
}

fn default_scale() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

impl ColumnKind {
    /// Look up a kind by its type name, the way schema authors spell it.
    ///
    /// `params` carries numeric type parameters: the length for strings and
    /// the precision/scale for decimals. Array, enum and custom kinds have
    /// structured parameters and are built with their constructors instead.
    pub fn from_type_name(name: &str, params: &[u32]) -> Result<Self, CompileError> {
        let kind = match name.trim().to_ascii_lowercase().as_str() {
            "string" | "varchar" => ColumnKind::String {
                max_length: params.first().copied(),
            },
            "text" => ColumnKind::String { max_length: None },
            "int" | "integer" => ColumnKind::Integer,
            "bigint" | "int64" => ColumnKind::BigInt,
            "float" | "double" | "number" => ColumnKind::Float,
            "decimal" | "numeric" => ColumnKind::Decimal {
                precision: params.first().copied().unwrap_or_else(default_precision),
                scale: params.get(1).copied().unwrap_or_else(default_scale),
            },
            "bool" | "boolean" => ColumnKind::Boolean,
            "date" => ColumnKind::Date,
            "timestamp" | "datetime" => ColumnKind::Timestamp {
                with_timezone: false,
            },
            "timestamptz" => ColumnKind::Timestamp {
                with_timezone: true,
            },
            "uuid" => ColumnKind::Uuid,
            "json" | "jsonb" => ColumnKind::Json,
            _ => {
                return Err(CompileError::UnknownColumnType {
                    value: name.to_string(),
                });
            }
        };
        Ok(kind)
    }

    /// The string tag of this kind.
    pub fn type_name(&self) -> String {
        match self {
            ColumnKind::String { max_length: Some(_) } => "varchar".to_string(),
            ColumnKind::String { max_length: None } => "text".to_string(),
            ColumnKind::Integer => "integer".to_string(),
            ColumnKind::BigInt => "bigint".to_string(),
            ColumnKind::Float => "float".to_string(),
            ColumnKind::Decimal { .. } => "decimal".to_string(),
            ColumnKind::Boolean => "boolean".to_string(),
            ColumnKind::Date => "date".to_string(),
            ColumnKind::Timestamp { .. } => "timestamp".to_string(),
            ColumnKind::Uuid => "uuid".to_string(),
            ColumnKind::Json => "json".to_string(),
            ColumnKind::Array { .. } => "array".to_string(),
            ColumnKind::Enum { .. } => "enum".to_string(),
            ColumnKind::Custom { name, .. } => name.clone(),
        }
    }

    /// Ordered type parameters (length, precision/scale, element type, values).
    pub fn type_params(&self) -> Vec<String> {
        match self {
            ColumnKind::String { max_length: Some(n) } => vec![n.to_string()],
            ColumnKind::Decimal { precision, scale } => {
                vec![precision.to_string(), scale.to_string()]
            }
            ColumnKind::Timestamp { with_timezone } => {
                if *with_timezone {
                    vec!["tz".to_string()]
                } else {
                    Vec::new()
                }
            }
            ColumnKind::Array { items } => vec![items.type_name()],
            ColumnKind::Enum { values, .. } => values.clone(),
            _ => Vec::new(),
        }
    }

    /// Check that `value` is in the domain this kind's codec accepts.
    ///
    /// Null is never in a kind's domain; nullability is a modifier and is
    /// handled by [`ColumnType::check`]. A JSON null counts as null, so
    /// `Value::Json(Null)` is rejected too; nulls nested inside a document
    /// are fine.
    pub fn check(&self, value: &Value) -> Result<(), CodecError> {
        match (self, value) {
            (_, Value::Null) | (_, Value::Json(serde_json::Value::Null)) => {
                Err(CodecError::NullNotAllowed {
                    type_name: self.type_name(),
                })
            }
            (ColumnKind::String { max_length }, Value::String(s)) => match max_length {
                Some(max) if s.chars().count() > *max as usize => Err(CodecError::OutOfDomain {
                    type_name: self.type_name(),
                    message: format!("length {} exceeds {}", s.chars().count(), max),
                }),
                _ => Ok(()),
            },
            (ColumnKind::Integer, Value::Integer(i)) => {
                if i32::try_from(*i).is_ok() {
                    Ok(())
                } else {
                    Err(CodecError::OutOfDomain {
                        type_name: self.type_name(),
                        message: format!("{} does not fit in 32 bits", i),
                    })
                }
            }
            (ColumnKind::BigInt, Value::Integer(_)) => Ok(()),
            (ColumnKind::Float, Value::Float(f)) => {
                if f.is_finite() {
                    Ok(())
                } else {
                    Err(CodecError::NonFinite)
                }
            }
            (ColumnKind::Decimal { precision, scale }, Value::Decimal(d)) => {
                check_decimal(d, *precision, *scale)
            }
            (ColumnKind::Boolean, Value::Boolean(_)) => Ok(()),
            (ColumnKind::Date, Value::Date(d)) => check_year(self, d.year()),
            (ColumnKind::Timestamp { .. }, Value::Timestamp(t)) => check_year(self, t.year()),
            (ColumnKind::Uuid, Value::Uuid(_)) => Ok(()),
            (ColumnKind::Json, Value::Json(_)) => Ok(()),
            (ColumnKind::Array { items }, Value::Array(elements)) => {
                elements.iter().try_for_each(|e| items.check(e))
            }
            (ColumnKind::Enum { values, .. }, Value::String(s)) => {
                if values.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(CodecError::OutOfDomain {
                        type_name: self.type_name(),
                        message: format!("'{}' is not one of {}", s, values.join(", ")),
                    })
                }
            }
            (ColumnKind::Custom { .. }, Value::Json(_)) => Ok(()),
            (_, other) => Err(CodecError::TypeMismatch {
                expected: self.type_name(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Whether `value` is in the codec's domain.
    pub fn validate(&self, value: &Value) -> bool {
        self.check(value).is_ok()
    }

    /// Encode a value into its JSON wire representation.
    pub fn serialize(&self, value: &Value) -> Result<serde_json::Value, CodecError> {
        self.check(value)?;
        let encoded = match (self, value) {
            (ColumnKind::Array { items }, Value::Array(elements)) => serde_json::Value::Array(
                elements
                    .iter()
                    .map(|e| ColumnKind::serialize(items, e))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            (_, Value::String(s)) => serde_json::Value::String(s.clone()),
            (_, Value::Integer(i)) => serde_json::Value::from(*i),
            (_, Value::Float(f)) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or(CodecError::NonFinite)?,
            (_, Value::Decimal(d)) => serde_json::Value::String(d.to_string()),
            (_, Value::Boolean(b)) => serde_json::Value::Bool(*b),
            (_, Value::Date(d)) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            (_, Value::Timestamp(t)) => {
                serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            (_, Value::Uuid(u)) => serde_json::Value::String(u.hyphenated().to_string()),
            (_, Value::Json(j)) => j.clone(),
            (_, Value::Array(_)) | (_, Value::Null) => {
                return Err(CodecError::TypeMismatch {
                    expected: self.type_name(),
                    found: value.type_name().to_string(),
                });
            }
        };
        Ok(encoded)
    }

    /// Decode a JSON wire value into a `Value` of this kind.
    pub fn deserialize(&self, wire: &serde_json::Value) -> Result<Value, CodecError> {
        let mismatch = || CodecError::TypeMismatch {
            expected: self.type_name(),
            found: json_type_name(wire).to_string(),
        };

        if wire.is_null() {
            return Err(CodecError::NullNotAllowed {
                type_name: self.type_name(),
            });
        }

        let value = match self {
            ColumnKind::String { .. } | ColumnKind::Enum { .. } => {
                Value::String(wire.as_str().ok_or_else(mismatch)?.to_string())
            }
            ColumnKind::Integer | ColumnKind::BigInt => {
                Value::Integer(wire.as_i64().ok_or_else(mismatch)?)
            }
            ColumnKind::Float => Value::Float(wire.as_f64().ok_or_else(mismatch)?),
            ColumnKind::Decimal { .. } => {
                let text = match wire {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    _ => return Err(mismatch()),
                };
                Value::Decimal(parse_with(self, &text, Decimal::from_str)?)
            }
            ColumnKind::Boolean => Value::Boolean(wire.as_bool().ok_or_else(mismatch)?),
            ColumnKind::Date => {
                let text = wire.as_str().ok_or_else(mismatch)?;
                Value::Date(parse_with(self, text, |s| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                })?)
            }
            ColumnKind::Timestamp { .. } => {
                let text = wire.as_str().ok_or_else(mismatch)?;
                let parsed = parse_with(self, text, DateTime::parse_from_rfc3339)?;
                Value::Timestamp(parsed.with_timezone(&Utc))
            }
            ColumnKind::Uuid => {
                let text = wire.as_str().ok_or_else(mismatch)?;
                Value::Uuid(parse_with(self, text, Uuid::parse_str)?)
            }
            ColumnKind::Json | ColumnKind::Custom { .. } => Value::Json(wire.clone()),
            ColumnKind::Array { items } => {
                let elements = wire.as_array().ok_or_else(mismatch)?;
                Value::Array(
                    elements
                        .iter()
                        .map(|e| ColumnKind::deserialize(items, e))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
        };

        self.check(&value)?;
        Ok(value)
    }
}

fn parse_with<T, E: std::fmt::Display>(
    kind: &ColumnKind,
    input: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<T, CodecError> {
    parse(input).map_err(|e| CodecError::Parse {
        type_name: kind.type_name(),
        input: input.to_string(),
        message: e.to_string(),
    })
}

fn check_year(kind: &ColumnKind, year: i32) -> Result<(), CodecError> {
    if (0..=9999).contains(&year) {
        Ok(())
    } else {
        Err(CodecError::OutOfDomain {
            type_name: kind.type_name(),
            message: format!("year {} outside 0..=9999", year),
        })
    }
}

fn check_decimal(d: &Decimal, precision: u32, scale: u32) -> Result<(), CodecError> {
    let normalized = d.normalize();
    if normalized.is_zero() {
        return Ok(());
    }
    let digits = normalized.mantissa().unsigned_abs().to_string().len() as u32;
    let integer_digits = digits.saturating_sub(normalized.scale());
    if normalized.scale() > scale || integer_digits > precision.saturating_sub(scale) {
        return Err(CodecError::OutOfDomain {
            type_name: "decimal".to_string(),
            message: format!("{} does not fit NUMERIC({}, {})", d, precision, scale),
        });
    }
    Ok(())
}

/// Database-side generator used as a column default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultGenerator {
    /// Current timestamp at insert time
    Now,
    /// Random v4 UUID
    RandomUuid,
    /// Raw expression understood by the target database
    Expression(String),
}

/// Column default: a literal value or a generator.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Literal(Value),
    Generator(DefaultGenerator),
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        DefaultValue::Literal(value)
    }
}

impl From<DefaultGenerator> for DefaultValue {
    fn from(generator: DefaultGenerator) -> Self {
        DefaultValue::Generator(generator)
    }
}

/// A modifier applied on top of a base kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    Nullable,
    Unique,
    PrimaryKey,
    Default(DefaultValue),
    AutoIncrement,
}

/// Immutable column type: shared base kind plus ordered modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnType {
    kind: Arc<ColumnKind>,
    modifiers: Vec<Modifier>,
}

impl ColumnType {
    pub fn new(kind: ColumnKind) -> Self {
        Self::from_shared(Arc::new(kind))
    }

    /// Build a type on top of an already shared kind.
    pub fn from_shared(kind: Arc<ColumnKind>) -> Self {
        Self {
            kind,
            modifiers: Vec::new(),
        }
    }

    pub fn string(max_length: u32) -> Self {
        Self::new(ColumnKind::String {
            max_length: Some(max_length),
        })
    }

    pub fn text() -> Self {
        Self::new(ColumnKind::String { max_length: None })
    }

    pub fn integer() -> Self {
        Self::new(ColumnKind::Integer)
    }

    pub fn big_int() -> Self {
        Self::new(ColumnKind::BigInt)
    }

    pub fn float() -> Self {
        Self::new(ColumnKind::Float)
    }

    pub fn decimal(precision: u32, scale: u32) -> Self {
        Self::new(ColumnKind::Decimal { precision, scale })
    }

    pub fn boolean() -> Self {
        Self::new(ColumnKind::Boolean)
    }

    pub fn date() -> Self {
        Self::new(ColumnKind::Date)
    }

    pub fn timestamp(with_timezone: bool) -> Self {
        Self::new(ColumnKind::Timestamp { with_timezone })
    }

    pub fn uuid() -> Self {
        Self::new(ColumnKind::Uuid)
    }

    pub fn json() -> Self {
        Self::new(ColumnKind::Json)
    }

    pub fn array(items: ColumnKind) -> Self {
        Self::new(ColumnKind::Array {
            items: Box::new(items),
        })
    }

    pub fn enumeration<I, S>(name: Option<&str>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ColumnKind::Enum {
            name: name.map(str::to_string),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn custom(name: &str, renderings: BTreeMap<Dialect, String>) -> Self {
        Self::new(ColumnKind::Custom {
            name: name.to_string(),
            renderings,
        })
    }

    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    pub fn shared_kind(&self) -> &Arc<ColumnKind> {
        &self.kind
    }

    /// Modifiers in application order.
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn type_name(&self) -> String {
        self.kind.type_name()
    }

    pub fn type_params(&self) -> Vec<String> {
        self.kind.type_params()
    }

    pub fn is_nullable(&self) -> bool {
        self.modifiers.contains(&Modifier::Nullable)
    }

    pub fn is_unique(&self) -> bool {
        self.modifiers.contains(&Modifier::Unique)
    }

    pub fn is_primary_key(&self) -> bool {
        self.modifiers.contains(&Modifier::PrimaryKey)
    }

    pub fn is_auto_increment(&self) -> bool {
        self.modifiers.contains(&Modifier::AutoIncrement)
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.modifiers.iter().find_map(|m| match m {
            Modifier::Default(d) => Some(d),
            _ => None,
        })
    }

    /// Return a new type with `modifier` applied.
    ///
    /// A modifier of the same kind that is already present is replaced in
    /// place, so re-applying keeps the original position.
    pub fn with_modifier(&self, modifier: Modifier) -> Self {
        let mut modifiers = self.modifiers.clone();
        match modifiers
            .iter()
            .position(|m| mem::discriminant(m) == mem::discriminant(&modifier))
        {
            Some(index) => modifiers[index] = modifier,
            None => modifiers.push(modifier),
        }
        Self {
            kind: Arc::clone(&self.kind),
            modifiers,
        }
    }

    pub fn with_nullable(&self) -> Self {
        self.with_modifier(Modifier::Nullable)
    }

    pub fn with_unique(&self) -> Self {
        self.with_modifier(Modifier::Unique)
    }

    pub fn with_primary_key(&self) -> Self {
        self.with_modifier(Modifier::PrimaryKey)
    }

    pub fn with_default(&self, default: impl Into<DefaultValue>) -> Self {
        self.with_modifier(Modifier::Default(default.into()))
    }

    pub fn with_auto_increment(&self) -> Self {
        self.with_modifier(Modifier::AutoIncrement)
    }

    /// Check a value against the kind's domain, admitting null when nullable.
    pub fn check(&self, value: &Value) -> Result<(), CodecError> {
        if value.is_null() && self.is_nullable() {
            return Ok(());
        }
        self.kind.check(value)
    }

    pub fn validate(&self, value: &Value) -> bool {
        self.check(value).is_ok()
    }

    pub fn serialize(&self, value: &Value) -> Result<serde_json::Value, CodecError> {
        if value.is_null() && self.is_nullable() {
            return Ok(serde_json::Value::Null);
        }
        self.kind.serialize(value)
    }

    pub fn deserialize(&self, wire: &serde_json::Value) -> Result<Value, CodecError> {
        if wire.is_null() && self.is_nullable() {
            return Ok(Value::Null);
        }
        self.kind.deserialize(wire)
    }
}

impl From<ColumnKind> for ColumnType {
    fn from(kind: ColumnKind) -> Self {
        Self::new(kind)
    }
}
