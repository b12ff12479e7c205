// Copyright 2025 Cowboy AI, LLC.

//! Built-in conversions between scalar types
//!
//! Covers booleans, integers of every width, floats, chars, strings, enums,
//! dates and timestamps. Narrowing is checked; a value that does not fit the
//! target is a conversion error, never a silent truncation.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt::Write as _;

use crate::catalog::TypeCatalog;
use crate::errors::{MappingError, MappingResult};
use crate::types::{FloatWidth, IntWidth, TypeRef};
use crate::value::Value;

/// Formatting context of one scalar conversion
#[derive(Debug, Clone, Copy)]
pub struct ScalarContext<'a> {
    /// Catalog used to validate enum variants and ordinals
    pub catalog: &'a TypeCatalog,
    /// Date format in effect (field, class or global)
    pub date_format: &'a str,
    /// Format explicitly set on the field or class; timestamps fall back to RFC 3339 without one
    pub explicit_format: Option<&'a str>,
}

/// Convert a scalar value to a scalar target type
///
/// `Null` converts to `Null`. `Any` targets take the value unchanged.
///
/// # Errors
///
/// Returns a conversion error when the value has no conversion to the
/// target or does not fit it.
pub fn convert_scalar(value: &Value, target: &TypeRef, ctx: &ScalarContext<'_>) -> MappingResult<Value> {
    if value.is_null() || *target == TypeRef::Any {
        return Ok(value.clone());
    }
    let fail = |message: String| MappingError::conversion(value.runtime_type(), target, message);

    match target {
        TypeRef::Bool => to_bool(value).map(Value::Bool).map_err(fail),
        TypeRef::Int(width) => to_int(value, *width, ctx).map(Value::Int).map_err(fail),
        TypeRef::Float(width) => to_float(value, *width).map(Value::Float).map_err(fail),
        TypeRef::Char => to_char(value).map(Value::Char).map_err(fail),
        TypeRef::String => to_string(value, ctx).map(Value::Str).map_err(fail),
        TypeRef::Enum(name) => to_enum(value, name, ctx).map_err(fail),
        TypeRef::Date => to_date(value, ctx).map(Value::Date).map_err(fail),
        TypeRef::DateTime => to_datetime(value, ctx).map(Value::DateTime).map_err(fail),
        other => Err(fail(format!("{} is not a scalar type", other))),
    }
}

fn unsupported(value: &Value) -> String {
    format!("no built-in conversion from {}", value.kind_name())
}

fn to_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(0) => Ok(false),
        Value::Int(1) => Ok(true),
        Value::Int(i) => Err(format!("{} is not a boolean", i)),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Ok(true),
            "false" | "no" | "n" | "off" | "0" => Ok(false),
            _ => Err(format!("'{}' is not a boolean", s)),
        },
        other => Err(unsupported(other)),
    }
}

fn checked(value: i64, width: IntWidth) -> Result<i64, String> {
    if width.contains(value) {
        Ok(value)
    } else {
        Err(format!("{} does not fit {:?}", value, width))
    }
}

fn to_int(value: &Value, width: IntWidth, ctx: &ScalarContext<'_>) -> Result<i64, String> {
    match value {
        Value::Int(i) => checked(*i, width),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(format!("{} is not finite", f));
            }
            let truncated = f.trunc();
            if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                return Err(format!("{} does not fit {:?}", f, width));
            }
            checked(truncated as i64, width)
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Char(c) => checked(i64::from(u32::from(*c)), width),
        Value::Str(s) => {
            let parsed = s
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("'{}' is not an integer: {}", s, e))?;
            checked(parsed, width)
        }
        Value::Enum { type_name, variant } => {
            let ordinal = ctx
                .catalog
                .enumeration(type_name)
                .and_then(|e| e.ordinal(variant))
                .ok_or_else(|| format!("enum {} has no ordinal for {}", type_name, variant))?;
            checked(ordinal as i64, width)
        }
        Value::DateTime(dt) => checked(dt.timestamp_millis(), width),
        other => Err(unsupported(other)),
    }
}

fn to_float(value: &Value, width: FloatWidth) -> Result<f64, String> {
    let wide = match value {
        Value::Float(f) => *f,
        Value::Int(i) => *i as f64,
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("'{}' is not a number: {}", s, e))?,
        other => return Err(unsupported(other)),
    };
    match width {
        FloatWidth::F64 => Ok(wide),
        FloatWidth::F32 => {
            let narrow = wide as f32;
            if wide.is_finite() && !narrow.is_finite() {
                return Err(format!("{} does not fit F32", wide));
            }
            Ok(f64::from(narrow))
        }
    }
}

fn to_char(value: &Value) -> Result<char, String> {
    match value {
        Value::Char(c) => Ok(*c),
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(format!("'{}' is not a single character", s)),
            }
        }
        Value::Int(i) => u32::try_from(*i)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("{} is not a valid code point", i)),
        other => Err(unsupported(other)),
    }
}

fn to_string(value: &Value, ctx: &ScalarContext<'_>) -> Result<String, String> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Char(c) => Ok(c.to_string()),
        Value::Enum { variant, .. } => Ok(variant.clone()),
        Value::Date(d) => format_date(d, ctx.date_format),
        Value::DateTime(dt) => match ctx.explicit_format {
            Some(format) => format_datetime(dt, format),
            None => Ok(dt.to_rfc3339()),
        },
        other => Err(unsupported(other)),
    }
}

fn to_enum(value: &Value, target: &str, ctx: &ScalarContext<'_>) -> Result<Value, String> {
    let catalogued = ctx.catalog.enumeration(target);
    let variant = match value {
        Value::Enum { variant, .. } => variant.clone(),
        Value::Str(s) => s.trim().to_string(),
        Value::Int(i) => {
            let descriptor =
                catalogued.ok_or_else(|| format!("enum {} is not catalogued; ordinals are unknown", target))?;
            usize::try_from(*i)
                .ok()
                .and_then(|idx| descriptor.variants.get(idx))
                .cloned()
                .ok_or_else(|| format!("{} is not an ordinal of {}", i, target))?
        }
        other => return Err(unsupported(other)),
    };
    if let Some(descriptor) = catalogued {
        if descriptor.ordinal(&variant).is_none() {
            return Err(format!("{} has no variant '{}'", target, variant));
        }
    }
    Ok(Value::enum_variant(target, variant))
}

fn to_date(value: &Value, ctx: &ScalarContext<'_>) -> Result<NaiveDate, String> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::DateTime(dt) => Ok(dt.date_naive()),
        Value::Str(s) => parse_date(s.trim(), ctx.date_format),
        other => Err(unsupported(other)),
    }
}

fn to_datetime(value: &Value, ctx: &ScalarContext<'_>) -> Result<DateTime<Utc>, String> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::Date(d) => Ok(midnight(d)),
        Value::Int(ms) => DateTime::from_timestamp_millis(*ms)
            .ok_or_else(|| format!("{} is out of range for a timestamp", ms)),
        Value::Str(s) => parse_datetime(s.trim(), ctx.explicit_format.unwrap_or(ctx.date_format)),
        other => Err(unsupported(other)),
    }
}

fn midnight(date: &NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn checked_items(format: &str) -> Result<Vec<Item<'_>>, String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid date format '{}'", format));
    }
    Ok(items)
}

/// Format a date with a chrono format string
pub fn format_date(date: &NaiveDate, format: &str) -> Result<String, String> {
    let items = checked_items(format)?;
    let mut out = String::new();
    write!(out, "{}", date.format_with_items(items.into_iter()))
        .map_err(|_| format!("format '{}' does not apply to a date", format))?;
    Ok(out)
}

/// Format a timestamp with a chrono format string
pub fn format_datetime(datetime: &DateTime<Utc>, format: &str) -> Result<String, String> {
    let items = checked_items(format)?;
    let mut out = String::new();
    write!(out, "{}", datetime.format_with_items(items.into_iter()))
        .map_err(|_| format!("format '{}' does not apply to a timestamp", format))?;
    Ok(out)
}

/// Parse a date with a chrono format string
pub fn parse_date(text: &str, format: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, format)
        .map_err(|e| format!("'{}' does not match '{}': {}", text, format, e))
}

/// Parse a timestamp: RFC 3339 first, then the format as date-time, then as date
pub fn parse_datetime(text: &str, format: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    parse_date(text, format).map(|d| midnight(&d))
}
