// Copyright 2025 Cowboy AI, LLC.

//! Stock date and timestamp string converter

use anyhow::{anyhow, bail};

use super::scalar::{format_date, format_datetime, parse_date, parse_datetime};
use super::{ConversionRequest, CustomConverter};
use crate::types::TypeRef;
use crate::value::Value;

/// Converts dates and timestamps to and from strings with a chrono format
///
/// The field rule's converter parameter, when present, overrides the format.
#[derive(Debug, Clone)]
pub struct DateFormatConverter {
    format: String,
}

impl DateFormatConverter {
    /// Converter using a chrono format such as `%Y-%m-%d`
    pub fn new(format: impl Into<String>) -> Self {
        Self { format: format.into() }
    }
}

impl CustomConverter for DateFormatConverter {
    fn convert(&self, request: &ConversionRequest<'_>) -> anyhow::Result<Value> {
        let format = request.parameter.unwrap_or(&self.format);
        match (request.source, request.destination_type) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Date(d), TypeRef::String | TypeRef::Any) => {
                format_date(d, format).map(Value::Str).map_err(|e| anyhow!(e))
            }
            (Value::DateTime(dt), TypeRef::String | TypeRef::Any) => {
                format_datetime(dt, format).map(Value::Str).map_err(|e| anyhow!(e))
            }
            (Value::Str(s), TypeRef::Date) => parse_date(s.trim(), format).map(Value::Date).map_err(|e| anyhow!(e)),
            (Value::Str(s), TypeRef::DateTime) => {
                parse_datetime(s.trim(), format).map(Value::DateTime).map_err(|e| anyhow!(e))
            }
            (source, destination) => bail!(
                "cannot convert {} to {} with a date format",
                source.kind_name(),
                destination
            ),
        }
    }

    fn name(&self) -> &str {
        "date-format"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    static NULL: Value = Value::Null;
    static ANY: TypeRef = TypeRef::Any;

    fn request<'a>(source: &'a Value, destination: &'a TypeRef, parameter: Option<&'a str>) -> ConversionRequest<'a> {
        ConversionRequest {
            source,
            existing_destination: &NULL,
            source_type: &ANY,
            destination_type: destination,
            parameter,
        }
    }

    #[test]
    fn test_formats_and_parses() {
        let converter = DateFormatConverter::new("%Y-%m-%d");
        let date = Value::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());

        let text = converter.convert(&request(&date, &TypeRef::String, None)).unwrap();
        assert_eq!(text, Value::from("2020-01-01"));
        assert_eq!(converter.convert(&request(&text, &TypeRef::Date, None)).unwrap(), date);
    }

    #[test]
    fn test_parameter_overrides_format() {
        let converter = DateFormatConverter::new("%Y-%m-%d");
        let date = Value::Date(NaiveDate::from_ymd_opt(2020, 2, 3).unwrap());
        let text = converter
            .convert(&request(&date, &TypeRef::String, Some("%d.%m.%Y")))
            .unwrap();
        assert_eq!(text, Value::from("03.02.2020"));
    }

    #[test]
    fn test_bad_input_fails() {
        let converter = DateFormatConverter::new("%Y-%m-%d");
        let text = Value::from("not a date");
        assert!(converter.convert(&request(&text, &TypeRef::Date, None)).is_err());
        assert!(converter.convert(&request(&Value::Bool(true), &TypeRef::Date, None)).is_err());
    }
}
