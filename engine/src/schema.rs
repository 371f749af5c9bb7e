//! Field catalogue and load-boundary validation.
//!
//! Buyer rows arrive as loosely shaped JSON: list columns may be arrays,
//! encoded strings or exporter maps, numbers may be strings, and some columns
//! carry legacy names. Everything is coerced here, once, so the rest of the
//! engine only ever sees a well-typed [`BuyerRecord`](crate::BuyerRecord).

use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value types a buyer field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Int,
    Float,
    /// Ordered sequence of strings
    List,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Text => write!(f, "Text"),
            FieldType::Int => write!(f, "Int"),
            FieldType::Float => write!(f, "Float"),
            FieldType::List => write!(f, "List"),
        }
    }
}

/// Every field of a buyer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    BuyerName,
    DestinationCountry,
    TotalUsd,
    TotalInvoices,
    Exporters,
    Emails,
    Websites,
    Phones,
    Addresses,
    CompanyNameEnglish,
    CountryEnglish,
    CountryCode,
}

impl Field {
    /// All fields in canonical column order.
    pub const ALL: [Field; 13] = [
        Field::Id,
        Field::BuyerName,
        Field::DestinationCountry,
        Field::TotalUsd,
        Field::TotalInvoices,
        Field::Exporters,
        Field::Emails,
        Field::Websites,
        Field::Phones,
        Field::Addresses,
        Field::CompanyNameEnglish,
        Field::CountryEnglish,
        Field::CountryCode,
    ];

    /// Fields consulted by free-text search.
    pub const SEARCHABLE: [Field; 9] = [
        Field::BuyerName,
        Field::DestinationCountry,
        Field::CountryEnglish,
        Field::CompanyNameEnglish,
        Field::Exporters,
        Field::Emails,
        Field::Websites,
        Field::Phones,
        Field::Addresses,
    ];

    /// Canonical column name.
    pub fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::BuyerName => "buyer_name",
            Field::DestinationCountry => "destination_country",
            Field::TotalUsd => "total_usd",
            Field::TotalInvoices => "total_invoices",
            Field::Exporters => "exporters",
            Field::Emails => "emails",
            Field::Websites => "websites",
            Field::Phones => "phones",
            Field::Addresses => "addresses",
            Field::CompanyNameEnglish => "company_name_english",
            Field::CountryEnglish => "country_english",
            Field::CountryCode => "country_code",
        }
    }

    /// Legacy column names accepted when the canonical one is absent.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::BuyerName => &["name"],
            Field::Emails => &["email"],
            Field::Websites => &["website"],
            Field::Phones => &["phone"],
            Field::Addresses => &["address"],
            _ => &[],
        }
    }

    pub fn field_type(self) -> FieldType {
        match self {
            Field::TotalUsd => FieldType::Float,
            Field::TotalInvoices => FieldType::Int,
            Field::Exporters
            | Field::Emails
            | Field::Websites
            | Field::Phones
            | Field::Addresses => FieldType::List,
            _ => FieldType::Text,
        }
    }

    /// Look up the value for this field in a raw row, honouring aliases.
    pub fn lookup(self, row: &Map<String, Value>) -> Option<&Value> {
        std::iter::once(self.name())
            .chain(self.aliases().iter().copied())
            .find_map(|key| row.get(key).filter(|v| !v.is_null()))
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Coerce a raw value into optional text. Empty strings count as absent.
pub(crate) fn coerce_text(index: usize, field: Field, value: Option<&Value>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(type_mismatch(index, field, other)),
    }
}

/// Coerce a raw value into an optional non-negative float.
pub(crate) fn coerce_float(index: usize, field: Field, value: Option<&Value>) -> Result<Option<f64>> {
    let parsed = match value {
        None => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => return Err(type_mismatch(index, field, other)),
    };

    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        Some(v) => Err(Error::malformed(
            index,
            format!("field '{field}' must be a non-negative number, got {v}"),
        )),
        None => Err(Error::malformed(
            index,
            format!("field '{field}' is not a number"),
        )),
    }
}

/// Coerce a raw value into an optional non-negative integer.
///
/// Whole-valued floats (`12.0`) are accepted since spreadsheet exports write
/// counts that way.
pub(crate) fn coerce_int(index: usize, field: Field, value: Option<&Value>) -> Result<Option<u64>> {
    // `u64::MAX as f64` rounds up to 2^64, which is already out of range.
    let as_float =
        |v: f64| (v.fract() == 0.0 && v >= 0.0 && v < u64::MAX as f64).then_some(v as u64);

    let parsed = match value {
        None => return Ok(None),
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().and_then(as_float)),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(as_float))
        }
        Some(other) => return Err(type_mismatch(index, field, other)),
    };

    parsed.map(Some).ok_or_else(|| {
        Error::malformed(
            index,
            format!("field '{field}' must be a non-negative integer"),
        )
    })
}

/// Coerce a raw value into a list of strings.
///
/// Accepts arrays, JSON-encoded arrays stored as text, a bare string (one
/// element), and objects whose keys are the elements (exporter maps).
pub(crate) fn coerce_list(index: usize, field: Field, value: Option<&Value>) -> Result<Vec<String>> {
    match value {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) if s.trim().is_empty() => None,
                Value::String(s) => Some(Ok(s.trim().to_string())),
                Value::Number(n) => Some(Ok(n.to_string())),
                other => Some(Err(type_mismatch(index, field, other))),
            })
            .collect(),
        Some(Value::Object(map)) => Ok(map.keys().cloned().collect()),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Vec::new());
            }
            if trimmed.starts_with('[') || trimmed.starts_with('{') {
                if let Ok(decoded) = serde_json::from_str::<Value>(trimmed) {
                    return coerce_list(index, field, Some(&decoded));
                }
            }
            Ok(vec![trimmed.to_string()])
        }
        Some(other) => Err(type_mismatch(index, field, other)),
    }
}

fn type_mismatch(index: usize, field: Field, got: &Value) -> Error {
    Error::malformed(
        index,
        format!(
            "type mismatch for field '{}': expected {}, got {}",
            field,
            field.field_type(),
            json_type_name(got)
        ),
    )
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "Int",
        Value::Number(_) => "Float",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}
