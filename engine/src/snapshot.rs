//! Snapshot documents: the JSON form of a set of buyer rows.
//!
//! A snapshot document is a top-level JSON array of row objects, the format
//! of the exported `combined_buyers.json`. Parsing validates every row and
//! fails the whole document on the first bad one.

use crate::{error::Result, BuyerRecord, Error, LoadOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a snapshot was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Local JSON export
    Local,
    /// Remote canonical store
    Remote,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Local => write!(f, "local"),
            Origin::Remote => write!(f, "remote"),
        }
    }
}

/// Parse a snapshot document into records.
///
/// Documents that are not valid JSON, or not an array, make the source
/// unusable and fail with [`Error::SourceUnavailable`]. Rows failing
/// validation fail with [`Error::MalformedRecord`].
pub fn parse_document(json: &str, options: LoadOptions) -> Result<Vec<BuyerRecord>> {
    let document: Value = serde_json::from_str(json)
        .map_err(|e| Error::SourceUnavailable(format!("invalid snapshot JSON: {e}")))?;

    match document {
        Value::Array(rows) => records_from_rows(&rows, options),
        other => Err(Error::SourceUnavailable(format!(
            "snapshot must be a JSON array of rows, got {}",
            kind_of(&other)
        ))),
    }
}

/// Validate already-decoded rows.
pub fn records_from_rows(rows: &[Value], options: LoadOptions) -> Result<Vec<BuyerRecord>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| BuyerRecord::from_value(row, index, options))
        .collect()
}

/// Serialize records as a pretty-printed snapshot document.
pub fn to_document<'a>(records: impl IntoIterator<Item = &'a BuyerRecord>) -> Result<String> {
    let rows: Vec<&BuyerRecord> = records.into_iter().collect();
    serde_json::to_string_pretty(&rows)
        .map_err(|e| Error::SourceUnavailable(format!("snapshot serialization failed: {e}")))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn parse_array_document() {
        let json = r#"[
            {"id": "b-1", "buyer_name": "Acme", "destination_country": "Chile"},
            {"id": "b-2", "name": "Beta", "email": "info@beta.kz"}
        ]"#;

        let records = parse_document(json, LoadOptions::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].buyer_name, "Beta");
        assert_eq!(records[1].emails, vec!["info@beta.kz"]);
    }

    #[test]
    fn invalid_json_is_unavailable() {
        let err = parse_document("[{", LoadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);

        let err = parse_document(r#"{"id": "b-1"}"#, LoadOptions::default()).unwrap_err();
        assert_eq!(
            err,
            Error::SourceUnavailable("snapshot must be a JSON array of rows, got an object".into())
        );
    }

    #[test]
    fn bad_row_fails_whole_document() {
        let json = r#"[
            {"id": "b-1", "buyer_name": "Acme"},
            {"id": "b-2"}
        ]"#;

        let err = parse_document(json, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { index: 1, .. }));
    }

    #[test]
    fn document_roundtrip() {
        let records = vec![
            BuyerRecord::new("b-1", "Acme").with_exporters(["X", "Y"]),
            BuyerRecord::new("b-2", "Beta").with_totals(10.5, 2),
        ];

        let json = to_document(&records).unwrap();
        let parsed = parse_document(&json, LoadOptions::default()).unwrap();
        assert_eq!(parsed, records);
    }
}
