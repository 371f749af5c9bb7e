//! Buyer records.

use crate::schema::{coerce_float, coerce_int, coerce_list, coerce_text, Field};
use crate::{error::Result, Error, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Options applied while turning raw rows into records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOptions {
    /// Give rows without an `id` a deterministic id derived from the buyer
    /// name and destination instead of rejecting them.
    pub derive_missing_ids: bool,
}

/// One row of aggregated trade data: an importer with its exporters,
/// contacts and shipment totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct BuyerRecord {
    id: RecordId,
    pub buyer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_invoices: Option<u64>,
    pub exporters: Vec<String>,
    pub emails: Vec<String>,
    pub websites: Vec<String>,
    pub phones: Vec<String>,
    pub addresses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name_english: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_english: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// Borrowed view of a single field's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Float(f64),
    Int(u64),
    Absent,
}

impl FieldValue<'_> {
    /// Case-insensitive substring test. `needle` must already be lowercase.
    ///
    /// Lists match when any element matches. Numbers never match: they are
    /// not part of the textual search surface.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        match self {
            FieldValue::Text(s) => s.to_lowercase().contains(needle),
            FieldValue::List(items) => items.iter().any(|s| s.to_lowercase().contains(needle)),
            FieldValue::Float(_) | FieldValue::Int(_) | FieldValue::Absent => false,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => json!(s),
            FieldValue::List(items) => json!(items),
            FieldValue::Float(v) => json!(v),
            FieldValue::Int(v) => json!(v),
            FieldValue::Absent => Value::Null,
        }
    }
}

/// A single differing field between the local and remote copy of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDiff {
    pub field: Field,
    pub local: Value,
    pub remote: Value,
}

impl BuyerRecord {
    /// Create a record with only the required fields set.
    pub fn new(id: impl Into<RecordId>, buyer_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            buyer_name: buyer_name.into(),
            destination_country: None,
            total_usd: None,
            total_invoices: None,
            exporters: Vec::new(),
            emails: Vec::new(),
            websites: Vec::new(),
            phones: Vec::new(),
            addresses: Vec::new(),
            company_name_english: None,
            country_english: None,
            country_code: None,
        }
    }

    pub fn with_destination(mut self, country: impl Into<String>) -> Self {
        self.destination_country = Some(country.into());
        self
    }

    pub fn with_totals(mut self, usd: f64, invoices: u64) -> Self {
        self.total_usd = Some(usd);
        self.total_invoices = Some(invoices);
        self
    }

    pub fn with_exporters<I, S>(mut self, exporters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exporters = exporters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emails = emails.into_iter().map(Into::into).collect();
        self
    }

    /// The record's primary key. Immutable once the record exists.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Build a record from one raw JSON row.
    ///
    /// `index` is the row's position in its source and is only used in error
    /// messages.
    pub fn from_value(value: &Value, index: usize, options: LoadOptions) -> Result<Self> {
        let row = value
            .as_object()
            .ok_or_else(|| Error::malformed(index, "row must be a JSON object"))?;

        let text = |field: Field| coerce_text(index, field, field.lookup(row));
        let list = |field: Field| coerce_list(index, field, field.lookup(row));

        let buyer_name = text(Field::BuyerName)?
            .ok_or_else(|| Error::malformed(index, "missing required field: buyer_name"))?;
        let destination_country = text(Field::DestinationCountry)?;

        let id = match text(Field::Id)? {
            Some(id) => id,
            None if options.derive_missing_ids => {
                derive_id(&buyer_name, destination_country.as_deref().unwrap_or_default())
            }
            None => return Err(Error::malformed(index, "missing required field: id")),
        };

        Ok(Self {
            id,
            buyer_name,
            destination_country,
            total_usd: coerce_float(index, Field::TotalUsd, Field::TotalUsd.lookup(row))?,
            total_invoices: coerce_int(index, Field::TotalInvoices, Field::TotalInvoices.lookup(row))?,
            exporters: list(Field::Exporters)?,
            emails: list(Field::Emails)?,
            websites: list(Field::Websites)?,
            phones: list(Field::Phones)?,
            addresses: list(Field::Addresses)?,
            company_name_english: text(Field::CompanyNameEnglish)?,
            country_english: text(Field::CountryEnglish)?,
            country_code: text(Field::CountryCode)?,
        })
    }

    /// Read a field by name.
    pub fn field(&self, field: Field) -> FieldValue<'_> {
        fn opt_text(v: &Option<String>) -> FieldValue<'_> {
            v.as_deref().map_or(FieldValue::Absent, FieldValue::Text)
        }

        match field {
            Field::Id => FieldValue::Text(&self.id),
            Field::BuyerName => FieldValue::Text(&self.buyer_name),
            Field::DestinationCountry => opt_text(&self.destination_country),
            Field::TotalUsd => self.total_usd.map_or(FieldValue::Absent, FieldValue::Float),
            Field::TotalInvoices => self.total_invoices.map_or(FieldValue::Absent, FieldValue::Int),
            Field::Exporters => FieldValue::List(&self.exporters),
            Field::Emails => FieldValue::List(&self.emails),
            Field::Websites => FieldValue::List(&self.websites),
            Field::Phones => FieldValue::List(&self.phones),
            Field::Addresses => FieldValue::List(&self.addresses),
            Field::CompanyNameEnglish => opt_text(&self.company_name_english),
            Field::CountryEnglish => opt_text(&self.country_english),
            Field::CountryCode => opt_text(&self.country_code),
        }
    }

    /// Field-by-field comparison against another copy of the same entity.
    ///
    /// `self` is treated as the local side. The id is not compared.
    pub fn diff(&self, remote: &BuyerRecord) -> Vec<FieldDiff> {
        Field::ALL
            .iter()
            .copied()
            .filter(|&f| f != Field::Id)
            .filter_map(|f| {
                let (local, theirs) = (self.field(f), remote.field(f));
                (local != theirs).then(|| FieldDiff {
                    field: f,
                    local: local.to_json(),
                    remote: theirs.to_json(),
                })
            })
            .collect()
    }
}

impl TryFrom<Value> for BuyerRecord {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        BuyerRecord::from_value(&value, 0, LoadOptions::default())
    }
}

/// Deterministic id for a row that arrived without one.
pub fn derive_id(buyer_name: &str, destination_country: &str) -> RecordId {
    let raw = format!("{buyer_name}|{destination_country}|{destination_country}")
        .to_lowercase();
    let digest = Sha256::digest(raw.trim().as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(32);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_record() {
        let record = BuyerRecord::new("b-1", "Iron Works LLP")
            .with_destination("Kazakhstan")
            .with_totals(1200.5, 4);

        assert_eq!(record.id(), "b-1");
        assert_eq!(record.buyer_name, "Iron Works LLP");
        assert_eq!(record.destination_country.as_deref(), Some("Kazakhstan"));
        assert_eq!(record.total_invoices, Some(4));
        assert!(record.exporters.is_empty());
    }

    #[test]
    fn from_value_full_row() {
        let row = json!({
            "id": "b-1",
            "buyer_name": "Iron Works",
            "destination_country": "Germany",
            "total_usd": 5000,
            "total_invoices": "12",
            "exporters": {"Acme": 3, "Beta": 1},
            "email": ["sales@iron.de"],
            "websites": "[\"iron.de\"]",
            "phone": "+49 30 1234",
            "addresses": [],
            "company_name_english": "",
            "country_code": "DE"
        });

        let record = BuyerRecord::from_value(&row, 0, LoadOptions::default()).unwrap();
        assert_eq!(record.total_usd, Some(5000.0));
        assert_eq!(record.total_invoices, Some(12));
        assert_eq!(record.exporters, vec!["Acme", "Beta"]);
        assert_eq!(record.emails, vec!["sales@iron.de"]);
        assert_eq!(record.websites, vec!["iron.de"]);
        assert_eq!(record.phones, vec!["+49 30 1234"]);
        assert!(record.addresses.is_empty());
        assert_eq!(record.company_name_english, None);
        assert_eq!(record.country_code.as_deref(), Some("DE"));
    }

    #[test]
    fn missing_required_fields() {
        let err = BuyerRecord::from_value(&json!({"id": "b-1"}), 4, LoadOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            Error::malformed(4, "missing required field: buyer_name")
        );

        let err = BuyerRecord::from_value(&json!({"buyer_name": "Acme"}), 2, LoadOptions::default())
            .unwrap_err();
        assert_eq!(err, Error::malformed(2, "missing required field: id"));

        let err = BuyerRecord::from_value(&json!([1, 2]), 0, LoadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedRecord);
    }

    #[test]
    fn derived_ids_are_deterministic() {
        let options = LoadOptions {
            derive_missing_ids: true,
        };
        let row = json!({"buyer_name": "Acme", "destination_country": "Chile"});
        let a = BuyerRecord::from_value(&row, 0, options).unwrap();
        let b = BuyerRecord::from_value(&row, 1, options).unwrap();

        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().len(), 32);
        assert_eq!(a.id(), derive_id("ACME", "chile"));
        assert_ne!(a.id(), derive_id("Acme", "Peru"));
    }

    #[test]
    fn diff_reports_changed_fields() {
        let local = BuyerRecord::new("b-1", "Iron Works")
            .with_destination("Germany")
            .with_exporters(["Acme", "Beta"]);
        let remote = BuyerRecord::new("b-1", "Iron Works")
            .with_destination("Austria")
            .with_exporters(["Acme"]);

        let diff = local.diff(&remote);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff[0].field, Field::DestinationCountry);
        assert_eq!(diff[0].local, json!("Germany"));
        assert_eq!(diff[0].remote, json!("Austria"));
        assert_eq!(diff[1].field, Field::Exporters);

        assert!(local.diff(&local.clone()).is_empty());
    }

    #[test]
    fn numbers_are_not_text_searchable() {
        let record = BuyerRecord::new("b-1", "Acme").with_totals(1234.0, 99);
        assert!(!record.field(Field::TotalUsd).contains_lowercase("1234"));
        assert!(!record.field(Field::TotalInvoices).contains_lowercase("99"));
        assert!(record.field(Field::BuyerName).contains_lowercase("acm"));
    }

    #[test]
    fn serialization_roundtrip() {
        let record = BuyerRecord::new("b-1", "Acme")
            .with_destination("Chile")
            .with_totals(10.0, 1)
            .with_emails(["a@acme.cl"]);

        let json = serde_json::to_string(&record).unwrap();
        let parsed: BuyerRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(record, parsed);
    }

    #[test]
    fn deserialize_validates() {
        let result: std::result::Result<BuyerRecord, _> =
            serde_json::from_str(r#"{"id": "b-1", "total_usd": -5}"#);
        assert!(result.is_err());
    }
}
