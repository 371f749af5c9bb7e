//! Query evaluation against a record snapshot.
//!
//! Evaluation is a stable filter: results keep the snapshot's order and no
//! record is ever modified. A predicate on a field the record does not have
//! simply does not match.

use crate::query::Query;
use crate::schema::Field;
use crate::{BuyerRecord, RecordStore};

/// A query with its needles lowercased once, ready to test records.
#[derive(Debug, Clone)]
pub struct Matcher {
    fields: Vec<(Field, String)>,
    free_text: Option<String>,
}

impl Matcher {
    pub fn new(query: &Query) -> Self {
        Self {
            fields: query
                .fields
                .iter()
                .map(|p| (p.field.target(), p.value.to_lowercase()))
                .collect(),
            free_text: query.free_text.as_ref().map(|p| p.value.to_lowercase()),
        }
    }

    /// True when every predicate holds for `record`.
    pub fn matches(&self, record: &BuyerRecord) -> bool {
        let fields_match = self
            .fields
            .iter()
            .all(|(field, needle)| record.field(*field).contains_lowercase(needle));

        fields_match
            && self.free_text.as_deref().map_or(true, |needle| {
                Field::SEARCHABLE
                    .iter()
                    .any(|&field| record.field(field).contains_lowercase(needle))
            })
    }

    pub fn is_match_all(&self) -> bool {
        self.fields.is_empty() && self.free_text.is_none()
    }
}

/// Filter any sequence of records, preserving its order.
pub fn filter<'a, I>(query: &Query, records: I) -> Vec<&'a BuyerRecord>
where
    I: IntoIterator<Item = &'a BuyerRecord>,
{
    let matcher = Matcher::new(query);
    records
        .into_iter()
        .filter(|record| matcher.matches(record))
        .collect()
}

/// Records in `store` satisfying `query`, in store order.
pub fn evaluate<'a>(query: &Query, store: &'a RecordStore) -> Vec<&'a BuyerRecord> {
    filter(query, store.all())
}

/// Parse `raw` and evaluate it against `store`.
pub fn search<'a>(raw: &str, store: &'a RecordStore) -> Vec<&'a BuyerRecord> {
    evaluate(&Query::parse(raw), store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Origin;

    fn test_store() -> RecordStore {
        let mut kz = BuyerRecord::new("b-1", "Iron Trade LLP")
            .with_destination("Kazakhstan")
            .with_exporters(["Acme Steel", "Beta Metals"])
            .with_totals(120_000.0, 14);
        kz.phones = vec!["+7 727 000 00 00".into()];

        let de = BuyerRecord::new("b-2", "Eisenwerk GmbH")
            .with_destination("Germany")
            .with_emails(["einkauf@ironworks.de"])
            .with_totals(5_000.0, 2);

        let de_iron = BuyerRecord::new("b-3", "IRONCLAD Handels AG")
            .with_destination("germany")
            .with_exporters(["Acme Steel"]);

        let no_country = BuyerRecord::new("b-4", "Iron Mountain");

        RecordStore::from_records(Origin::Local, vec![kz, de, de_iron, no_country]).unwrap()
    }

    fn ids(records: &[&BuyerRecord]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let store = test_store();
        assert_eq!(ids(&search("", &store)), vec!["b-1", "b-2", "b-3", "b-4"]);
        assert!(Matcher::new(&Query::default()).is_match_all());
    }

    #[test]
    fn buyer_and_country_conjunction() {
        let store = test_store();
        let result = search("@buyer:iron @country:Germany", &store);
        assert_eq!(ids(&result), vec!["b-3"]);
    }

    #[test]
    fn alias_equivalence() {
        let store = test_store();
        assert_eq!(
            ids(&search("@country:Kazakhstan", &store)),
            ids(&search("@destination:Kazakhstan", &store))
        );
        assert_eq!(ids(&search("@destination:kazakh", &store)), vec!["b-1"]);
    }

    #[test]
    fn value_case_does_not_matter() {
        let store = test_store();
        assert_eq!(
            ids(&search("@buyer:IRON", &store)),
            ids(&search("@buyer:iRoN", &store))
        );
    }

    #[test]
    fn absent_field_never_matches() {
        let store = test_store();
        let result = search("@country:a", &store);
        assert!(!ids(&result).contains(&"b-4".to_string()));
        assert!(search("@email:gmail", &store).is_empty());
    }

    #[test]
    fn list_fields_match_any_element() {
        let store = test_store();
        assert_eq!(ids(&search("@exporter:beta", &store)), vec!["b-1"]);
        assert_eq!(ids(&search("@exporter:acme", &store)), vec!["b-1", "b-3"]);
        assert_eq!(ids(&search("@phone:727", &store)), vec!["b-1"]);
    }

    #[test]
    fn free_text_searches_all_text_fields() {
        let store = test_store();
        // buyer name
        assert_eq!(ids(&search("eisenwerk", &store)), vec!["b-2"]);
        // email list
        assert_eq!(ids(&search("ironworks.de", &store)), vec!["b-2"]);
        // exporter list
        assert_eq!(ids(&search("beta metals", &store)), vec!["b-1"]);
    }

    #[test]
    fn free_text_ignores_numeric_fields() {
        let store = test_store();
        assert!(search("120000", &store).is_empty());
        assert!(search("14", &store).is_empty());
    }

    #[test]
    fn free_text_and_fields_combine() {
        let store = test_store();
        assert_eq!(ids(&search("acme @country:germany", &store)), vec!["b-3"]);
        assert!(search("beta @country:germany", &store).is_empty());
    }

    #[test]
    fn filter_over_arbitrary_sequence() {
        let store = test_store();
        let subset: Vec<&BuyerRecord> = store.all().rev().collect();
        let result = filter(&Query::parse("iron"), subset);
        assert_eq!(ids(&result), vec!["b-4", "b-3", "b-2", "b-1"]);
    }
}
