//! RecordStore - an immutable, id-indexed snapshot of buyer records.
//!
//! A store is loaded from exactly one source and never mutated afterwards.
//! Iteration follows the order rows had in that source.

use crate::snapshot::{parse_document, to_document, Origin};
use crate::{error::Result, BuyerRecord, Error, LoadOptions, LocalSource, RecordId, RemoteStore};
use std::collections::HashMap;

/// The source a store is loaded from.
pub enum Source<'a> {
    Local(&'a dyn LocalSource),
    Remote(&'a dyn RemoteStore),
}

impl Source<'_> {
    fn origin(&self) -> Origin {
        match self {
            Source::Local(_) => Origin::Local,
            Source::Remote(_) => Origin::Remote,
        }
    }
}

/// Snapshot of buyer records with lookup by id.
#[derive(Debug, Clone)]
pub struct RecordStore {
    origin: Origin,
    records: Vec<BuyerRecord>,
    positions: HashMap<RecordId, usize>,
}

impl RecordStore {
    /// Load a store from a local snapshot or the remote store.
    pub fn load(source: Source<'_>) -> Result<Self> {
        let origin = source.origin();
        let records = match source {
            Source::Local(local) => local.read_snapshot()?,
            Source::Remote(remote) => remote.fetch_all()?,
        };
        Self::from_records(origin, records)
    }

    /// Build a store from records already in memory.
    ///
    /// A repeated id makes the snapshot ambiguous and is rejected as a
    /// malformed record.
    pub fn from_records(origin: Origin, records: Vec<BuyerRecord>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            if positions.insert(record.id().to_string(), index).is_some() {
                return Err(Error::malformed(
                    index,
                    format!("duplicate id '{}'", record.id()),
                ));
            }
        }

        Ok(Self {
            origin,
            records,
            positions,
        })
    }

    /// Parse a snapshot document straight into a store.
    pub fn from_json(origin: Origin, json: &str, options: LoadOptions) -> Result<Self> {
        Self::from_records(origin, parse_document(json, options)?)
    }

    /// An empty store.
    pub fn empty(origin: Origin) -> Self {
        Self {
            origin,
            records: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// All records in source order. The iterator is lazy and can be cloned
    /// to restart.
    pub fn all(&self) -> std::slice::Iter<'_, BuyerRecord> {
        self.records.iter()
    }

    /// Get a record by id.
    pub fn get(&self, id: &str) -> Result<&BuyerRecord> {
        self.positions
            .get(id)
            .map(|&i| &self.records[i])
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Export the store as a pretty-printed snapshot document.
    pub fn to_json_pretty(&self) -> Result<String> {
        to_document(&self.records)
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a BuyerRecord;
    type IntoIter = std::slice::Iter<'a, BuyerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, MemoryRemote};

    struct FailingSource;

    impl LocalSource for FailingSource {
        fn read_snapshot(&self) -> Result<Vec<BuyerRecord>> {
            Err(Error::SourceUnavailable("disk unplugged".into()))
        }
    }

    struct InlineSource(&'static str);

    impl LocalSource for InlineSource {
        fn read_snapshot(&self) -> Result<Vec<BuyerRecord>> {
            parse_document(self.0, LoadOptions::default())
        }
    }

    fn test_store() -> RecordStore {
        RecordStore::from_records(
            Origin::Local,
            vec![
                BuyerRecord::new("b-2", "Beta"),
                BuyerRecord::new("b-1", "Acme"),
                BuyerRecord::new("b-3", "Gamma"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn iteration_preserves_source_order() {
        let store = test_store();
        let ids: Vec<_> = store.all().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b-2", "b-1", "b-3"]);

        let iter = store.all();
        assert_eq!(iter.clone().count(), 3);
        assert_eq!(iter.count(), 3);
    }

    #[test]
    fn get_and_not_found() {
        let store = test_store();
        assert_eq!(store.get("b-1").unwrap().buyer_name, "Acme");

        let err = store.get("b-9").unwrap_err();
        assert_eq!(err, Error::RecordNotFound("b-9".into()));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!store.contains("b-9"));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = RecordStore::from_records(
            Origin::Remote,
            vec![BuyerRecord::new("b-1", "Acme"), BuyerRecord::new("b-1", "Acme 2")],
        )
        .unwrap_err();

        assert!(matches!(err, Error::MalformedRecord { index: 1, .. }));
    }

    #[test]
    fn load_from_local_source() {
        let source = InlineSource(r#"[{"id": "b-1", "buyer_name": "Acme"}]"#);
        let store = RecordStore::load(Source::Local(&source)).unwrap();
        assert_eq!(store.origin(), Origin::Local);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn load_from_remote() {
        let remote = MemoryRemote::with_records([BuyerRecord::new("b-1", "Acme")]);
        let store = RecordStore::load(Source::Remote(&remote)).unwrap();
        assert_eq!(store.origin(), Origin::Remote);
        assert!(store.contains("b-1"));
    }

    #[test]
    fn load_failures_propagate() {
        let err = RecordStore::load(Source::Local(&FailingSource)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);

        let source = InlineSource(r#"[{"buyer_name": "No Id"}]"#);
        let err = RecordStore::load(Source::Local(&source)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedRecord);
    }

    #[test]
    fn export_roundtrip() {
        let store = test_store();
        let json = store.to_json_pretty().unwrap();
        let parsed = parse_document(&json, LoadOptions::default()).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].id(), "b-2");
    }

    #[test]
    fn from_json_document() {
        let json = r#"[
            {"id": "b-2", "buyer_name": "Beta", "destination_country": "Chile"},
            {"id": "b-1", "name": "Acme"}
        ]"#;
        let store = RecordStore::from_json(Origin::Local, json, LoadOptions::default()).unwrap();
        assert_eq!(store.origin(), Origin::Local);
        let ids: Vec<_> = store.all().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b-2", "b-1"]);
        assert_eq!(
            store.get("b-2").unwrap().destination_country.as_deref(),
            Some("Chile")
        );

        let dup = r#"[{"id": "b-1", "buyer_name": "A"}, {"id": "b-1", "buyer_name": "B"}]"#;
        let err = RecordStore::from_json(Origin::Local, dup, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { index: 1, .. }));

        let err =
            RecordStore::from_json(Origin::Local, r#"{"id": "b-1"}"#, LoadOptions::default())
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    }
}
