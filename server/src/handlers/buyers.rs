//! Buyer read handlers - search, lookup, filter options and export.

use super::current_snapshot;
use crate::error::Result;
use crate::AppState;
use obsidian_engine::{
    filter, snapshot, BuyerRecord, FilterOptions, Origin, Query, RecordStore, Selection, Summary,
};
use serde::{Deserialize, Serialize};

/// Query parameters for buyer listing and export.
#[derive(Debug, Default, Deserialize)]
pub struct BuyerQuery {
    /// Raw search string in the token language
    pub q: Option<String>,
    /// Comma separated destination countries, matched exactly
    pub country: Option<String>,
    /// Comma separated exporter names, matched exactly
    pub exporter: Option<String>,
}

impl BuyerQuery {
    pub fn selection(&self) -> Selection {
        Selection {
            countries: split_list(self.country.as_deref()),
            exporters: split_list(self.exporter.as_deref()),
        }
    }

    pub fn query(&self) -> Query {
        Query::parse(self.q.as_deref().unwrap_or_default())
    }

    /// Apply the picker selection, then the search, preserving order.
    fn run<'a>(&self, store: &'a RecordStore) -> Vec<&'a BuyerRecord> {
        filter(&self.query(), self.selection().apply(store))
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Response for buyer listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerListResponse {
    /// Where the snapshot came from
    pub origin: Origin,
    pub summary: Summary,
    pub buyers: Vec<BuyerRecord>,
}

/// Search the current snapshot.
pub async fn handle_list(state: &AppState, query: BuyerQuery) -> Result<BuyerListResponse> {
    let store = current_snapshot(state).await?;
    let hits = query.run(&store);

    tracing::debug!(
        q = query.q.as_deref().unwrap_or_default(),
        matched = hits.len(),
        total = store.len(),
        "buyer search"
    );

    Ok(BuyerListResponse {
        origin: store.origin(),
        summary: Summary::of(hits.iter().copied()),
        buyers: hits.into_iter().cloned().collect(),
    })
}

/// Look up a single buyer by id.
pub async fn handle_get(state: &AppState, id: &str) -> Result<BuyerRecord> {
    let store = current_snapshot(state).await?;
    Ok(store.get(id)?.clone())
}

/// Distinct countries and exporters for the filter pickers.
pub async fn handle_filters(state: &AppState) -> Result<FilterOptions> {
    let store = current_snapshot(state).await?;
    Ok(FilterOptions::from_records(store.all()))
}

/// Matching buyers as a pretty-printed JSON document.
pub async fn handle_export(state: &AppState, query: BuyerQuery) -> Result<String> {
    let store = current_snapshot(state).await?;
    let document = snapshot::to_document(query.run(&store))?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_lists_are_trimmed() {
        let query = BuyerQuery {
            q: None,
            country: Some(" Germany, Kazakhstan ,,".into()),
            exporter: None,
        };
        let selection = query.selection();
        assert_eq!(selection.countries, vec!["Germany", "Kazakhstan"]);
        assert!(selection.exporters.is_empty());
    }

    #[test]
    fn missing_query_matches_everything() {
        let query = BuyerQuery::default();
        assert!(query.query().is_empty());
        assert!(query.selection().is_empty());
    }

    #[test]
    fn selection_runs_before_search() {
        let store = RecordStore::from_records(
            Origin::Local,
            vec![
                BuyerRecord::new("b-1", "Iron One").with_destination("Germany"),
                BuyerRecord::new("b-2", "Iron Two").with_destination("Poland"),
                BuyerRecord::new("b-3", "Copper").with_destination("Germany"),
            ],
        )
        .unwrap();

        let query = BuyerQuery {
            q: Some("iron".into()),
            country: Some("Germany".into()),
            exporter: None,
        };
        let ids: Vec<_> = query.run(&store).iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b-1"]);
    }
}
