//! Dashboard facets: filter options, multi-select filtering and KPI totals.

use crate::BuyerRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Distinct values offered by the country and exporter pickers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Sorted, distinct destination countries
    pub countries: Vec<String>,
    /// Sorted, distinct exporter names
    pub exporters: Vec<String>,
}

impl FilterOptions {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a BuyerRecord>) -> Self {
        let mut countries = BTreeSet::new();
        let mut exporters = BTreeSet::new();

        for record in records {
            if let Some(country) = &record.destination_country {
                countries.insert(country.clone());
            }
            exporters.extend(record.exporters.iter().cloned());
        }

        Self {
            countries: countries.into_iter().collect(),
            exporters: exporters.into_iter().collect(),
        }
    }
}

/// Picker selections. An empty list leaves that dimension unfiltered.
///
/// Unlike search predicates, selections match exact values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub exporters: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty() && self.exporters.is_empty()
    }

    pub fn matches(&self, record: &BuyerRecord) -> bool {
        let country_ok = self.countries.is_empty()
            || record
                .destination_country
                .as_ref()
                .is_some_and(|c| self.countries.contains(c));

        let exporter_ok = self.exporters.is_empty()
            || record.exporters.iter().any(|e| self.exporters.contains(e));

        country_ok && exporter_ok
    }

    /// Order-preserving filter.
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a BuyerRecord>) -> Vec<&'a BuyerRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// KPI totals over a set of records. Missing totals count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub buyers: usize,
    pub total_usd: f64,
    pub total_invoices: u64,
}

impl Summary {
    pub fn of<'a>(records: impl IntoIterator<Item = &'a BuyerRecord>) -> Self {
        records.into_iter().fold(Summary::default(), |acc, r| Summary {
            buyers: acc.buyers + 1,
            total_usd: acc.total_usd + r.total_usd.unwrap_or(0.0),
            total_invoices: acc.total_invoices.saturating_add(r.total_invoices.unwrap_or(0)),
        })
    }
}
