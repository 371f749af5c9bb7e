//! # Obsidian Engine
//!
//! Search and synchronization core for the Obsidian buyer-intelligence
//! dashboard.
//!
//! The engine holds buyer records (importers with their exporters, contacts
//! and shipment totals), answers analyst searches over them, and reconciles
//! a local JSON export with the remote canonical store.
//!
//! ## Design Principles
//!
//! - **Validate once**: raw rows are coerced and checked at the load
//!   boundary; everything past it works with a typed [`BuyerRecord`]
//! - **Immutable snapshots**: a [`RecordStore`] never changes after loading
//! - **Searches never fail**: unknown tokens degrade to free text
//! - **Injected I/O**: sources and the remote store are traits the caller
//!   implements and passes in
//!
//! ## Search Language
//!
//! ```text
//! @buyer:iron @country:Germany "steel pipe"
//! ```
//!
//! `@<field>:<value>` tokens filter one field, everything else is free text
//! matched against all searchable fields. All parts must match, matching is
//! a case-insensitive substring test, and `@country` / `@destination` are
//! the same field. See [`query`] for the full grammar.
//!
//! ## Reconciliation
//!
//! The [`Reconciler`] upserts new and changed local records into a
//! [`RemoteStore`]. The local copy always wins, remote-only records are left
//! alone, and a failed write is reported without stopping the batch.
//!
//! ## Quick Start
//!
//! ```rust
//! use obsidian_engine::{search, BuyerRecord, MemoryRemote, Origin, Reconciler, RecordStore};
//!
//! let store = RecordStore::from_records(
//!     Origin::Local,
//!     vec![
//!         BuyerRecord::new("b-1", "Iron Works").with_destination("Germany"),
//!         BuyerRecord::new("b-2", "Steel Co").with_destination("Kazakhstan"),
//!     ],
//! )
//! .unwrap();
//!
//! let hits = search("@buyer:iron @country:germany", &store);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].id(), "b-1");
//!
//! // Push the snapshot to an empty remote store.
//! let remote_snapshot = RecordStore::empty(Origin::Remote);
//! let plan = obsidian_engine::reconcile::plan(&store, &remote_snapshot);
//!
//! let mut remote = MemoryRemote::new();
//! let report = Reconciler::default().apply(plan, &mut remote);
//! assert_eq!(report.inserted, 2);
//! assert_eq!(remote.len(), 2);
//! ```

pub mod error;
pub mod eval;
pub mod facets;
pub mod query;
pub mod reconcile;
pub mod record;
pub mod schema;
pub mod snapshot;
pub mod source;
pub mod store;

// Re-export main types at crate root
pub use error::{Error, ErrorKind};
pub use eval::{evaluate, filter, search, Matcher};
pub use facets::{FilterOptions, Selection, Summary};
pub use query::{FieldPredicate, FreeTextPredicate, Query, QueryField};
pub use reconcile::{
    Conflict, MergeStrategy, PlanSummary, PlannedUpdate, Reconciler, SyncFailure, SyncPlan,
    SyncReport, SyncState,
};
pub use record::{derive_id, BuyerRecord, FieldDiff, FieldValue, LoadOptions};
pub use schema::{Field, FieldType};
pub use snapshot::Origin;
pub use source::{JsonFileSource, LocalSource, MemoryRemote, RemoteStore};
pub use store::{RecordStore, Source};

/// Type aliases for clarity
pub type RecordId = String;
