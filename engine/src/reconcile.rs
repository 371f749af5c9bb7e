//! Reconciliation of a local snapshot into the remote store.
//!
//! # Algorithm
//!
//! 1. Load both snapshots and index them by id
//! 2. Classify every local record: absent remotely (insert), differing
//!    (update, with a per-field diff) or identical (unchanged)
//! 3. Upsert inserts, then updates, one record at a time
//! 4. Record each failed write against its record and keep going
//! 5. Return a report of what happened
//!
//! Remote records missing from the local snapshot are never deleted: a
//! partial local export is not proof that a buyer is gone.
//!
//! A failure to read either snapshot aborts the run before any write. Once
//! applying has started, failures are isolated per record and nothing that
//! was written is rolled back.

use crate::error::ErrorKind;
use crate::record::FieldDiff;
use crate::schema::Field;
use crate::store::{RecordStore, Source};
use crate::{error::Result, BuyerRecord, Error, LocalSource, RecordId, RemoteStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How differing copies of the same record are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStrategy {
    /// The local copy overwrites the remote one wholesale (default).
    #[default]
    LocalWins,
}

/// Lifecycle of one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncState {
    #[default]
    Idle,
    Comparing,
    Applying,
    Complete,
    Failed,
}

impl SyncState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SyncState::Complete | SyncState::Failed)
    }
}

/// A record that exists on both sides with different field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedUpdate {
    /// The local copy, which will be written
    pub record: BuyerRecord,
    pub diff: Vec<FieldDiff>,
}

/// A record the merge strategy could not decide on.
///
/// Never produced by [`MergeStrategy::LocalWins`]; reserved for a three-way
/// merge that can tell which side changed a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub id: RecordId,
    pub fields: Vec<Field>,
}

/// Classification of every local record against the remote snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPlan {
    pub to_insert: Vec<BuyerRecord>,
    pub to_update: Vec<PlannedUpdate>,
    pub unchanged: Vec<RecordId>,
    pub conflicts: Vec<Conflict>,
}

impl SyncPlan {
    /// Nothing to write.
    pub fn is_noop(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            to_insert: self.to_insert.len(),
            to_update: self.to_update.len(),
            unchanged: self.unchanged.len(),
            conflicts: self.conflicts.len(),
        }
    }
}

/// Counts-only view of a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub to_insert: usize,
    pub to_update: usize,
    pub unchanged: usize,
    pub conflicts: usize,
}

/// A record whose write failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub id: RecordId,
    pub kind: ErrorKind,
    pub cause: String,
}

/// Outcome of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub state: SyncState,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// Records successfully written.
    pub fn applied(&self) -> usize {
        self.inserted + self.updated
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compare a local snapshot against the remote one.
///
/// Pure: inserts and updates come out in local snapshot order.
pub fn plan(local: &RecordStore, remote: &RecordStore) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for record in local.all() {
        match remote.get(record.id()) {
            Err(_) => plan.to_insert.push(record.clone()),
            Ok(theirs) => {
                let diff = record.diff(theirs);
                if diff.is_empty() {
                    plan.unchanged.push(record.id().to_string());
                } else {
                    plan.to_update.push(PlannedUpdate {
                        record: record.clone(),
                        diff,
                    });
                }
            }
        }
    }

    plan
}

/// Drives one sync run through its states.
#[derive(Debug, Default)]
pub struct Reconciler {
    strategy: MergeStrategy,
    state: SyncState,
}

impl Reconciler {
    pub fn new(strategy: MergeStrategy) -> Self {
        Self {
            strategy,
            state: SyncState::Idle,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Load both sides and compute the plan without writing anything.
    ///
    /// On a load failure the run moves to [`SyncState::Failed`].
    pub fn compare<L, R>(&mut self, local: &L, remote: &R) -> Result<SyncPlan>
    where
        L: LocalSource,
        R: RemoteStore,
    {
        self.state = SyncState::Comparing;

        let snapshots = RecordStore::load(Source::Local(local)).and_then(|local| {
            RecordStore::load(Source::Remote(remote)).map(|remote| (local, remote))
        });

        match snapshots {
            Ok((local, remote)) => {
                let plan = plan(&local, &remote);
                debug!(
                    local = local.len(),
                    remote = remote.len(),
                    to_insert = plan.to_insert.len(),
                    to_update = plan.to_update.len(),
                    unchanged = plan.unchanged.len(),
                    "sync plan computed"
                );
                Ok(plan)
            }
            Err(e) => {
                warn!(error = %e, "sync aborted while comparing snapshots");
                self.state = SyncState::Failed;
                Err(e)
            }
        }
    }

    /// Write a plan to the remote store, one record at a time.
    ///
    /// A failed upsert is recorded in the report and does not stop the
    /// remaining writes.
    pub fn apply<R>(&mut self, plan: SyncPlan, remote: &mut R) -> SyncReport
    where
        R: RemoteStore + ?Sized,
    {
        self.state = SyncState::Applying;

        let mut report = SyncReport {
            unchanged: plan.unchanged.len(),
            ..SyncReport::default()
        };

        for record in &plan.to_insert {
            if Self::write(remote, record, &mut report) {
                report.inserted += 1;
            }
        }
        for update in &plan.to_update {
            if Self::write(remote, &update.record, &mut report) {
                report.updated += 1;
            }
        }

        report.failed = report.failures.len();
        self.state = SyncState::Complete;
        report.state = self.state;

        info!(
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failed,
            "sync complete"
        );
        report
    }

    /// Compare then apply. Fails only if a snapshot cannot be loaded, in
    /// which case nothing has been written.
    pub fn sync<L, R>(&mut self, local: &L, remote: &mut R) -> Result<SyncReport>
    where
        L: LocalSource,
        R: RemoteStore,
    {
        let plan = self.compare(local, remote)?;
        Ok(self.apply(plan, remote))
    }

    fn write<R>(remote: &mut R, record: &BuyerRecord, report: &mut SyncReport) -> bool
    where
        R: RemoteStore + ?Sized,
    {
        match remote.upsert(record) {
            Ok(()) => true,
            Err(e) => {
                warn!(id = record.id(), error = %e, "upsert failed");
                let kind = e.kind();
                let cause = match e {
                    Error::WriteError { cause, .. } => cause,
                    other => other.to_string(),
                };
                report.failures.push(SyncFailure {
                    id: record.id().to_string(),
                    kind,
                    cause,
                });
                false
            }
        }
    }
}
