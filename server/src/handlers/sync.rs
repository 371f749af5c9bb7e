//! Sync handlers - push the local JSON export into the remote table.

use crate::db::PgRemoteStore;
use crate::error::{AppError, Result};
use crate::AppState;
use chrono::{DateTime, Utc};
use obsidian_engine::{JsonFileSource, PlanSummary, Reconciler, SyncReport};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tokio::runtime::Handle;
use uuid::Uuid;

/// Request body for a sync run. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Local snapshot to sync instead of the configured one, relative to
    /// the configured snapshot's directory
    pub path: Option<PathBuf>,
}

/// Response for a completed sync run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub run_id: Uuid,
    pub finished_at: DateTime<Utc>,
    pub report: SyncReport,
}

/// Response for a dry run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub source: PathBuf,
    pub table: String,
    pub plan: PlanSummary,
}

fn local_source(state: &AppState, path: Option<PathBuf>) -> Result<JsonFileSource> {
    let path = match path {
        Some(requested) => snapshot_override(&state.config.local_snapshot_path, &requested)?,
        None => state.config.local_snapshot_path.clone(),
    };
    Ok(JsonFileSource::new(path).with_options(state.config.load_options()))
}

/// Resolve a requested snapshot inside the configured snapshot's directory.
///
/// Absolute paths and `..` components are refused so a caller cannot name
/// arbitrary files on the host.
fn snapshot_override(configured: &Path, requested: &Path) -> Result<PathBuf> {
    let contained = requested
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if requested.as_os_str().is_empty() || !contained {
        return Err(AppError::BadRequest(format!(
            "snapshot path must be relative to the snapshot directory: {}",
            requested.display()
        )));
    }

    let dir = configured.parent().unwrap_or_else(|| Path::new(""));
    Ok(dir.join(requested))
}

fn remote_store(state: &AppState) -> PgRemoteStore {
    PgRemoteStore::new(
        state.pool.clone(),
        state.config.buyers_table.clone(),
        Handle::current(),
    )
}

/// Run a full sync. The snapshot cache is dropped afterwards so the next
/// read sees the new remote contents.
pub async fn handle_sync(state: &AppState, request: SyncRequest) -> Result<SyncResponse> {
    let run_id = Uuid::new_v4();
    let local = local_source(state, request.path)?;
    let mut remote = remote_store(state);

    tracing::info!(%run_id, source = %local.path().display(), "Sync started");

    let report = tokio::task::spawn_blocking(move || {
        let mut reconciler = Reconciler::default();
        tracing::debug!(%run_id, strategy = ?reconciler.strategy(), "Reconciling");
        reconciler.sync(&local, &mut remote)
    })
    .await?
    .inspect_err(|e| tracing::warn!(%run_id, "Sync failed: {}", e))?;

    state.cache.invalidate().await;

    tracing::info!(
        %run_id,
        inserted = report.inserted,
        updated = report.updated,
        failed = report.failed,
        "Sync finished"
    );

    Ok(SyncResponse {
        run_id,
        finished_at: Utc::now(),
        report,
    })
}

/// Compare the local snapshot with the remote table without writing.
pub async fn handle_plan(state: &AppState) -> Result<PlanResponse> {
    let local = local_source(state, None)?;
    let remote = remote_store(state);
    let source = local.path().to_path_buf();

    let plan = tokio::task::spawn_blocking(move || {
        let mut reconciler = Reconciler::default();
        reconciler.compare(&local, &remote)
    })
    .await??;

    Ok(PlanResponse {
        source,
        table: state.config.buyers_table.clone(),
        plan: plan.summary(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_resolves_next_to_configured_snapshot() {
        let configured = Path::new("/srv/obsidian/buyers.json");
        assert_eq!(
            snapshot_override(configured, Path::new("buyers-2024.json")).unwrap(),
            PathBuf::from("/srv/obsidian/buyers-2024.json")
        );
        assert_eq!(
            snapshot_override(configured, Path::new("./archive/old.json")).unwrap(),
            PathBuf::from("/srv/obsidian/archive/old.json")
        );
        assert_eq!(
            snapshot_override(Path::new("buyers.json"), Path::new("other.json")).unwrap(),
            PathBuf::from("other.json")
        );
    }

    #[test]
    fn override_cannot_leave_snapshot_directory() {
        let configured = Path::new("/srv/obsidian/buyers.json");
        for requested in ["/etc/passwd", "../secrets.json", "archive/../../x.json", ""] {
            let err = snapshot_override(configured, Path::new(requested)).unwrap_err();
            assert!(
                matches!(err, AppError::BadRequest(_)),
                "accepted {requested:?}"
            );
        }
    }
}
