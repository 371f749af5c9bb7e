//! Snapshot loading - the record set every read request works on.

use crate::db;
use crate::error::Result;
use crate::AppState;
use obsidian_engine::{JsonFileSource, Origin, RecordStore, Source};
use std::sync::Arc;

/// The snapshot to serve: cached if fresh, otherwise reloaded.
///
/// The remote table is preferred. When it is unreachable or empty the local
/// JSON export is served instead, and only if both fail is the request
/// failed, with the local error.
pub async fn current_snapshot(state: &AppState) -> Result<Arc<RecordStore>> {
    if let Some(store) = state.cache.get().await {
        return Ok(store);
    }

    let store = match load_remote(state).await {
        Ok(store) if !store.is_empty() => store,
        Ok(_) => {
            tracing::info!("Remote table is empty, serving local snapshot");
            load_local(state).await?
        }
        Err(e) => {
            tracing::warn!("Remote snapshot unavailable, serving local snapshot: {}", e);
            load_local(state).await?
        }
    };

    tracing::debug!(
        origin = %store.origin(),
        records = store.len(),
        "snapshot loaded"
    );
    Ok(state.cache.put(store).await)
}

async fn load_remote(state: &AppState) -> Result<RecordStore> {
    let rows = db::fetch_buyers(&state.pool, &state.config.buyers_table).await?;
    let records = rows
        .iter()
        .enumerate()
        .map(|(index, row)| row.to_record(index))
        .collect::<obsidian_engine::error::Result<Vec<_>>>()?;

    Ok(RecordStore::from_records(Origin::Remote, records)?)
}

async fn load_local(state: &AppState) -> Result<RecordStore> {
    let source = JsonFileSource::new(&state.config.local_snapshot_path)
        .with_options(state.config.load_options());

    let store =
        tokio::task::spawn_blocking(move || RecordStore::load(Source::Local(&source))).await??;
    Ok(store)
}
