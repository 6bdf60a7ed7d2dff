//! Defines the routes exposed by the sync service.
//!
//! - `GET  /healthz` — liveness probe
//! - `POST /sync`    — run one product sync, 200 on success, 500 on failure

use crate::{
    handlers::{health_handlers::healthz, sync_handlers::trigger_sync},
    services::{chunk_source::ChunkSource, part_uploader::MultipartStore, sync_job::SyncJob},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build the router. The router carries the shared `SyncJob` state to all
/// handlers; the job is generic over its source and store so tests can mount
/// the same routes over fakes.
pub fn routes<C, S>() -> Router<SyncJob<C, S>>
where
    C: ChunkSource + 'static,
    S: MultipartStore + 'static,
{
    Router::new()
        .route("/healthz", get(healthz))
        .route("/sync", post(trigger_sync::<C, S>))
}
