//! HTTP handler for triggering a product sync.
//!
//! The invocation contract is a bare status code: 200 when the transfer and
//! the marker write both succeeded, 500 otherwise. Failure details live in
//! the logs, not the response.

use crate::{
    errors::AppError,
    services::{chunk_source::ChunkSource, part_uploader::MultipartStore, sync_job::SyncJob},
};
use axum::{extract::State, http::StatusCode};

/// `POST /sync` — run one full sync to completion.
///
/// Takes no request body. The job itself is the error boundary; this handler
/// only maps its binary outcome onto the response status.
pub async fn trigger_sync<C, S>(
    State(job): State<SyncJob<C, S>>,
) -> Result<StatusCode, AppError>
where
    C: ChunkSource + 'static,
    S: MultipartStore + 'static,
{
    let report = job.run().await;
    if report.success {
        Ok(StatusCode::OK)
    } else {
        Err(AppError::internal("product sync failed"))
    }
}
