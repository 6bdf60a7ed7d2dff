//! Entry point for one product sync: compute the sync time, run the transfer
//! pipeline, then record the sync marker.
//!
//! The job is the error boundary. Every failure from the source, the
//! pipeline, or the marker write is caught here, logged with the sync
//! timestamp and failing stage, and turned into a failure report — nothing
//! propagates past `run`. The marker is written only after the transfer is
//! fully durable, so a failed transfer never advances the marker.

use crate::{
    models::transfer::Transfer,
    services::{
        chunk_source::{ChunkSource, TransportError},
        part_uploader::{MultipartStore, StorageError},
        sync_marker::SyncMarkerWriter,
        transfer_pipeline::{TransferError, TransferPipeline},
    },
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Source(#[from] TransportError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("sync marker write failed")]
    Marker(#[source] StorageError),
}

/// Outcome of one sync invocation. Binary by contract: no partial progress.
#[derive(Debug, Clone, Copy)]
pub struct SyncReport {
    pub success: bool,
}

/// Sequences one full sync and owns the invocation-level error boundary.
pub struct SyncJob<C, S> {
    source: Arc<C>,
    pipeline: Arc<TransferPipeline<S>>,
    marker: Arc<SyncMarkerWriter<S>>,
    // Serializes invocations: one transfer at a time.
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl<C, S> Clone for SyncJob<C, S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            pipeline: Arc::clone(&self.pipeline),
            marker: Arc::clone(&self.marker),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<C, S> SyncJob<C, S>
where
    C: ChunkSource + 'static,
    S: MultipartStore + 'static,
{
    pub fn new(
        source: Arc<C>,
        store: Arc<S>,
        bucket: impl Into<String>,
        max_in_flight: usize,
    ) -> Self {
        let bucket = bucket.into();
        Self {
            source,
            pipeline: Arc::new(TransferPipeline::new(
                Arc::clone(&store),
                bucket.clone(),
                max_in_flight,
            )),
            marker: Arc::new(SyncMarkerWriter::new(store, bucket)),
            gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Run one sync to completion, converting any failure into the report.
    pub async fn run(&self) -> SyncReport {
        let _one_at_a_time = self.gate.lock().await;

        let transfer = Transfer::begin_now();
        info!(sync_time = transfer.started_at, "product sync started");

        match self.execute(&transfer).await {
            Ok(()) => {
                info!(sync_time = transfer.started_at, "product sync finished");
                SyncReport { success: true }
            }
            Err(err) => {
                error!(
                    sync_time = transfer.started_at,
                    "product sync failed: {:#}",
                    anyhow::Error::from(err)
                );
                SyncReport { success: false }
            }
        }
    }

    async fn execute(&self, transfer: &Transfer) -> Result<(), SyncError> {
        let chunks = self.source.fetch().await?;
        let session = self.pipeline.run(transfer, chunks).await?;

        debug!(
            key = %session.key,
            parts = session.parts.len(),
            "transfer durable; writing sync marker"
        );
        self.marker
            .write(transfer.started_at)
            .await
            .map_err(SyncError::Marker)?;

        Ok(())
    }
}
