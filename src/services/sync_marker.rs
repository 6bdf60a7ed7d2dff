//! Persists the "last successful sync" marker object.

use crate::services::part_uploader::{MultipartStore, StorageResult};
use bytes::Bytes;
use std::sync::Arc;

/// Fixed key of the sync marker, one per bucket.
pub const LAST_SYNC_KEY: &str = "product-import/last-sync";

/// Content type of the marker body.
pub const MARKER_CONTENT_TYPE: &str = "text/plain";

/// Writes the completion marker recording a transfer's start time.
///
/// Must only be invoked after the transfer is fully durable. Each write
/// unconditionally overwrites the previous marker (last-writer-wins).
pub struct SyncMarkerWriter<S> {
    store: Arc<S>,
    bucket: String,
}

impl<S> SyncMarkerWriter<S>
where
    S: MultipartStore,
{
    pub fn new(store: Arc<S>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Write `sync_time` (epoch seconds) as the marker body.
    pub async fn write(&self, sync_time: i64) -> StorageResult<()> {
        self.store
            .put_object(
                &self.bucket,
                LAST_SYNC_KEY,
                MARKER_CONTENT_TYPE,
                Bytes::from(sync_time.to_string()),
            )
            .await
    }
}
