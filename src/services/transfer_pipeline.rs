//! Drives the source chunk stream into a multipart upload.
//!
//! The pipeline walks one transfer through the upload lifecycle: begin the
//! session, submit one part per chunk with sequential 1-based part numbers,
//! wait for every in-flight part to resolve, then complete. Any failure along
//! the way aborts the session (best-effort) and surfaces as an error — a
//! transfer never partially succeeds.
//!
//! Part uploads run concurrently, capped at a fixed in-flight limit so a very
//! large source stream cannot pile up unbounded pending requests. Part
//! identity comes from the explicit part number, so resolution order does not
//! matter; the part list is sorted ascending before completion as the storage
//! service requires.

use crate::{
    models::{
        multipart::{MultipartSession, PartDescriptor},
        transfer::{CSV_CONTENT_TYPE, Transfer},
    },
    services::{
        chunk_source::TransportError,
        part_uploader::{MultipartStore, StorageError},
    },
};
use bytes::Bytes;
use futures::{
    StreamExt,
    future::BoxFuture,
    pin_mut,
    stream::{FuturesUnordered, Stream},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default cap on concurrently in-flight part uploads.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("source stream produced no chunks; refusing to complete an empty upload")]
    EmptyUpload,
    #[error("part numbers not contiguous: expected {expected}, got {got}")]
    NonContiguousParts { expected: i32, got: i32 },
}

type PartFuture = BoxFuture<'static, Result<PartDescriptor, StorageError>>;

/// Orchestrates one multipart transfer against a `MultipartStore`.
pub struct TransferPipeline<S> {
    store: Arc<S>,
    bucket: String,
    max_in_flight: usize,
}

impl<S> TransferPipeline<S>
where
    S: MultipartStore + 'static,
{
    pub fn new(store: Arc<S>, bucket: impl Into<String>, max_in_flight: usize) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            // A cap of zero would deadlock the submit loop.
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Run one transfer to completion.
    ///
    /// Opens the session, uploads every chunk as a numbered part, waits for
    /// all uploads to resolve, and completes the upload. On any failure the
    /// session is aborted (best-effort) and the error is returned.
    pub async fn run<C>(
        &self,
        transfer: &Transfer,
        chunks: C,
    ) -> Result<MultipartSession, TransferError>
    where
        C: Stream<Item = Result<Bytes, TransportError>> + Send,
    {
        let key = transfer.object_key();
        let upload_id = self
            .store
            .begin(&self.bucket, &key, CSV_CONTENT_TYPE)
            .await?;
        let mut session = MultipartSession::new(self.bucket.clone(), key, upload_id);

        info!(
            bucket = %session.bucket,
            key = %session.key,
            upload_id = %session.upload_id,
            "multipart upload started"
        );

        match self.upload_parts(&mut session, chunks).await {
            Ok(()) => (),
            Err(err) => {
                self.abort_session(&session).await;
                return Err(err);
            }
        }

        if let Err(err) = self.finalize(&mut session).await {
            self.abort_session(&session).await;
            return Err(err);
        }

        info!(
            key = %session.key,
            parts = session.parts.len(),
            "multipart upload completed"
        );
        Ok(session)
    }

    /// Consume the chunk stream, submitting one part per chunk.
    ///
    /// Parts are numbered 1..N in the order chunks arrive. At most
    /// `max_in_flight` uploads run at once, and they keep making progress
    /// while the pipeline waits for the next chunk: each loop turn races the
    /// in-flight set against the stream, draining resolved parts first. The
    /// chunk arm is gated on the cap, so a full set backpressures the stream.
    /// Returning early on an error drops (abandons) any still-pending
    /// uploads, which is fine because the caller aborts the session.
    async fn upload_parts<C>(
        &self,
        session: &mut MultipartSession,
        chunks: C,
    ) -> Result<(), TransferError>
    where
        C: Stream<Item = Result<Bytes, TransportError>> + Send,
    {
        let mut in_flight: FuturesUnordered<PartFuture> = FuturesUnordered::new();
        let mut next_part_number: i32 = 1;

        pin_mut!(chunks);
        let mut stream_done = false;
        while !stream_done {
            tokio::select! {
                biased;

                Some(resolved) = in_flight.next(), if !in_flight.is_empty() => {
                    session.parts.push(resolved?);
                }
                maybe_chunk = chunks.next(), if in_flight.len() < self.max_in_flight => {
                    let Some(chunk) = maybe_chunk else {
                        stream_done = true;
                        continue;
                    };
                    let chunk = chunk?;

                    let part_number = next_part_number;
                    next_part_number += 1;
                    debug!(part_number, size = chunk.len(), "submitting part");

                    let store = Arc::clone(&self.store);
                    let bucket = session.bucket.clone();
                    let key = session.key.clone();
                    let upload_id = session.upload_id.clone();
                    in_flight.push(Box::pin(async move {
                        store
                            .upload_part(&bucket, &key, &upload_id, part_number, chunk)
                            .await
                    }));
                }
            }
        }

        // Barrier: every issued part must resolve before completion.
        while let Some(resolved) = in_flight.next().await {
            session.parts.push(resolved?);
        }

        Ok(())
    }

    /// Sort the confirmed parts and complete the upload.
    ///
    /// Rejects an empty part list and any gap in the numbering before the
    /// storage service is asked to assemble the object.
    async fn finalize(&self, session: &mut MultipartSession) -> Result<(), TransferError> {
        if session.parts.is_empty() {
            return Err(TransferError::EmptyUpload);
        }

        session.parts.sort_by_key(|part| part.part_number);
        for (index, part) in session.parts.iter().enumerate() {
            let expected = index as i32 + 1;
            if part.part_number != expected {
                return Err(TransferError::NonContiguousParts {
                    expected,
                    got: part.part_number,
                });
            }
        }

        self.store
            .complete(
                &session.bucket,
                &session.key,
                &session.upload_id,
                &session.parts,
            )
            .await?;

        Ok(())
    }

    /// Best-effort abort; failures are logged, never propagated, since the
    /// transfer has already failed for another reason.
    async fn abort_session(&self, session: &MultipartSession) {
        if let Err(err) = self
            .store
            .abort(&session.bucket, &session.key, &session.upload_id)
            .await
        {
            warn!(
                key = %session.key,
                upload_id = %session.upload_id,
                "failed to abort multipart upload: {}",
                err
            );
        }
    }
}
