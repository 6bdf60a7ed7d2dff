//! Recording fakes shared by the service tests.

use crate::models::multipart::PartDescriptor;
use crate::services::{
    chunk_source::{ChunkSource, ChunkStream, TransportError},
    part_uploader::{MultipartStore, StorageError, StorageResult},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

/// One observed storage call. Part uploads are recorded when they resolve,
/// so call order reflects resolution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreCall {
    Begin { bucket: String, key: String },
    PartResolved { part_number: i32, size: usize },
    Complete { parts: Vec<i32> },
    Abort,
    Put { key: String, body: String },
}

/// `MultipartStore` fake that records calls and can be scripted to fail.
#[derive(Default)]
pub(crate) struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    fail_begin: bool,
    failing_part: Option<i32>,
    fail_complete: bool,
    fail_put: bool,
    part_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingStore {
    pub fn with_failing_begin(mut self) -> Self {
        self.fail_begin = true;
        self
    }

    pub fn with_failing_part(mut self, part_number: i32) -> Self {
        self.failing_part = Some(part_number);
        self
    }

    pub fn with_failing_complete(mut self) -> Self {
        self.fail_complete = true;
        self
    }

    pub fn with_failing_put(mut self) -> Self {
        self.fail_put = true;
        self
    }

    pub fn with_part_delay(mut self, delay: Duration) -> Self {
        self.part_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight_observed(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MultipartStore for RecordingStore {
    async fn begin(&self, bucket: &str, key: &str, _content_type: &str) -> StorageResult<String> {
        if self.fail_begin {
            return Err(StorageError::Begin {
                key: key.to_string(),
                source: "simulated begin failure".into(),
            });
        }
        self.record(StoreCall::Begin {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        Ok("upload-1".to_string())
    }

    async fn upload_part(
        &self,
        _bucket: &str,
        key: &str,
        _upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> StorageResult<PartDescriptor> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.part_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_part == Some(part_number) {
            return Err(StorageError::UploadPart {
                key: key.to_string(),
                part_number,
                source: "simulated part failure".into(),
            });
        }

        self.record(StoreCall::PartResolved {
            part_number,
            size: body.len(),
        });
        Ok(PartDescriptor {
            part_number,
            etag: format!("etag-{}", part_number),
        })
    }

    async fn complete(
        &self,
        _bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartDescriptor],
    ) -> StorageResult<()> {
        if self.fail_complete {
            return Err(StorageError::Complete {
                key: key.to_string(),
                upload_id: upload_id.to_string(),
                source: "simulated complete failure".into(),
            });
        }
        self.record(StoreCall::Complete {
            parts: parts.iter().map(|p| p.part_number).collect(),
        });
        Ok(())
    }

    async fn abort(&self, _bucket: &str, _key: &str, _upload_id: &str) -> StorageResult<()> {
        self.record(StoreCall::Abort);
        Ok(())
    }

    async fn put_object(
        &self,
        _bucket: &str,
        key: &str,
        _content_type: &str,
        body: Bytes,
    ) -> StorageResult<()> {
        if self.fail_put {
            return Err(StorageError::Put {
                key: key.to_string(),
                source: "simulated put failure".into(),
            });
        }
        self.record(StoreCall::Put {
            key: key.to_string(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
        Ok(())
    }
}

/// `ChunkSource` fake replaying a scripted chunk sequence.
pub(crate) struct ScriptedSource {
    script: Mutex<Option<Vec<Result<Bytes, TransportError>>>>,
    fail_fetch: bool,
}

impl ScriptedSource {
    pub fn new(items: Vec<Result<Bytes, TransportError>>) -> Self {
        Self {
            script: Mutex::new(Some(items)),
            fail_fetch: false,
        }
    }

    /// A source whose connection cannot be established at all.
    pub fn unreachable() -> Self {
        Self {
            script: Mutex::new(None),
            fail_fetch: true,
        }
    }
}

#[async_trait]
impl ChunkSource for ScriptedSource {
    async fn fetch(&self) -> Result<ChunkStream, TransportError> {
        if self.fail_fetch {
            return Err(TransportError::Interrupted("no route to source".into()));
        }
        let items = self
            .script
            .lock()
            .unwrap()
            .take()
            .expect("scripted source is not restartable");
        Ok(futures::stream::iter(items).boxed())
    }
}

/// Build one owned chunk.
pub(crate) fn chunk(data: &[u8]) -> Bytes {
    Bytes::copy_from_slice(data)
}

/// Build an always-successful chunk stream from byte slices.
pub(crate) fn chunks(
    data: &[&[u8]],
) -> impl futures::Stream<Item = Result<Bytes, TransportError>> + Send + use<> {
    let items: Vec<Result<Bytes, TransportError>> =
        data.iter().map(|d| Ok(chunk(d))).collect();
    futures::stream::iter(items)
}
