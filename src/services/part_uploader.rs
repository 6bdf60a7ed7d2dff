//! Storage-facing side of the transfer: the multipart upload protocol plus
//! the single-object put used for the sync marker.
//!
//! `MultipartStore` is the seam between the pipeline and the storage service,
//! so the pipeline can be exercised against a recording fake. `S3Store` is
//! the production implementation on top of `aws-sdk-s3`.

use crate::models::multipart::PartDescriptor;
use async_trait::async_trait;
use aws_sdk_s3::{
    primitives::ByteStream,
    types::{CompletedMultipartUpload, CompletedPart},
};
use bytes::Bytes;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to start multipart upload for `{key}`")]
    Begin {
        key: String,
        #[source]
        source: BoxError,
    },
    #[error("multipart upload for `{key}` returned no upload id")]
    MissingUploadId { key: String },
    #[error("failed to upload part {part_number} of `{key}`")]
    UploadPart {
        key: String,
        part_number: i32,
        #[source]
        source: BoxError,
    },
    #[error("part {part_number} of `{key}` returned no etag")]
    MissingEtag { key: String, part_number: i32 },
    #[error("failed to complete multipart upload `{upload_id}` for `{key}`")]
    Complete {
        key: String,
        upload_id: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to abort multipart upload `{upload_id}` for `{key}`")]
    Abort {
        key: String,
        upload_id: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to write object `{key}`")]
    Put {
        key: String,
        #[source]
        source: BoxError,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Multipart upload protocol against the storage service, plus a plain
/// single-object put.
///
/// `upload_part` calls are independent: they may be issued concurrently as
/// long as part numbers are unique. `complete` requires the full, contiguous,
/// ascending part list. `abort` is best-effort cleanup on the failure path.
#[async_trait]
pub trait MultipartStore: Send + Sync {
    /// Open a multipart upload session and return its upload id.
    async fn begin(&self, bucket: &str, key: &str, content_type: &str) -> StorageResult<String>;

    /// Upload one numbered part and return its descriptor.
    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> StorageResult<PartDescriptor>;

    /// Assemble the uploaded parts into the final object.
    ///
    /// `parts` must be sorted ascending by part number and contiguous from 1.
    async fn complete(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartDescriptor],
    ) -> StorageResult<()>;

    /// Cancel the session and discard uploaded parts.
    async fn abort(&self, bucket: &str, key: &str, upload_id: &str) -> StorageResult<()>;

    /// Write a small object in one request, overwriting any previous version.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> StorageResult<()>;
}

/// `MultipartStore` backed by the AWS S3 API.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MultipartStore for S3Store {
    async fn begin(&self, bucket: &str, key: &str, content_type: &str) -> StorageResult<String> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| StorageError::Begin {
                key: key.to_string(),
                source: Box::new(err),
            })?;

        output
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| StorageError::MissingUploadId {
                key: key.to_string(),
            })
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> StorageResult<PartDescriptor> {
        let output = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StorageError::UploadPart {
                key: key.to_string(),
                part_number,
                source: Box::new(err),
            })?;

        let etag = output
            .e_tag()
            .map(str::to_string)
            .ok_or(StorageError::MissingEtag {
                key: key.to_string(),
                part_number,
            })?;

        tracing::debug!(key, part_number, %etag, "part upload confirmed");

        Ok(PartDescriptor { part_number, etag })
    }

    async fn complete(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartDescriptor],
    ) -> StorageResult<()> {
        let completed = parts
            .iter()
            .map(|part| {
                CompletedPart::builder()
                    .part_number(part.part_number)
                    .e_tag(&part.etag)
                    .build()
            })
            .collect::<Vec<_>>();

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|err| StorageError::Complete {
                key: key.to_string(),
                upload_id: upload_id.to_string(),
                source: Box::new(err),
            })?;

        Ok(())
    }

    async fn abort(&self, bucket: &str, key: &str, upload_id: &str) -> StorageResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|err| StorageError::Abort {
                key: key.to_string(),
                upload_id: upload_id.to_string(),
                source: Box::new(err),
            })?;

        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StorageError::Put {
                key: key.to_string(),
                source: Box::new(err),
            })?;

        Ok(())
    }
}
