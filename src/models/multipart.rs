//! Represents multipart upload sessions and parts.

/// A single confirmed part in a multipart upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDescriptor {
    /// Part number (1-based, contiguous at completion time).
    pub part_number: i32,

    /// Opaque ETag returned by the storage service for this part.
    pub etag: String,
}

/// An open multipart upload against one destination object.
///
/// Owned exclusively by the pipeline for the duration of one transfer. The
/// session is either open (accepting parts) or finalized (completed or
/// aborted), never both; no part is submitted once finalization begins.
#[derive(Debug)]
pub struct MultipartSession {
    /// Destination bucket.
    pub bucket: String,

    /// Destination object key.
    pub key: String,

    /// Opaque upload id handed out by the storage service.
    pub upload_id: String,

    /// Confirmed parts, in whatever order their uploads resolved.
    pub parts: Vec<PartDescriptor>,
}

impl MultipartSession {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, upload_id: String) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            upload_id,
            parts: Vec::new(),
        }
    }
}
