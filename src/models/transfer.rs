//! Represents one invocation-scoped transfer of the product CSV.

use chrono::Utc;

/// Key prefix shared by the import object and the sync marker.
pub const IMPORT_PREFIX: &str = "product-import";

/// Content type of the uploaded product CSV.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// A single transfer of the product CSV into object storage.
///
/// A transfer is identified by the epoch-seconds timestamp captured once at
/// job start. It lives only for the duration of one invocation; only its
/// artifacts (the uploaded object and the sync marker) are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Seconds since epoch, captured when the job started.
    pub started_at: i64,
}

impl Transfer {
    /// Capture a new transfer starting now (whole seconds, truncated).
    pub fn begin_now() -> Self {
        Self {
            started_at: Utc::now().timestamp(),
        }
    }

    /// Build a transfer for a known timestamp.
    pub fn from_timestamp(started_at: i64) -> Self {
        Self { started_at }
    }

    /// Destination object key for this transfer.
    ///
    /// Pure and deterministic: the same timestamp always yields the same key.
    pub fn object_key(&self) -> String {
        format!("{}/{}-products.csv", IMPORT_PREFIX, self.started_at)
    }
}
