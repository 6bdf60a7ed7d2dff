//! Service layer: the streaming source, the storage-facing uploader, the
//! pipeline that wires them together, and the job that sequences a full sync.

pub mod chunk_source;
pub mod part_uploader;
pub mod sync_job;
pub mod sync_marker;
pub mod transfer_pipeline;

#[cfg(test)]
pub(crate) mod testing;
