//! Core data models for the product-sync job.
//!
//! These entities describe one transfer of the product CSV into object
//! storage: the transfer itself (identified by its start timestamp) and the
//! multipart upload session it drives.

pub mod multipart;
pub mod transfer;
