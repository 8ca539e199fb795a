//! # Staging
//!
//! Pre-warmed staging buffer chunks and batched transfer-queue uploads
//! (spec §4.10). Sits below the scheduler: the executor's transfer-bound
//! virtual tasks acquire chunks and queue uploads here rather than
//! blocking per upload.

mod pool;
mod uploader;

pub use pool::{ChunkSize, StagingBufferPool, StagingChunk, StagingError};
pub use uploader::{BatchedUploader, UploadRequest, UploadTicket};
