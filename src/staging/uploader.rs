//! Batched upload accumulation and flush (spec §4.10): replaces blocking
//! per-upload queue waits with a single batched submission per frame.

use std::sync::Mutex;

use crate::ids::ResourceId;

/// One queued upload request: write `data` into `dest` at `offset`.
pub struct UploadRequest {
    pub dest: ResourceId,
    pub offset: u64,
    pub data: Vec<u8>,
}

/// A handle to a submitted batch. `Wait` (here, [`BatchedUploader::is_complete`])
/// resolves once the transfer queue's timeline semaphore reaches
/// `semaphore_value`.
pub struct UploadTicket {
    batch: u64,
    semaphore_value: u64,
}

impl UploadTicket {
    pub fn batch(&self) -> u64 {
        self.batch
    }

    pub fn semaphore_value(&self) -> u64 {
        self.semaphore_value
    }
}

/// Accumulates upload requests and submits them as a single batch on
/// `Flush` (spec §4.10). The actual transfer-queue submission is supplied
/// by the caller via the `submit` closure passed to [`flush`](Self::flush);
/// this type only owns the batching and completion bookkeeping.
pub struct BatchedUploader {
    pending: Mutex<Vec<UploadRequest>>,
    next_batch: Mutex<u64>,
    completed_through: Mutex<u64>,
}

impl BatchedUploader {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            next_batch: Mutex::new(0),
            completed_through: Mutex::new(0),
        }
    }

    /// Queue `(destBuffer, offset, data)` for the next flush.
    pub fn upload(&self, dest: ResourceId, offset: u64, data: Vec<u8>) {
        self.pending.lock().unwrap().push(UploadRequest { dest, offset, data });
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Submit every queued request as one batch. `submit` is handed the
    /// drained requests and returns the timeline semaphore value the
    /// transfer queue will signal on completion.
    pub fn flush(&self, submit: impl FnOnce(&[UploadRequest]) -> u64) -> UploadTicket {
        let requests = std::mem::take(&mut *self.pending.lock().unwrap());

        let mut next_batch = self.next_batch.lock().unwrap();
        let batch = *next_batch;
        *next_batch += 1;
        drop(next_batch);

        let semaphore_value = submit(&requests);
        UploadTicket { batch, semaphore_value }
    }

    /// Record that the transfer queue's timeline semaphore has reached
    /// `value`.
    pub fn notify_completed(&self, value: u64) {
        let mut completed = self.completed_through.lock().unwrap();
        *completed = (*completed).max(value);
    }

    /// `Wait`: true once the ticket's semaphore value has been reached.
    pub fn is_complete(&self, ticket: &UploadTicket) -> bool {
        *self.completed_through.lock().unwrap() >= ticket.semaphore_value
    }
}

impl Default for BatchedUploader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::HandleMap;
    use crate::ids::ResourceId;

    fn fresh_resource_id() -> ResourceId {
        let mut ids: HandleMap<()> = HandleMap::new();
        crate::foundation::collections::TypedHandle::new(ids.insert(()))
    }

    #[test]
    fn flush_drains_pending_and_returns_an_incrementing_batch() {
        let uploader = BatchedUploader::new();
        uploader.upload(fresh_resource_id(), 0, vec![1, 2, 3]);
        uploader.upload(fresh_resource_id(), 4, vec![4, 5, 6]);
        assert_eq!(uploader.pending_count(), 2);

        let ticket = uploader.flush(|requests| {
            assert_eq!(requests.len(), 2);
            42
        });
        assert_eq!(uploader.pending_count(), 0);
        assert_eq!(ticket.batch(), 0);
        assert_eq!(ticket.semaphore_value(), 42);

        let second = uploader.flush(|_| 43);
        assert_eq!(second.batch(), 1);
    }

    #[test]
    fn wait_resolves_once_semaphore_reaches_ticket_value() {
        let uploader = BatchedUploader::new();
        let ticket = uploader.flush(|_| 10);
        assert!(!uploader.is_complete(&ticket));
        uploader.notify_completed(10);
        assert!(uploader.is_complete(&ticket));
    }
}
