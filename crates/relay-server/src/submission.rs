//! Append-only log of messages submitted through `POST /send`.

use parking_lot::Mutex;
use relay_core::{decode_submission, StructuredMessage, SubmitError};

/// In-memory submission log. Insertion order is arrival order; nothing is
/// ever removed.
#[derive(Default)]
pub struct SubmissionLog {
    entries: Mutex<Vec<StructuredMessage>>,
}

impl SubmissionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return the new log length.
    pub fn append(&self, message: StructuredMessage) -> usize {
        let mut entries = self.entries.lock();
        entries.push(message);
        entries.len()
    }

    /// Decode a raw request body and append it.
    pub fn submit(&self, body: &[u8]) -> Result<usize, SubmitError> {
        let message = decode_submission(body)?;
        Ok(self.append(message))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of the current entries, oldest first.
    pub fn entries(&self) -> Vec<StructuredMessage> {
        self.entries.lock().clone()
    }

    pub fn last(&self) -> Option<StructuredMessage> {
        self.entries.lock().last().cloned()
    }
}
