use serde::{Deserialize, Serialize};

use crate::errors::SubmitError;

/// A message submitted through `POST /send`. Stored as-is; `receiver` is not
/// used for routing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredMessage {
    pub sender: String,
    pub receiver: String,
    pub content: String,
}

impl StructuredMessage {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            content: content.into(),
        }
    }
}

/// Decode a submission body.
///
/// Only the first JSON value is read; anything after it is ignored. Missing
/// fields decode as empty strings, unknown fields are skipped, and a bare
/// `null` yields an all-empty message. Field names are matched exactly.
pub fn decode_submission(body: &[u8]) -> Result<StructuredMessage, SubmitError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(SubmitError::EmptyBody);
    }

    let mut values =
        serde_json::Deserializer::from_slice(body).into_iter::<Option<StructuredMessage>>();
    match values.next() {
        Some(Ok(message)) => Ok(message.unwrap_or_default()),
        Some(Err(e)) => Err(e.into()),
        None => Err(SubmitError::EmptyBody),
    }
}
