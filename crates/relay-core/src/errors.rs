/// Rejection of a `POST /send` body. Both variants are client errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("Request body is empty")]
    EmptyBody,
    #[error("{0}")]
    Decode(String),
}

impl SubmitError {
    /// HTTP status the submission endpoint answers with.
    pub fn status_code(&self) -> u16 {
        400
    }

    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::EmptyBody => "empty_body",
            Self::Decode(_) => "decode",
        }
    }
}

impl From<serde_json::Error> for SubmitError {
    fn from(e: serde_json::Error) -> Self {
        SubmitError::Decode(e.to_string())
    }
}

/// Failure on an established connection. Terminal for that connection only.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("read failed: {0}")]
    Read(String),
    #[error("write failed: {0}")]
    Write(String),
}

impl ChannelError {
    /// Short classification string for log fields.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Read(_) => "channel_read",
            Self::Write(_) => "channel_write",
        }
    }
}

/// The WebSocket handshake did not complete; no connection was created.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("upgrade failed: {0}")]
pub struct UpgradeError(pub String);
