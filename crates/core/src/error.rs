use thiserror::Error;

/// Turn-level failures. Provider and geocoding failures never appear here:
/// they degrade into fixed sentences inside the response text.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("responder output could not be parsed into a structured result: {0}")]
    MalformedOutput(String),

    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl TurnError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedOutput(detail.into())
    }
}
