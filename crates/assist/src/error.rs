use calloutpad_core::EditError;
use thiserror::Error;

/// Rejected transform input. The messages are part of the wire contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Text is required and must be a non-empty string")]
    MissingText,
    #[error("Prompt is required and must be a non-empty string")]
    MissingPrompt,
}

/// A failed transform call as the caller sees it: an HTTP-style status and a
/// message for the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (status {status})")]
pub struct TransportError {
    pub status: u16,
    pub message: String,
}

impl TransportError {
    pub const BAD_REQUEST: u16 = 400;
    pub const INTERNAL: u16 = 500;

    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The body-could-not-be-processed failure.
    pub fn internal() -> Self {
        Self::new(Self::INTERNAL, "Failed to process request")
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

impl From<ValidationError> for TransportError {
    fn from(value: ValidationError) -> Self {
        Self::new(Self::BAD_REQUEST, value.to_string())
    }
}

/// Misuse of an assist session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssistError {
    #[error("assist session is {actual}, expected {expected}")]
    WrongState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("no assist session is open")]
    NoSession,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Edit(#[from] EditError),
}
