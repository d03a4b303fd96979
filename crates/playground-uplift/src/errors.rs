use playground_backend::BackendError;
use thiserror::Error;

/// Errors that surface to the caller instead of landing in a step's error list.
#[derive(Debug, Error)]
pub enum UpliftError {
    #[error("unknown class {0}")]
    UnknownStepType(String),
    #[error("unsupported input source '{0}'")]
    UnsupportedInputSource(String),
    #[error("unsupported editor mode '{0}'")]
    UnsupportedMode(String),
    #[error("{step_type} has no '{field}' field")]
    UnsupportedField {
        step_type: &'static str,
        field: String,
    },
    #[error("invalid step record: {0}")]
    InvalidRecord(String),
    #[error("invalid step index {index} (pipeline has {len} step(s))")]
    InvalidStepIndex { index: usize, len: usize },
    #[error("invalid share link: {0}")]
    ShareLink(String),
}

/// A fault raised by a step while executing. The run wrapper turns it into the
/// step's single error message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct StepFault {
    message: String,
}

pub const UNKNOWN_ERROR: &str = "Unknown error";

impl StepFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message to show the user; never empty.
    pub fn user_message(&self) -> &str {
        if self.message.trim().is_empty() {
            UNKNOWN_ERROR
        } else {
            &self.message
        }
    }
}

impl From<BackendError> for StepFault {
    fn from(error: BackendError) -> Self {
        Self::new(error.to_string())
    }
}
