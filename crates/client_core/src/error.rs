use std::fmt;

use shared::validation::FieldErrors;
use thiserror::Error;

/// Which network call an error interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Persist,
    Notify,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Persist => f.write_str("persist"),
            Phase::Notify => f.write_str("notify"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("submission failed validation ({} field(s))", .0.len())]
    Validation(FieldErrors),
    #[error("store write rejected: {0}")]
    Persistence(String),
    #[error("notification failed: {0}")]
    Notification(String),
    #[error("{phase} request failed: {source}")]
    Transport {
        phase: Phase,
        #[source]
        source: reqwest::Error,
    },
}

impl SubmissionError {
    /// The phase this error counts against; `None` for validation errors.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SubmissionError::Validation(_) => None,
            SubmissionError::Persistence(_) => Some(Phase::Persist),
            SubmissionError::Notification(_) => Some(Phase::Notify),
            SubmissionError::Transport { phase, .. } => Some(*phase),
        }
    }
}
