//! Browser-side half of the contact pipeline: the HTTP client that persists
//! a submission and triggers the notification function, and the form
//! controller that drives it.

pub mod contact_form;
pub mod error;
pub mod submission;

pub use contact_form::{ContactFormController, FormOutcome, FormPhase, Notice};
pub use error::{Phase, SubmissionError};
pub use submission::{ContactBackend, HttpContactBackend, SubmissionClient, SubmissionOutcome};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
