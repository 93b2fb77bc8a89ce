//! Error taxonomy of the invoice workflow.
//!
//! Every variant's `Display` text is what ends up on the status line, so the
//! messages are written for the person at the keyboard.

use thiserror::Error;

use crate::remote::RemoteError;

/// Broad failure classes that decide how far an error propagates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Detected locally, no request was made.
    Validation,
    /// Filename inference failed; forces manual mode.
    Inference,
    /// The transform request was rejected or never completed.
    Processing,
    /// Fetching or saving an artifact failed.
    Delivery,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    // ── Validation ──────────────────────────────────────────────────────
    #[error("Please upload a PDF file")]
    NotPdf { mime: String },

    #[error("Please upload a PDF file first")]
    NoActiveFile,

    #[error("Please fill in all required fields")]
    MissingFields,

    #[error("Invoice date must be a valid date (YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error("An invoice is already being processed")]
    AlreadyProcessing,

    #[error("No processed file available")]
    NoResult,

    // ── Remote ──────────────────────────────────────────────────────────
    #[error("Failed to extract: {0}")]
    InferenceRejected(String),

    #[error("Failed to parse filename: {0}")]
    InferenceUnavailable(RemoteError),

    #[error("Processing failed: {0}")]
    Processing(RemoteError),

    #[error("Download failed: {0}")]
    Delivery(String),
}

impl WorkflowError {
    pub fn class(&self) -> ErrorClass {
        match self {
            WorkflowError::NotPdf { .. }
            | WorkflowError::NoActiveFile
            | WorkflowError::MissingFields
            | WorkflowError::InvalidDate { .. }
            | WorkflowError::AlreadyProcessing
            | WorkflowError::NoResult => ErrorClass::Validation,
            WorkflowError::InferenceRejected(_) | WorkflowError::InferenceUnavailable(_) => {
                ErrorClass::Inference
            }
            WorkflowError::Processing(_) => ErrorClass::Processing,
            WorkflowError::Delivery(_) => ErrorClass::Delivery,
        }
    }

    /// Classify an inference failure by whether the server answered.
    pub fn inference(err: RemoteError) -> Self {
        match err {
            RemoteError::Rejected(msg) => WorkflowError::InferenceRejected(msg),
            other => WorkflowError::InferenceUnavailable(other),
        }
    }
}
