//! Boundary to the remote invoice processor.

/// reqwest implementation of [`Processor`].
pub mod http;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

pub use http::HttpProcessor;

/// Why a remote call did not produce a usable answer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The processor answered and said no.
    #[error("{0}")]
    Rejected(String),
    /// Non-success HTTP status without a readable explanation.
    #[error("server returned HTTP {0}")]
    Status(u16),
    /// The request never got an answer.
    #[error("{0}")]
    Transport(String),
    /// The answer could not be understood.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            RemoteError::Status(status.as_u16())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

/// Identifier and date the server read out of a filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inference {
    pub identifier: String,
    pub date: NaiveDate,
}

/// Everything a transform request sends along with the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub file_name: String,
    pub payload: Arc<[u8]>,
    pub identifier: String,
    pub date: NaiveDate,
    /// Customer tax identifier; empty when not given.
    pub tax_id: String,
    pub exclude_discount: bool,
}

/// The six calls the client makes against the processor.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn next_identifier(&self) -> Result<String, RemoteError>;

    async fn infer_from_filename(&self, filename: &str) -> Result<Inference, RemoteError>;

    async fn render_preview(
        &self,
        file_name: &str,
        payload: Arc<[u8]>,
    ) -> Result<Vec<u8>, RemoteError>;

    /// Returns the server-assigned artifact name.
    async fn submit(&self, submission: Submission) -> Result<String, RemoteError>;

    async fn fetch_processed_preview(&self, artifact: &str) -> Result<Vec<u8>, RemoteError>;

    async fn fetch_artifact(&self, artifact: &str) -> Result<Vec<u8>, RemoteError>;
}

#[cfg(test)]
pub mod fake {
    //! Scripted processor that records every call.

    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Call {
        NextIdentifier,
        Infer(String),
        RenderPreview(String),
        Submit(Submission),
        ProcessedPreview(String),
        Artifact(String),
    }

    /// Answers come from the public fields; every call is logged in `calls`.
    pub struct FakeProcessor {
        pub next_identifier: Mutex<Result<String, RemoteError>>,
        pub inference: Mutex<Result<Inference, RemoteError>>,
        pub preview: Mutex<Result<Vec<u8>, RemoteError>>,
        pub submit: Mutex<Result<String, RemoteError>>,
        pub processed_preview: Mutex<Result<Vec<u8>, RemoteError>>,
        pub artifact: Mutex<Result<Vec<u8>, RemoteError>>,
        calls: Mutex<Vec<Call>>,
    }

    impl Default for FakeProcessor {
        fn default() -> Self {
            Self {
                next_identifier: Mutex::new(Ok("380812351".into())),
                inference: Mutex::new(Err(RemoteError::Rejected(
                    "Could not find invoice number in filename".into(),
                ))),
                preview: Mutex::new(Ok(b"\x89PNG original".to_vec())),
                submit: Mutex::new(Ok("invoice_380812351_20240615_101500.pdf".into())),
                processed_preview: Mutex::new(Ok(b"\x89PNG processed".to_vec())),
                artifact: Mutex::new(Ok(b"%PDF-1.7 processed".to_vec())),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl FakeProcessor {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl Processor for FakeProcessor {
        async fn next_identifier(&self) -> Result<String, RemoteError> {
            self.record(Call::NextIdentifier);
            self.next_identifier.lock().unwrap().clone()
        }

        async fn infer_from_filename(&self, filename: &str) -> Result<Inference, RemoteError> {
            self.record(Call::Infer(filename.to_string()));
            self.inference.lock().unwrap().clone()
        }

        async fn render_preview(
            &self,
            file_name: &str,
            _payload: Arc<[u8]>,
        ) -> Result<Vec<u8>, RemoteError> {
            self.record(Call::RenderPreview(file_name.to_string()));
            self.preview.lock().unwrap().clone()
        }

        async fn submit(&self, submission: Submission) -> Result<String, RemoteError> {
            self.record(Call::Submit(submission));
            self.submit.lock().unwrap().clone()
        }

        async fn fetch_processed_preview(&self, artifact: &str) -> Result<Vec<u8>, RemoteError> {
            self.record(Call::ProcessedPreview(artifact.to_string()));
            self.processed_preview.lock().unwrap().clone()
        }

        async fn fetch_artifact(&self, artifact: &str) -> Result<Vec<u8>, RemoteError> {
            self.record(Call::Artifact(artifact.to_string()));
            self.artifact.lock().unwrap().clone()
        }
    }
}
