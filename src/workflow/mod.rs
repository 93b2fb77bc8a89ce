//! Client-side invoice workflow: one state record, one update path.
//!
//! Every user operation is a synchronous method that mutates the record and
//! returns the [`Request`]s it wants sent to the processor. Whatever executes
//! those requests hands the answers back through [`Workflow::apply`], which
//! is the only place remote results touch the state. File-bound requests
//! carry the identity of the file they were issued for, so a late answer for
//! a file that has since been removed or replaced is dropped instead of
//! being applied to the new one.

pub mod delivery;
pub mod intake;
pub mod metadata;
pub mod process;

use chrono::NaiveDate;
use std::{path::PathBuf, sync::Arc, time::Duration};
use uuid::Uuid;

use crate::{
    clock::Clock,
    counter::{CounterStorage, CounterStore},
    error::WorkflowError,
    remote::{Inference, RemoteError, Submission},
    status::{Notifier, Status, StatusKind},
};

pub use intake::{ActiveFile, Candidate, IntakeSource, format_file_size};
pub use metadata::{ExtractionMode, Field};

/// Initial values taken from the config file.
#[derive(Clone, Debug)]
pub struct Settings {
    pub auto_extract: bool,
    pub exclude_discount: bool,
    pub status_ttl: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_extract: false,
            exclude_discount: true,
            status_ttl: crate::status::DEFAULT_TTL,
        }
    }
}

/// Work for the processor, produced by workflow operations.
#[derive(Clone, Debug)]
pub enum Request {
    NextIdentifier,
    Infer {
        subject: Uuid,
        filename: String,
    },
    RenderPreview {
        subject: Uuid,
        file_name: String,
        payload: Arc<[u8]>,
    },
    Submit {
        subject: Uuid,
        submission: Submission,
    },
    ProcessedPreview {
        subject: Uuid,
        artifact: String,
    },
    FetchArtifact {
        subject: Uuid,
        artifact: String,
    },
}

/// Outcome of a [`Request`], fed back through [`Workflow::apply`].
#[derive(Clone, Debug)]
pub enum Completion {
    NextIdentifier(Result<String, RemoteError>),
    Inferred {
        subject: Uuid,
        result: Result<Inference, RemoteError>,
    },
    PreviewRendered {
        subject: Uuid,
        result: Result<Vec<u8>, RemoteError>,
    },
    Submitted {
        subject: Uuid,
        result: Result<String, RemoteError>,
    },
    ProcessedPreview {
        subject: Uuid,
        artifact: String,
        result: Result<Vec<u8>, RemoteError>,
    },
    ArtifactSaved {
        subject: Uuid,
        artifact: String,
        /// Saved location, or why fetching or writing failed.
        result: Result<PathBuf, String>,
    },
}

/// What the preview pane shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Preview {
    /// Nothing to show yet.
    Placeholder,
    /// Blank while a transform is running.
    Hidden,
    /// Rendering of the file as uploaded.
    Original(Vec<u8>),
    /// Rendering of the processed artifact.
    Processed(Vec<u8>),
}

/// Artifact produced by a successful transform of the active file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessingResult {
    pub artifact: String,
    pub has_preview: bool,
}

/// Editable invoice fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Form {
    pub identifier: String,
    /// `YYYY-MM-DD`; kept as typed until a request needs it.
    pub date: String,
    /// Customer tax identifier (ABN); optional.
    pub tax_id: String,
    pub exclude_discount: bool,
}

/// The workflow-state record and the controllers that operate on it.
#[derive(Debug)]
pub struct Workflow<S, C> {
    file: Option<ActiveFile>,
    result: Option<ProcessingResult>,
    mode: ExtractionMode,
    form: Form,
    suggestion: Option<String>,
    preview: Preview,
    /// File whose transform request is in flight.
    submitting: Option<Uuid>,
    processed_today: u32,
    counter: CounterStore<S>,
    notifier: Notifier,
    clock: C,
}

impl<S: CounterStorage, C: Clock> Workflow<S, C> {
    pub fn new(storage: S, clock: C, settings: &Settings) -> Self {
        let mode = if settings.auto_extract {
            ExtractionMode::Automatic
        } else {
            ExtractionMode::Manual
        };
        Self {
            file: None,
            result: None,
            mode,
            form: Form {
                date: format_date(clock.today()),
                exclude_discount: settings.exclude_discount,
                ..Form::default()
            },
            suggestion: None,
            preview: Preview::Placeholder,
            submitting: None,
            processed_today: 0,
            counter: CounterStore::new(storage),
            notifier: Notifier::new(settings.status_ttl),
            clock,
        }
    }

    /// Initial load: today's count and the first identifier suggestion.
    pub fn start(&mut self) -> Vec<Request> {
        self.processed_today = self.counter.load(self.clock.today());
        self.form.date = format_date(self.clock.today());
        tracing::info!("workflow started, {} processed today", self.processed_today);
        vec![Request::NextIdentifier]
    }

    /// Expire a timed-out status message.
    pub fn tick(&mut self) {
        self.notifier.expire(self.clock.now());
    }

    /// Apply the outcome of a request. Returns any follow-up requests.
    pub fn apply(&mut self, completion: Completion) -> Vec<Request> {
        match completion {
            Completion::NextIdentifier(result) => {
                self.apply_next_identifier(result);
                vec![]
            }
            Completion::Inferred { subject, result } => self.apply_inference(subject, result),
            Completion::PreviewRendered { subject, result } => {
                self.apply_intake_preview(subject, result);
                vec![]
            }
            Completion::Submitted { subject, result } => self.apply_submitted(subject, result),
            Completion::ProcessedPreview {
                subject,
                artifact,
                result,
            } => {
                self.apply_processed_preview(subject, &artifact, result);
                vec![]
            }
            Completion::ArtifactSaved {
                subject,
                artifact,
                result,
            } => {
                self.apply_artifact_saved(subject, &artifact, result);
                vec![]
            }
        }
    }

    fn apply_next_identifier(&mut self, result: Result<String, RemoteError>) {
        match result {
            Ok(next) => {
                if self.mode == ExtractionMode::Manual {
                    self.form.identifier = next.clone();
                }
                self.suggestion = Some(next);
            }
            Err(e) => {
                tracing::error!("next invoice number failed: {e}");
                self.notify(
                    StatusKind::Error,
                    "Failed to fetch invoice number. Using default.",
                );
            }
        }
    }

    /// True when `subject` is still the active file.
    fn is_current(&self, subject: Uuid) -> bool {
        self.file.as_ref().is_some_and(|f| f.id == subject)
    }

    fn notify(&mut self, kind: StatusKind, message: impl Into<String>) {
        let now = self.clock.now();
        self.notifier.show(kind, message, now);
    }

    fn fail(&mut self, err: WorkflowError) {
        tracing::warn!("{:?} error: {err}", err.class());
        self.notify(StatusKind::Error, err.to_string());
    }

    pub fn file(&self) -> Option<&ActiveFile> {
        self.file.as_ref()
    }

    pub fn result(&self) -> Option<&ProcessingResult> {
        self.result.as_ref()
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Last next-identifier suggestion from the server.
    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    /// A transform request is in flight.
    pub fn is_busy(&self) -> bool {
        self.submitting.is_some()
    }

    pub fn can_process(&self) -> bool {
        self.file.is_some() && self.submitting.is_none()
    }

    pub fn can_download(&self) -> bool {
        self.result.is_some()
    }

    pub fn processed_today(&self) -> u32 {
        self.processed_today
    }

    pub fn status(&self) -> Option<&Status> {
        self.notifier.current()
    }
}

/// Format a date the way the date field holds it.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}


#[cfg(test)]
mod tests {
    use super::testkit::*;
    use super::*;
    use crate::remote::fake::{Call, FakeProcessor};

    #[test]
    fn new_workflow_defaults() {
        let (wf, _clock) = workflow(Settings::default());
        assert_eq!(wf.form().date, "2024-06-15");
        assert_eq!(wf.mode(), ExtractionMode::Manual);
        assert!(wf.form().exclude_discount);
        assert_eq!(wf.preview(), &Preview::Placeholder);
        assert!(!wf.can_process());
        assert!(!wf.can_download());
        assert!(wf.status().is_none());
    }

    #[tokio::test]
    async fn start_loads_counter_and_fills_suggested_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let (exec, fake) = executor(FakeProcessor::default(), dir.path());
        let (mut wf, _clock) = workflow(Settings::default());

        let reqs = wf.start();
        settle(&mut wf, &exec, reqs).await;

        assert_eq!(fake.calls(), vec![Call::NextIdentifier]);
        assert_eq!(wf.suggestion(), Some("380812351"));
        assert_eq!(wf.form().identifier, "380812351");
        assert_eq!(wf.processed_today(), 0);
    }

    #[tokio::test]
    async fn next_identifier_failure_keeps_prior_value() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeProcessor::default();
        *fake.next_identifier.lock().unwrap() =
            Err(RemoteError::Transport("connection refused".into()));
        let (exec, _fake) = executor(fake, dir.path());
        let (mut wf, _clock) = workflow(Settings::default());
        wf.edit_field(Field::Identifier, "42".into());

        let reqs = wf.start();
        settle(&mut wf, &exec, reqs).await;

        assert_eq!(wf.form().identifier, "42");
        assert_eq!(wf.suggestion(), None);
        assert_eq!(
            status_of(&wf),
            Some((
                StatusKind::Error,
                "Failed to fetch invoice number. Using default.".into()
            ))
        );
    }

    #[tokio::test]
    async fn suggestion_does_not_overwrite_identifier_in_automatic_mode() {
        let dir = tempfile::tempdir().unwrap();
        let (exec, _fake) = executor(FakeProcessor::default(), dir.path());
        let (mut wf, _clock) = workflow(Settings {
            auto_extract: true,
            ..Settings::default()
        });

        let reqs = wf.start();
        settle(&mut wf, &exec, reqs).await;

        assert_eq!(wf.suggestion(), Some("380812351"));
        assert_eq!(wf.form().identifier, "");
    }

    #[test]
    fn success_status_clears_after_five_seconds() {
        let (mut wf, clock) = workflow(Settings::default());
        wf.submit_candidate(pdf("a.pdf"));
        assert!(wf.status().is_some());

        clock.advance(Duration::from_secs(5));
        wf.tick();
        assert!(wf.status().is_none());
    }
}
