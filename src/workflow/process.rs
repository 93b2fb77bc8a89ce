//! Submitting the active file for processing and applying the outcome.

use chrono::NaiveDate;
use uuid::Uuid;

use super::{Preview, ProcessingResult, Request, Workflow};
use crate::{
    clock::Clock,
    counter::CounterStorage,
    error::WorkflowError,
    remote::{RemoteError, Submission},
    status::StatusKind,
};

impl<S: CounterStorage, C: Clock> Workflow<S, C> {
    /// Validate the form and issue the transform request.
    ///
    /// Returns no request when a precondition fails or a request is already
    /// in flight; the reason goes to the status line.
    pub fn process(&mut self) -> Vec<Request> {
        match self.build_submission() {
            Ok((subject, submission)) => {
                self.submitting = Some(subject);
                self.preview = Preview::Hidden;
                self.notify(StatusKind::Info, "Processing invoice...");
                tracing::info!(
                    "submitting {} as invoice {} dated {}",
                    submission.file_name,
                    submission.identifier,
                    submission.date
                );
                vec![Request::Submit {
                    subject,
                    submission,
                }]
            }
            Err(e) => {
                self.fail(e);
                vec![]
            }
        }
    }

    fn build_submission(&self) -> Result<(Uuid, Submission), WorkflowError> {
        if self.submitting.is_some() {
            return Err(WorkflowError::AlreadyProcessing);
        }
        let file = self.file.as_ref().ok_or(WorkflowError::NoActiveFile)?;
        let identifier = self.form.identifier.trim();
        let raw_date = self.form.date.trim();
        if identifier.is_empty() || raw_date.is_empty() {
            return Err(WorkflowError::MissingFields);
        }
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            WorkflowError::InvalidDate {
                value: raw_date.to_string(),
            }
        })?;
        Ok((
            file.id,
            Submission {
                file_name: file.name.clone(),
                payload: file.payload.clone(),
                identifier: identifier.to_string(),
                date,
                tax_id: self.form.tax_id.trim().to_string(),
                exclude_discount: self.form.exclude_discount,
            },
        ))
    }

    pub(super) fn apply_submitted(
        &mut self,
        subject: Uuid,
        result: Result<String, RemoteError>,
    ) -> Vec<Request> {
        // Runs for every outcome, stale or not.
        self.submitting = None;

        if !self.is_current(subject) {
            match &result {
                Ok(name) => tracing::warn!("discarding artifact {name} for stale file {subject}"),
                Err(e) => tracing::warn!("discarding failure for stale file {subject}: {e}"),
            }
            return vec![];
        }

        match result {
            Ok(artifact) => {
                tracing::info!("processed into {artifact}");
                self.result = Some(ProcessingResult {
                    artifact: artifact.clone(),
                    has_preview: false,
                });
                self.processed_today = self.counter.increment(self.clock.today());
                self.notify(StatusKind::Success, "Invoice processed successfully!");
                vec![
                    Request::ProcessedPreview { subject, artifact },
                    Request::NextIdentifier,
                ]
            }
            Err(e) => {
                self.preview = Preview::Placeholder;
                self.fail(WorkflowError::Processing(e));
                vec![]
            }
        }
    }

    pub(super) fn apply_processed_preview(
        &mut self,
        subject: Uuid,
        artifact: &str,
        result: Result<Vec<u8>, RemoteError>,
    ) {
        let wanted = self.is_current(subject)
            && self.result.as_ref().is_some_and(|r| r.artifact == artifact);
        if !wanted {
            tracing::info!("dropping preview of {artifact}: result changed");
            return;
        }
        match result {
            Ok(bytes) => {
                self.preview = Preview::Processed(bytes);
                if let Some(r) = self.result.as_mut() {
                    r.has_preview = true;
                }
            }
            Err(e) => {
                tracing::warn!("processed preview failed: {e}");
                if self.preview == Preview::Hidden {
                    self.preview = Preview::Placeholder;
                }
            }
        }
    }
}
