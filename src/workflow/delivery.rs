//! Handing the processed artifact to the user.

use std::path::PathBuf;
use uuid::Uuid;

use super::{Request, Workflow};
use crate::{clock::Clock, counter::CounterStorage, error::WorkflowError, status::StatusKind};

impl<S: CounterStorage, C: Clock> Workflow<S, C> {
    /// Fetch the current artifact and save it locally.
    pub fn download(&mut self) -> Vec<Request> {
        let (Some(result), Some(file)) = (self.result.as_ref(), self.file.as_ref()) else {
            self.fail(WorkflowError::NoResult);
            return vec![];
        };
        tracing::info!("download requested for {}", result.artifact);
        vec![Request::FetchArtifact {
            subject: file.id,
            artifact: result.artifact.clone(),
        }]
    }

    pub(super) fn apply_artifact_saved(
        &mut self,
        subject: Uuid,
        artifact: &str,
        result: Result<PathBuf, String>,
    ) {
        if !self.is_current(subject) {
            // The bytes are on disk either way; only the message would be stale.
            tracing::info!("artifact {artifact} finished for previous file {subject}");
        }
        match result {
            Ok(path) => self.notify(
                StatusKind::Success,
                format!("Downloaded {artifact} to {}", path.display()),
            ),
            Err(detail) => self.fail(WorkflowError::Delivery(detail)),
        }
    }
}
