//! File intake: validating a candidate and making it the active file.

use anyhow::{Context, Result};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use uuid::Uuid;

use super::{Preview, Request, Workflow};
use crate::{
    clock::Clock,
    counter::CounterStorage,
    error::WorkflowError,
    remote::RemoteError,
    status::StatusKind,
};

/// The only accepted MIME type.
pub const PDF_MIME: &str = "application/pdf";

/// How the candidate reached the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntakeSource {
    /// Path dropped (pasted) into the terminal.
    Drop,
    /// Path typed into the file prompt.
    Chooser,
}

/// A file offered for intake, not yet validated.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub payload: Arc<[u8]>,
    pub source: IntakeSource,
}

impl Candidate {
    /// Read a file from disk, deriving its MIME type from the extension.
    pub async fn from_path(path: &Path, source: IntakeSource) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            size: bytes.len() as u64,
            mime: mime_for_path(path).to_string(),
            payload: Arc::from(bytes),
            source,
        })
    }
}

/// MIME type guessed from a file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => PDF_MIME,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Turn pasted terminal text into a path.
///
/// Terminals paste dropped files as a path that may be quoted, prefixed with
/// `file://` or followed by a newline.
pub fn normalize_dropped_path(raw: &str) -> PathBuf {
    let s = raw.trim();
    let s = s
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| s.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(s);
    match s.strip_prefix("file://") {
        Some(uri) => match urlencoding::decode(uri) {
            Ok(decoded) => PathBuf::from(decoded.into_owned()),
            Err(_) => PathBuf::from(uri),
        },
        None => PathBuf::from(s),
    }
}

/// The document currently being worked on.
#[derive(Clone, Debug)]
pub struct ActiveFile {
    /// Identity checked against late responses.
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub payload: Arc<[u8]>,
}

/// Human-readable size, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

impl<S: CounterStorage, C: Clock> Workflow<S, C> {
    /// Make `candidate` the active file if it is a PDF.
    pub fn submit_candidate(&mut self, candidate: Candidate) -> Vec<Request> {
        if candidate.mime != PDF_MIME {
            tracing::warn!(
                "rejected {} ({}) from {:?}",
                candidate.name,
                candidate.mime,
                candidate.source
            );
            self.fail(WorkflowError::NotPdf {
                mime: candidate.mime,
            });
            return vec![];
        }

        let file = ActiveFile {
            id: Uuid::new_v4(),
            name: candidate.name,
            size: candidate.size,
            mime: candidate.mime,
            payload: candidate.payload,
        };
        tracing::info!(
            "intake {} ({}) via {:?} as {}",
            file.name,
            format_file_size(file.size),
            candidate.source,
            file.id
        );

        let mut requests = vec![Request::RenderPreview {
            subject: file.id,
            file_name: file.name.clone(),
            payload: file.payload.clone(),
        }];
        self.file = Some(file);
        self.result = None;
        self.preview = Preview::Placeholder;

        requests.extend(self.resolve());
        self.notify(StatusKind::Success, "File uploaded successfully");
        requests
    }

    /// Report a candidate that could not even be read.
    pub fn reject_unreadable(&mut self, err: &anyhow::Error) {
        tracing::warn!("intake read failed: {err:#}");
        self.notify(StatusKind::Error, format!("{err:#}"));
    }

    /// Forget the active file and anything derived from it.
    pub fn remove_candidate(&mut self) -> Vec<Request> {
        if let Some(f) = self.file.take() {
            tracing::info!("removed {} ({})", f.name, f.id);
        }
        self.result = None;
        self.preview = Preview::Placeholder;
        self.notify(StatusKind::Info, "File removed");
        vec![]
    }

    pub(super) fn apply_intake_preview(
        &mut self,
        subject: Uuid,
        result: Result<Vec<u8>, RemoteError>,
    ) {
        if !self.is_current(subject) {
            tracing::info!("dropping preview for stale file {subject}");
            return;
        }
        // Processing of this file has already taken over the pane.
        if self.submitting == Some(subject) || self.result.is_some() {
            return;
        }
        match result {
            Ok(bytes) => self.preview = Preview::Original(bytes),
            Err(e) => tracing::warn!("preview render failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testkit::*;
    use super::super::{ExtractionMode, Settings};
    use super::*;
    use crate::remote::fake::{Call, FakeProcessor};

    #[test]
    fn non_pdf_candidates_leave_active_file_untouched() {
        let (mut wf, _clock) = workflow(Settings::default());
        wf.submit_candidate(pdf("first.pdf"));
        let before = wf.file().map(|f| f.id);

        for mime in ["image/png", "text/plain", "application/octet-stream", ""] {
            let reqs = wf.submit_candidate(candidate("second.png", mime));
            assert!(reqs.is_empty(), "{mime}");
            assert_eq!(wf.file().map(|f| f.id), before, "{mime}");
            assert_eq!(
                status_of(&wf),
                Some((StatusKind::Error, "Please upload a PDF file".into()))
            );
        }
    }

    #[test]
    fn non_pdf_with_no_prior_file_keeps_process_disabled() {
        let (mut wf, _clock) = workflow(Settings::default());
        wf.submit_candidate(candidate("scan.jpg", "image/jpeg"));
        assert!(wf.file().is_none());
        assert!(!wf.can_process());
    }

    #[test]
    fn pdf_intake_requests_preview_only_in_manual_mode() {
        let (mut wf, _clock) = workflow(Settings::default());
        let reqs = wf.submit_candidate(pdf("a.pdf"));

        assert_eq!(reqs.len(), 1);
        assert!(matches!(&reqs[0], Request::RenderPreview { file_name, .. } if file_name == "a.pdf"));
        assert!(wf.can_process());
        assert_eq!(
            status_of(&wf),
            Some((StatusKind::Success, "File uploaded successfully".into()))
        );
    }

    #[test]
    fn pdf_intake_in_automatic_mode_also_infers() {
        let (mut wf, _clock) = workflow(Settings {
            auto_extract: true,
            ..Settings::default()
        });
        let reqs = wf.submit_candidate(pdf("WG_Invoice23432_X_9_Dec_2025_1116_am.pdf"));

        let infers: Vec<_> = reqs
            .iter()
            .filter_map(|r| match r {
                Request::Infer { filename, .. } => Some(filename.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(infers, vec!["WG_Invoice23432_X_9_Dec_2025_1116_am.pdf"]);
        assert_eq!(wf.mode(), ExtractionMode::Automatic);
    }

    #[tokio::test]
    async fn preview_arrives_and_is_shown() {
        let dir = tempfile::tempdir().unwrap();
        let (exec, fake) = executor(FakeProcessor::default(), dir.path());
        let (mut wf, _clock) = workflow(Settings::default());

        let reqs = wf.submit_candidate(pdf("a.pdf"));
        settle(&mut wf, &exec, reqs).await;

        assert_eq!(fake.calls(), vec![Call::RenderPreview("a.pdf".into())]);
        assert_eq!(wf.preview(), &Preview::Original(b"\x89PNG original".to_vec()));
    }

    #[tokio::test]
    async fn preview_failure_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeProcessor::default();
        *fake.preview.lock().unwrap() = Err(RemoteError::Status(500));
        let (exec, _fake) = executor(fake, dir.path());
        let (mut wf, _clock) = workflow(Settings::default());

        let reqs = wf.submit_candidate(pdf("a.pdf"));
        settle(&mut wf, &exec, reqs).await;

        assert_eq!(wf.preview(), &Preview::Placeholder);
        assert!(wf.file().is_some());
        assert_eq!(wf.status().map(|s| s.kind), Some(StatusKind::Success));
    }

    #[tokio::test]
    async fn late_preview_for_replaced_file_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (exec, _fake) = executor(FakeProcessor::default(), dir.path());
        let (mut wf, _clock) = workflow(Settings::default());

        let first = wf.submit_candidate(pdf("old.pdf"));
        let late = exec.execute(first[0].clone()).await;
        wf.submit_candidate(pdf("new.pdf"));
        wf.apply(late);

        assert_eq!(wf.file().map(|f| f.name.as_str()), Some("new.pdf"));
        assert_eq!(wf.preview(), &Preview::Placeholder);
    }

    #[tokio::test]
    async fn replacement_during_processing_still_shows_its_preview() {
        let dir = tempfile::tempdir().unwrap();
        let (exec, _fake) = executor(FakeProcessor::default(), dir.path());
        let (mut wf, _clock) = workflow(Settings::default());
        wf.edit_field(super::super::Field::Identifier, "380812351".into());
        wf.submit_candidate(pdf("old.pdf"));
        let reqs = wf.process();
        let in_flight = exec.execute(reqs[0].clone()).await;

        let reqs = wf.submit_candidate(pdf("new.pdf"));
        let preview = exec.execute(reqs[0].clone()).await;
        wf.apply(preview);
        assert_eq!(wf.preview(), &Preview::Original(b"\x89PNG original".to_vec()));
        assert!(wf.is_busy());

        assert!(wf.apply(in_flight).is_empty());
        assert_eq!(wf.file().map(|f| f.name.as_str()), Some("new.pdf"));
        assert_eq!(wf.preview(), &Preview::Original(b"\x89PNG original".to_vec()));
        assert!(wf.result().is_none());
        assert_eq!(wf.processed_today(), 0);
        assert!(wf.can_process());
    }

    #[test]
    fn remove_clears_file_result_and_preview() {
        let (mut wf, _clock) = workflow(Settings::default());
        wf.submit_candidate(pdf("a.pdf"));
        wf.preview = Preview::Original(vec![1]);
        wf.result = Some(super::super::ProcessingResult {
            artifact: "x.pdf".into(),
            has_preview: false,
        });

        let reqs = wf.remove_candidate();

        assert!(reqs.is_empty());
        assert!(wf.file().is_none());
        assert!(wf.result().is_none());
        assert_eq!(wf.preview(), &Preview::Placeholder);
        assert!(!wf.can_process());
        assert!(!wf.can_download());
        assert_eq!(
            status_of(&wf),
            Some((StatusKind::Info, "File removed".into()))
        );
    }

    #[test]
    fn replacing_the_file_invalidates_the_result() {
        let (mut wf, _clock) = workflow(Settings::default());
        wf.submit_candidate(pdf("a.pdf"));
        wf.result = Some(super::super::ProcessingResult {
            artifact: "x.pdf".into(),
            has_preview: true,
        });

        wf.submit_candidate(pdf("b.pdf"));
        assert!(wf.result().is_none());
        assert!(!wf.can_download());
    }

    #[tokio::test]
    async fn unreadable_path_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.pdf");
        let err = Candidate::from_path(&missing, IntakeSource::Chooser)
            .await
            .unwrap_err();

        let (mut wf, _clock) = workflow(Settings::default());
        wf.reject_unreadable(&err);
        let (kind, msg) = status_of(&wf).unwrap();
        assert_eq!(kind, StatusKind::Error);
        assert!(msg.starts_with("Could not read"), "{msg}");
    }

    #[tokio::test]
    async fn candidate_from_path_reads_bytes_and_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Invoice.PDF");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let c = Candidate::from_path(&path, IntakeSource::Drop).await.unwrap();
        assert_eq!(c.name, "Invoice.PDF");
        assert_eq!(c.size, 8);
        assert_eq!(c.mime, PDF_MIME);
        assert_eq!(c.source, IntakeSource::Drop);
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for_path(Path::new("a.pdf")), PDF_MIME);
        assert_eq!(mime_for_path(Path::new("a.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("pdf")), "application/octet-stream");
    }

    #[test]
    fn dropped_paths_are_unwrapped() {
        assert_eq!(
            normalize_dropped_path("'/tmp/my invoice.pdf'\n"),
            PathBuf::from("/tmp/my invoice.pdf")
        );
        assert_eq!(
            normalize_dropped_path("file:///tmp/my%20invoice.pdf"),
            PathBuf::from("/tmp/my invoice.pdf")
        );
        assert_eq!(
            normalize_dropped_path("\"/tmp/a.pdf\""),
            PathBuf::from("/tmp/a.pdf")
        );
    }

    #[test]
    fn file_sizes_read_like_the_web_client() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2_359_296), "2.25 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }
}
