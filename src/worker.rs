//! Background worker running processor calls off the UI loop.

use anyhow::{Context, Result, anyhow};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::mpsc;

use crate::{
    config::Config,
    remote::{HttpProcessor, Processor},
    workflow::{Completion, Request},
};

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Execute one workflow request.
    Run(Request),
    /// Rebuild the HTTP client and download target from new settings.
    SaveSettings(Config),
}

/// Events emitted by the worker for UI updates.
#[derive(Debug)]
pub enum WorkerEvent {
    /// A request finished (successfully or not).
    Completed(Completion),
    /// Informational log message.
    Log(String),
    /// Worker-level failure unrelated to a single request.
    Error(String),
}

/// Executes requests against a processor.
pub struct Executor<P> {
    processor: Arc<P>,
    downloads_dir: PathBuf,
}

impl<P: Processor> Executor<P> {
    pub fn new(processor: Arc<P>, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            processor,
            downloads_dir: downloads_dir.into(),
        }
    }

    /// Perform one request and describe its outcome.
    pub async fn execute(&self, req: Request) -> Completion {
        let p = &self.processor;
        match req {
            Request::NextIdentifier => Completion::NextIdentifier(p.next_identifier().await),
            Request::Infer { subject, filename } => Completion::Inferred {
                subject,
                result: p.infer_from_filename(&filename).await,
            },
            Request::RenderPreview {
                subject,
                file_name,
                payload,
            } => Completion::PreviewRendered {
                subject,
                result: p.render_preview(&file_name, payload).await,
            },
            Request::Submit {
                subject,
                submission,
            } => Completion::Submitted {
                subject,
                result: p.submit(submission).await,
            },
            Request::ProcessedPreview { subject, artifact } => {
                let result = p.fetch_processed_preview(&artifact).await;
                Completion::ProcessedPreview {
                    subject,
                    artifact,
                    result,
                }
            }
            Request::FetchArtifact { subject, artifact } => {
                let result = self.save_artifact(&artifact).await.map_err(|e| {
                    tracing::error!("download of {artifact} failed: {e:#}");
                    format!("{e:#}")
                });
                Completion::ArtifactSaved {
                    subject,
                    artifact,
                    result,
                }
            }
        }
    }

    /// Fetch an artifact and write it to the downloads directory.
    async fn save_artifact(&self, artifact: &str) -> Result<PathBuf> {
        // Never let a server-chosen name escape the downloads directory.
        let file_name = Path::new(artifact)
            .file_name()
            .ok_or_else(|| anyhow!("invalid artifact name '{artifact}'"))?;
        let bytes = self.processor.fetch_artifact(artifact).await?;

        tokio::fs::create_dir_all(&self.downloads_dir)
            .await
            .with_context(|| format!("cannot create {}", self.downloads_dir.display()))?;
        let path = self.downloads_dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        tracing::info!("saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

fn http_executor(cfg: &Config) -> Result<Arc<Executor<HttpProcessor>>> {
    let processor = HttpProcessor::new(&cfg.server.base_url, cfg.timeout())?;
    Ok(Arc::new(Executor::new(
        Arc::new(processor),
        cfg.downloads.dir.clone(),
    )))
}

/// Main worker loop: each request runs as its own task so slow calls
/// never hold up the others.
pub async fn run(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    cfg: Config,
) {
    tracing::info!("worker started against {}", cfg.server.base_url);

    let mut exec = match http_executor(&cfg) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("HTTP client init failed: {e}");
            let _ = tx
                .send(WorkerEvent::Error(format!("HTTP client init failed: {e}")))
                .await;
            return;
        }
    };

    while let Some(cmd) = rx.recv().await {
        match cmd {
            WorkerCmd::SaveSettings(new_cfg) => match http_executor(&new_cfg) {
                Ok(e) => {
                    tracing::info!("settings updated: {}", new_cfg.server.base_url);
                    exec = e;
                    let _ = tx.send(WorkerEvent::Log("settings updated".into())).await;
                }
                Err(e) => {
                    tracing::error!("settings rejected: {e}");
                    let _ = tx
                        .send(WorkerEvent::Error(format!("settings rejected: {e}")))
                        .await;
                }
            },
            WorkerCmd::Run(req) => {
                let exec = exec.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let done = exec.execute(req).await;
                    let _ = tx.send(WorkerEvent::Completed(done)).await;
                });
            }
        }
    }
    tracing::info!("worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{
        RemoteError,
        fake::{Call, FakeProcessor},
    };

    #[tokio::test]
    async fn artifact_names_cannot_escape_downloads_dir() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = dir.path().join("out");
        let fake = Arc::new(FakeProcessor::default());
        let exec = Executor::new(fake.clone(), &downloads);

        let done = exec
            .execute(Request::FetchArtifact {
                subject: uuid::Uuid::new_v4(),
                artifact: "../../etc/evil.pdf".into(),
            })
            .await;

        let Completion::ArtifactSaved { result, .. } = done else {
            panic!("unexpected completion {done:?}");
        };
        assert_eq!(result.unwrap(), downloads.join("evil.pdf"));
        assert!(!dir.path().join("etc").exists());
        assert_eq!(fake.calls(), vec![Call::Artifact("../../etc/evil.pdf".into())]);
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeProcessor::default();
        *fake.artifact.lock().unwrap() = Err(RemoteError::Status(404));
        let exec = Executor::new(Arc::new(fake), dir.path());

        let done = exec
            .execute(Request::FetchArtifact {
                subject: uuid::Uuid::new_v4(),
                artifact: "x.pdf".into(),
            })
            .await;

        let Completion::ArtifactSaved { result, .. } = done else {
            panic!("unexpected completion {done:?}");
        };
        assert_eq!(result.unwrap_err(), "server returned HTTP 404");
    }

    #[tokio::test]
    async fn run_loop_returns_completions() {
        let (tx_cmd, rx_cmd) = mpsc::channel(4);
        let (tx_ev, mut rx_ev) = mpsc::channel(4);
        let mut cfg = Config::default();
        // Nothing listens here; the request must fail fast rather than hang.
        cfg.server.base_url = "http://127.0.0.1:9/api".into();
        cfg.server.timeout_secs = 5;
        tokio::spawn(run(rx_cmd, tx_ev, cfg));

        tx_cmd
            .send(WorkerCmd::Run(Request::NextIdentifier))
            .await
            .unwrap();

        match rx_ev.recv().await {
            Some(WorkerEvent::Completed(Completion::NextIdentifier(Err(_)))) => {}
            other => panic!("unexpected event {other:?}"),
        }
    }
}
