//! HTTP client for the invoice processor API.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{
    Client, Response, StatusCode,
    multipart::{Form, Part},
};
use serde::{Deserialize, de::DeserializeOwned};
use std::{sync::Arc, time::Duration};

use super::{Inference, Processor, RemoteError, Submission};

/// Response of `GET /next-invoice-number`.
#[derive(Debug, Deserialize)]
struct NextNumberResp {
    success: bool,
    #[serde(rename = "invoiceNumber")]
    invoice_number: Option<String>,
    message: Option<String>,
}

/// Response of `POST /parse-filename`.
#[derive(Debug, Deserialize)]
struct ParseFilenameResp {
    success: bool,
    invoice_number: Option<String>,
    invoice_date: Option<String>,
    error: Option<String>,
}

/// Response of `POST /process-invoice`.
#[derive(Debug, Deserialize)]
struct ProcessResp {
    success: bool,
    filename: Option<String>,
    message: Option<String>,
}

/// Error body the server attaches to failed byte endpoints.
#[derive(Debug, Deserialize)]
struct ErrorResp {
    message: Option<String>,
}

/// Talks to the processor at `base_url` (e.g. `http://localhost:5000/api`).
#[derive(Clone, Debug)]
pub struct HttpProcessor {
    http: Client,
    base_url: String,
}

impl HttpProcessor {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// URL with the artifact name as an escaped trailing segment.
    fn artifact_url(&self, route: &str, artifact: &str) -> String {
        self.url(&format!("{route}/{}", urlencoding::encode(artifact)))
    }
}

#[async_trait]
impl Processor for HttpProcessor {
    async fn next_identifier(&self) -> Result<String, RemoteError> {
        let resp = self.http.get(self.url("next-invoice-number")).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        parse_next_identifier(status, &body)
    }

    async fn infer_from_filename(&self, filename: &str) -> Result<Inference, RemoteError> {
        let resp = self
            .http
            .post(self.url("parse-filename"))
            .json(&serde_json::json!({ "filename": filename }))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        parse_inference(status, &body)
    }

    async fn render_preview(
        &self,
        file_name: &str,
        payload: Arc<[u8]>,
    ) -> Result<Vec<u8>, RemoteError> {
        let form = Form::new().part("file", pdf_part(file_name, &payload)?);
        let resp = self
            .http
            .post(self.url("preview"))
            .multipart(form)
            .send()
            .await?;
        read_bytes(resp).await
    }

    async fn submit(&self, submission: Submission) -> Result<String, RemoteError> {
        let form = Form::new()
            .part(
                "file",
                pdf_part(&submission.file_name, &submission.payload)?,
            )
            .text("invoiceNumber", submission.identifier)
            .text("invoiceDate", submission.date.format("%Y-%m-%d").to_string())
            .text("customerABN", submission.tax_id)
            .text("excludeDiscount", submission.exclude_discount.to_string());

        tracing::info!("POST process-invoice ({})", submission.file_name);
        let resp = self
            .http
            .post(self.url("process-invoice"))
            .multipart(form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        parse_submission(status, &body)
    }

    async fn fetch_processed_preview(&self, artifact: &str) -> Result<Vec<u8>, RemoteError> {
        let resp = self
            .http
            .get(self.artifact_url("preview-processed", artifact))
            .send()
            .await?;
        read_bytes(resp).await
    }

    async fn fetch_artifact(&self, artifact: &str) -> Result<Vec<u8>, RemoteError> {
        let resp = self
            .http
            .get(self.artifact_url("download", artifact))
            .send()
            .await?;
        read_bytes(resp).await
    }
}

/// Multipart part carrying the PDF under its original name.
fn pdf_part(file_name: &str, payload: &[u8]) -> Result<Part, RemoteError> {
    Ok(Part::bytes(payload.to_vec())
        .file_name(file_name.to_string())
        .mime_str("application/pdf")?)
}

/// Collect a binary body, turning error statuses into `RemoteError`.
async fn read_bytes(resp: Response) -> Result<Vec<u8>, RemoteError> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if status.is_success() {
        return Ok(body.to_vec());
    }
    match serde_json::from_slice::<ErrorResp>(&body) {
        Ok(ErrorResp { message: Some(m) }) => Err(RemoteError::Rejected(m)),
        _ => Err(RemoteError::Status(status.as_u16())),
    }
}

/// Decode a JSON envelope; an unreadable error response reports its status.
fn decode<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, RemoteError> {
    match serde_json::from_slice::<T>(body) {
        Ok(v) => Ok(v),
        Err(_) if !status.is_success() => Err(RemoteError::Status(status.as_u16())),
        Err(e) => Err(RemoteError::Decode(e.to_string())),
    }
}

fn parse_next_identifier(status: StatusCode, body: &[u8]) -> Result<String, RemoteError> {
    let r: NextNumberResp = decode(status, body)?;
    match (r.success, r.invoice_number) {
        (true, Some(n)) if !n.is_empty() => Ok(n),
        (true, _) => Err(RemoteError::Decode("invoiceNumber missing".into())),
        (false, _) => Err(RemoteError::Rejected(
            r.message.unwrap_or_else(|| "no invoice number available".into()),
        )),
    }
}

fn parse_inference(status: StatusCode, body: &[u8]) -> Result<Inference, RemoteError> {
    let r: ParseFilenameResp = decode(status, body)?;
    if !r.success {
        return Err(RemoteError::Rejected(
            r.error.unwrap_or_else(|| "unknown error".into()),
        ));
    }
    let identifier = r
        .invoice_number
        .filter(|n| !n.is_empty())
        .ok_or_else(|| RemoteError::Decode("invoice_number missing".into()))?;
    let raw_date = r
        .invoice_date
        .ok_or_else(|| RemoteError::Decode("invoice_date missing".into()))?;
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
        .map_err(|e| RemoteError::Decode(format!("invoice_date '{raw_date}': {e}")))?;
    Ok(Inference { identifier, date })
}

fn parse_submission(status: StatusCode, body: &[u8]) -> Result<String, RemoteError> {
    let r: ProcessResp = decode(status, body)?;
    match (r.success, r.filename) {
        (true, Some(name)) if !name.is_empty() => Ok(name),
        (true, _) => Err(RemoteError::Decode("filename missing".into())),
        (false, _) => Err(RemoteError::Rejected(
            r.message.unwrap_or_else(|| "Processing failed".into()),
        )),
    }
}
