use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, Stream};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ingest::progress::ProgressSignal;
use crate::service::types::{decode_body, failure_detail, IngestResponseBody};
use crate::service::ServiceClient;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

const NETWORK_ERROR_MESSAGE: &str = "Network error during upload.";

/// A file selected for ingestion, held in memory. Clones share the buffer.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    content: Bytes,
    length_hint: Option<u64>,
}

impl UploadFile {
    pub fn from_bytes(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let length_hint = Some(content.len() as u64);
        Self {
            filename: filename.into(),
            content,
            length_hint,
        }
    }

    /// Content whose size the source never advertised (e.g. a pipe). Sent
    /// without a length, so progress is indeterminate.
    pub fn without_length(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            length_hint: None,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::validation(format!("Not a file: {}", path.display())))?;
        let content = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(filename, content))
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn length_hint(&self) -> Option<u64> {
        self.length_hint
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReceipt {
    /// `None` when the service answered 2xx without a usable count.
    pub chunks_indexed: Option<u64>,
    pub document_id: Option<String>,
    /// Indexing status as reported by the service, e.g. `indexed`.
    pub status: Option<String>,
}

impl UploadReceipt {
    pub fn chunks_label(&self) -> String {
        self.chunks_indexed
            .map(|chunks| chunks.to_string())
            .unwrap_or_else(|| "--".to_string())
    }

    pub fn document_label(&self) -> &str {
        self.document_id.as_deref().unwrap_or("--")
    }
}

/// Display text is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Server(String),
}

/// Transfers one file to the service.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Calls `on_progress` per transport tick and with `Percent(100)` exactly
    /// once on success, before returning.
    async fn upload(
        &self,
        file: &UploadFile,
        tenant_id: &str,
        api_key: &str,
        on_progress: &mut (dyn FnMut(ProgressSignal) + Send),
    ) -> std::result::Result<UploadReceipt, UploadError>;
}

/// `POST /ingest` with a streamed multipart body.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: ServiceClient,
    chunk_size: usize,
}

impl HttpUploader {
    pub fn new(client: ServiceClient, chunk_size: usize) -> Self {
        Self {
            client,
            chunk_size: chunk_size.max(1),
        }
    }

    fn build_form(
        &self,
        file: &UploadFile,
        tenant_id: &str,
        progress: mpsc::UnboundedSender<ProgressSignal>,
    ) -> Form {
        let stream = progress_stream(file.content.clone(), self.chunk_size, file.length_hint, progress);
        let body = Body::wrap_stream(stream);
        let part = match file.length_hint {
            Some(length) => Part::stream_with_length(body, length),
            None => Part::stream(body),
        }
        .file_name(file.filename.clone());

        Form::new()
            .text("tenant_id", tenant_id.to_string())
            .part("file", part)
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(
        &self,
        file: &UploadFile,
        tenant_id: &str,
        api_key: &str,
        on_progress: &mut (dyn FnMut(ProgressSignal) + Send),
    ) -> std::result::Result<UploadReceipt, UploadError> {
        debug!("Uploading {} ({} bytes)", file.filename, file.len());

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let form = self.build_form(file, tenant_id, sender);
        let request = self.client.post_multipart("ingest", api_key, form);
        tokio::pin!(request);

        let response = loop {
            tokio::select! {
                Some(signal) = receiver.recv() => on_progress(signal),
                response = &mut request => break response,
            }
        };
        while let Ok(signal) = receiver.try_recv() {
            on_progress(signal);
        }

        let raw = response.map_err(|e| {
            warn!("Upload of {} failed in transport: {}", file.filename, e);
            UploadError::Network(NETWORK_ERROR_MESSAGE.to_string())
        })?;

        if !raw.is_success() {
            let status = raw.status;
            let detail = failure_detail(&raw.text, || format!("Upload failed ({}).", status));
            warn!("Upload of {} rejected ({}): {}", file.filename, status, detail);
            return Err(UploadError::Server(detail));
        }

        on_progress(ProgressSignal::Percent(100));

        let body: IngestResponseBody = decode_body(&raw.text).unwrap_or_default();
        let receipt = UploadReceipt {
            chunks_indexed: body.chunks_indexed,
            document_id: body.document_id,
            status: body.status,
        };
        info!(
            document_id = receipt.document_label(),
            status = receipt.status.as_deref().unwrap_or("--"),
            "Ingested {} ({} chunks)",
            file.filename,
            receipt.chunks_label()
        );
        Ok(receipt)
    }
}

/// Splits `content` into transport chunks and emits one signal per chunk
/// handed to the connection. Ticks stop at 99; 100 is reserved for the
/// service's acknowledgement.
fn progress_stream(
    content: Bytes,
    chunk_size: usize,
    length_hint: Option<u64>,
    progress: mpsc::UnboundedSender<ProgressSignal>,
) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> + Send + 'static {
    let len = content.len();
    let mut sent: u64 = 0;

    stream::iter((0..len).step_by(chunk_size).map(move |start| {
        let chunk = content.slice(start..(start + chunk_size).min(len));
        sent += chunk.len() as u64;
        let signal = match length_hint {
            Some(total) if total > 0 => ProgressSignal::Percent(transfer_percent(sent, total)),
            _ => ProgressSignal::Indeterminate,
        };
        // The receiver is gone once the request resolved; nothing to report then.
        let _ = progress.send(signal);
        Ok(chunk)
    }))
}

fn transfer_percent(sent: u64, total: u64) -> u8 {
    let percent = (sent as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 99.0) as u8
}
