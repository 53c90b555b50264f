use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::app::notify::{NotificationSink, Tone};
use crate::chat::{ChatError, ChatExchange, ChatOrchestrator};
use crate::ingest::{
    BatchIngestCoordinator, BatchSummary, ProgressSignal, ProgressTracker, ProgressView, UploadError,
    UploadFile, UploadReceipt, Uploader,
};
use crate::service::{ServiceClient, TenantCreated};
use crate::session::{ReadinessStatus, SessionState};

pub const INGEST_NOT_READY_MESSAGE: &str = "Connect a tenant and API key before ingesting.";

/// Result of one ingest action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestReport {
    Single {
        filename: String,
        result: Result<UploadReceipt, UploadError>,
    },
    Batch(BatchSummary),
}

/// Operator-facing controller: every action reads the current session,
/// talks to the service and reports through the sink and progress view.
pub struct Workbench<N, V> {
    session: SessionState,
    client: ServiceClient,
    uploader: Arc<dyn Uploader>,
    chat: ChatOrchestrator,
    tracker: ProgressTracker,
    sink: N,
    view: V,
}

impl<N, V> Workbench<N, V>
where
    N: NotificationSink,
    V: ProgressView + Send,
{
    pub fn new(
        session: SessionState,
        client: ServiceClient,
        uploader: Arc<dyn Uploader>,
        progress_hold: Duration,
        sink: N,
        view: V,
    ) -> Self {
        Self {
            session,
            chat: ChatOrchestrator::new(client.clone()),
            client,
            uploader,
            tracker: ProgressTracker::new(progress_hold),
            sink,
            view,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn into_parts(self) -> (N, V) {
        (self.sink, self.view)
    }

    /// Stores the triple as given and reports readiness. Never refuses.
    pub async fn save_session(
        &mut self,
        tenant_id: &str,
        api_key: &str,
        session_id: &str,
    ) -> Option<ReadinessStatus> {
        match self.session.sync(tenant_id, api_key, session_id).await {
            Ok(readiness) => {
                self.report_readiness(readiness);
                Some(readiness)
            }
            Err(e) => {
                warn!("Failed to persist session: {}", e);
                self.sink.notify(&format!("Could not save session: {}", e), Tone::Error);
                None
            }
        }
    }

    fn report_readiness(&mut self, readiness: ReadinessStatus) {
        let tone = if readiness.is_chat_ready() {
            Tone::Ok
        } else {
            Tone::Error
        };
        let notice = format!("{} [{}]", self.session.status_notice(), self.session.badge());
        self.sink.notify(&notice, tone);
    }

    /// Creates the tenant, adopts its api key and starts a fresh session.
    pub async fn create_tenant(&mut self, tenant_id: &str) -> Option<TenantCreated> {
        let created = match self.client.create_tenant(tenant_id).await {
            Ok(created) => created,
            Err(e) => {
                self.sink.notify(&e.to_string(), Tone::Error);
                return None;
            }
        };

        let session_id = format!("session-{}", Utc::now().timestamp_millis());
        if let Err(e) = self
            .session
            .sync(&created.tenant_id, &created.api_key, &session_id)
            .await
        {
            warn!("Tenant created but session could not be persisted: {}", e);
            self.sink.notify(&format!("Could not save session: {}", e), Tone::Error);
            return Some(created);
        }

        info!("Session {} started for tenant {}", session_id, created.tenant_id);
        self.sink.notify(
            &format!("Tenant \"{}\" created. API key saved.", created.tenant_id),
            Tone::Ok,
        );
        Some(created)
    }

    /// One file goes through a single upload, several through the batch
    /// coordinator. An empty selection does nothing.
    pub async fn ingest(&mut self, files: Vec<UploadFile>) -> Option<IngestReport> {
        if !self.session.is_network_ready() {
            self.sink.notify(INGEST_NOT_READY_MESSAGE, Tone::Error);
            return None;
        }
        if files.is_empty() {
            debug!("Nothing selected for ingest");
            return None;
        }

        let tenant_id = self.session.tenant_id().to_string();
        let api_key = self.session.api_key().to_string();
        let tracker = &mut self.tracker;
        let view = &mut self.view;
        let mut on_progress = |signal: ProgressSignal| view.render(&tracker.apply(signal));
        on_progress(ProgressSignal::Percent(0));

        let report = if let [file] = files.as_slice() {
            let result = self
                .uploader
                .upload(file, &tenant_id, &api_key, &mut on_progress)
                .await;
            IngestReport::Single {
                filename: file.filename.clone(),
                result,
            }
        } else {
            let summary = BatchIngestCoordinator::new(self.uploader.as_ref())
                .upload_all(&files, &tenant_id, &api_key, on_progress)
                .await;
            match summary {
                Some(summary) => IngestReport::Batch(summary),
                None => return None,
            }
        };

        match &report {
            IngestReport::Single {
                filename,
                result: Ok(receipt),
            } => self.sink.notify(
                &format!("Indexed {} chunks from {}.", receipt.chunks_label(), filename),
                Tone::Ok,
            ),
            IngestReport::Single { result: Err(e), .. } => {
                self.sink.notify(&e.to_string(), Tone::Error)
            }
            IngestReport::Batch(summary) => self.sink.notify(&summary.message(), summary.tone()),
        }

        self.finish_progress().await;
        Some(report)
    }

    /// Pins the bar at 100, holds it, then clears it.
    async fn finish_progress(&mut self) {
        let snapshot = self.tracker.complete(Instant::now());
        self.view.render(&snapshot);

        tokio::time::sleep(self.tracker.hold()).await;
        if let Some(idle) = self.tracker.poll(Instant::now()) {
            self.view.render(&idle);
        }
    }

    pub async fn chat(&mut self, message: &str) -> Option<ChatExchange> {
        match self.chat.send(message, &self.session).await {
            Ok(exchange) => Some(exchange),
            Err(ChatError::EmptyMessage) => None,
            Err(e) => {
                self.sink.notify(&e.to_string(), Tone::Error);
                None
            }
        }
    }
}
