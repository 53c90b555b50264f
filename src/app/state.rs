use std::sync::Arc;
use tracing::{debug, info};

use crate::app::config::AppConfig;
use crate::app::notify::NotificationSink;
use crate::app::workbench::Workbench;
use crate::error::Result;
use crate::ingest::{HttpUploader, ProgressView};
use crate::platform::{AppPaths, JsonFileStore};
use crate::service::ServiceClient;
use crate::session::{ConfigStore, SessionState};

/// Process-wide wiring: configuration, on-disk session store and the
/// service client.
pub struct AppState {
    config: AppConfig,
    paths: AppPaths,
    store: ConfigStore,
    client: ServiceClient,
}

impl AppState {
    pub fn new(config: AppConfig, paths: AppPaths) -> Result<Self> {
        info!("Initializing application state");

        // Initialize session storage
        let store = ConfigStore::new(Arc::new(JsonFileStore::new(paths.store_file())));

        // Initialize service client
        let client = ServiceClient::new(&config.service)?;
        debug!("Service client targets {}", client.base_url());

        Ok(Self {
            config,
            paths,
            store,
            client,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn client(&self) -> &ServiceClient {
        &self.client
    }

    pub async fn restore_session(&self) -> Result<SessionState> {
        SessionState::restore(self.store.clone()).await
    }

    pub async fn workbench<N, V>(&self, sink: N, view: V) -> Result<Workbench<N, V>>
    where
        N: NotificationSink,
        V: ProgressView + Send,
    {
        let session = self.restore_session().await?;
        let uploader = Arc::new(HttpUploader::new(
            self.client.clone(),
            self.config.ingest.chunk_size_bytes,
        ));

        Ok(Workbench::new(
            session,
            self.client.clone(),
            uploader,
            self.config.ingest.progress_hold(),
            sink,
            view,
        ))
    }
}
