use tracing::{debug, info};

use crate::error::Result;
use crate::session::store::{ConfigStore, SessionRecord};

/// How far the current credentials get us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessStatus {
    Disconnected,
    /// Tenant id and api key are set; ingestion is possible.
    NetworkReady,
    /// Network-ready and a session id is set; chat is possible.
    ChatReady,
}

impl ReadinessStatus {
    pub fn is_chat_ready(self) -> bool {
        self == ReadinessStatus::ChatReady
    }

    pub fn is_network_ready(self) -> bool {
        self != ReadinessStatus::Disconnected
    }
}

/// Credentials needed to talk to the service, backed by a [`ConfigStore`].
///
/// Nothing here rejects input: `sync` always stores and persists what it is
/// given, and readiness is reported rather than enforced.
pub struct SessionState {
    record: SessionRecord,
    store: ConfigStore,
}

impl SessionState {
    pub async fn restore(store: ConfigStore) -> Result<Self> {
        let record = store.load().await?;
        let state = Self { record, store };
        info!("Session restored ({:?})", state.readiness());
        Ok(state)
    }

    pub async fn sync(
        &mut self,
        tenant_id: &str,
        api_key: &str,
        session_id: &str,
    ) -> Result<ReadinessStatus> {
        self.record = SessionRecord {
            tenant_id: tenant_id.trim().to_string(),
            api_key: api_key.trim().to_string(),
            session_id: session_id.trim().to_string(),
        };
        self.store.save(&self.record).await?;

        let readiness = self.readiness();
        debug!("Session synced: tenant='{}' readiness={:?}", self.record.tenant_id, readiness);
        Ok(readiness)
    }

    pub fn tenant_id(&self) -> &str {
        &self.record.tenant_id
    }

    pub fn api_key(&self) -> &str {
        &self.record.api_key
    }

    pub fn session_id(&self) -> &str {
        &self.record.session_id
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn is_network_ready(&self) -> bool {
        !self.record.tenant_id.is_empty() && !self.record.api_key.is_empty()
    }

    pub fn is_chat_ready(&self) -> bool {
        self.is_network_ready() && !self.record.session_id.is_empty()
    }

    pub fn readiness(&self) -> ReadinessStatus {
        if self.is_chat_ready() {
            ReadinessStatus::ChatReady
        } else if self.is_network_ready() {
            ReadinessStatus::NetworkReady
        } else {
            ReadinessStatus::Disconnected
        }
    }

    pub fn badge(&self) -> String {
        if !self.record.tenant_id.is_empty() && !self.record.session_id.is_empty() {
            format!("{}/{}", self.record.tenant_id, self.record.session_id)
        } else {
            "Not connected".to_string()
        }
    }

    pub fn status_notice(&self) -> &'static str {
        if self.is_chat_ready() {
            "Ready to chat."
        } else {
            "No tenant connected yet."
        }
    }
}
