use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::platform::KeyValueStore;

/// Fixed key the session record lives under.
pub const STORE_KEY: &str = "tourassist-chat";

/// The persisted credential triple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionRecord {
    pub tenant_id: String,
    pub api_key: String,
    pub session_id: String,
}

/// Loads and saves the single session record.
#[derive(Clone)]
pub struct ConfigStore {
    backend: Arc<dyn KeyValueStore>,
}

impl ConfigStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Returns an empty record when nothing was stored or the stored value
    /// cannot be parsed.
    pub async fn load(&self) -> Result<SessionRecord> {
        let Some(raw) = self.backend.get(STORE_KEY).await? else {
            debug!("No stored session record");
            return Ok(SessionRecord::default());
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Ok(record),
            Err(e) => {
                warn!("Discarding unreadable session record: {}", e);
                Ok(SessionRecord::default())
            }
        }
    }

    pub async fn save(&self, record: &SessionRecord) -> Result<()> {
        let raw = serde_json::to_string(record)?;
        self.backend.set(STORE_KEY, &raw).await
    }
}
