//! Wire shapes of the three service contracts.
//!
//! Response bodies are decoded leniently: every field is optional and a body
//! that is not JSON at all decodes to `None`, which callers turn into the
//! default (empty) record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct TenantCreateRequest<'a> {
    pub tenant_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TenantCreateResponse {
    pub tenant_id: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IngestResponseBody {
    pub document_id: Option<String>,
    pub status: Option<String>,
    pub chunks_indexed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequestBody {
    pub tenant_id: String,
    pub session_id: String,
    pub user_message: String,
}

/// The metadata fields stay raw so a malformed value only loses that field
/// instead of the whole body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatResponseBody {
    pub response: Option<String>,
    pub latency_ms: Option<Value>,
    pub tokens_used: Option<Value>,
    pub retrieved_doc_ids: Option<Value>,
}

impl ChatResponseBody {
    pub fn latency_ms(&self) -> Option<f64> {
        self.latency_ms.as_ref().and_then(Value::as_f64)
    }

    /// Any JSON number counts; only a missing or non-numeric value is absent.
    pub fn tokens_used(&self) -> Option<f64> {
        self.tokens_used.as_ref().and_then(Value::as_f64)
    }

    pub fn retrieved_doc_ids(&self) -> Vec<String> {
        match &self.retrieved_doc_ids {
            Some(Value::Array(ids)) => ids
                .iter()
                .filter_map(|id| id.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Failure body: `{"detail": ...}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Text of `detail`, if it carries anything.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

pub fn decode_body<T: DeserializeOwned>(text: &str) -> Option<T> {
    let text = if text.trim().is_empty() { "{}" } else { text };
    match serde_json::from_str(text) {
        Ok(body) => Some(body),
        Err(e) => {
            debug!("Response body is not the expected JSON ({}); treating as empty", e);
            None
        }
    }
}

/// The failure message for a non-success response: the body's `detail` when
/// present, else `fallback`.
pub fn failure_detail(text: &str, fallback: impl FnOnce() -> String) -> String {
    decode_body::<ErrorBody>(text)
        .unwrap_or_default()
        .detail_text()
        .unwrap_or_else(fallback)
}
