use uuid::Uuid;

pub const TOKENS_PLACEHOLDER: &str = "--";
pub const DOCS_PLACEHOLDER: &str = "--";
pub const EMPTY_RESPONSE_TEXT: &str = "No response returned.";

/// What was sent for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub tenant_id: String,
    pub session_id: String,
    pub message: String,
}

/// Where the reported latency came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencySource {
    /// `latency_ms` reported by the service.
    Server,
    /// Measured around the request on this side.
    Client,
}

/// One completed request/response cycle. Lives until it is displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatExchange {
    pub id: String,
    pub request: ChatRequest,
    pub response_text: String,
    pub latency_ms: f64,
    pub latency_source: LatencySource,
    /// Shown as the service sent it; integral values print without a fraction.
    pub tokens_used: Option<f64>,
    pub retrieved_doc_ids: Vec<String>,
}

impl ChatExchange {
    pub fn new(request: ChatRequest, response_text: String, latency_ms: f64, latency_source: LatencySource) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            request,
            response_text,
            latency_ms,
            latency_source,
            tokens_used: None,
            retrieved_doc_ids: Vec::new(),
        }
    }

    pub fn with_tokens_used(mut self, tokens_used: Option<f64>) -> Self {
        self.tokens_used = tokens_used;
        self
    }

    pub fn with_retrieved_doc_ids(mut self, ids: Vec<String>) -> Self {
        self.retrieved_doc_ids = ids;
        self
    }

    pub fn latency_label(&self) -> String {
        format!("{:.0} ms", self.latency_ms)
    }

    pub fn tokens_label(&self) -> String {
        self.tokens_used
            .map(|tokens| tokens.to_string())
            .unwrap_or_else(|| TOKENS_PLACEHOLDER.to_string())
    }

    pub fn docs_label(&self) -> String {
        if self.retrieved_doc_ids.is_empty() {
            DOCS_PLACEHOLDER.to_string()
        } else {
            self.retrieved_doc_ids.join(", ")
        }
    }
}

/// Display text is what the operator sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Connect a tenant, API key, and session before chatting.")]
    NotReady,

    #[error("Type a message before sending.")]
    EmptyMessage,

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Network(String),
}
