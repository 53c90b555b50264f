use std::time::Instant;
use tracing::{debug, info, warn};

use crate::chat::types::{ChatError, ChatExchange, ChatRequest, LatencySource, EMPTY_RESPONSE_TEXT};
use crate::service::types::{decode_body, failure_detail, ChatResponseBody};
use crate::service::{ChatRequestBody, ServiceClient};
use crate::session::SessionState;

const NETWORK_ERROR_MESSAGE: &str = "Network error during chat request.";

/// Runs one chat exchange at a time against `POST /chat`. No retries; a
/// failed exchange leaves the session as it was.
#[derive(Debug, Clone)]
pub struct ChatOrchestrator {
    client: ServiceClient,
}

impl ChatOrchestrator {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    pub async fn send(&self, message: &str, session: &SessionState) -> Result<ChatExchange, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if !session.is_chat_ready() {
            debug!("Chat refused: session not ready");
            return Err(ChatError::NotReady);
        }

        let request = ChatRequest {
            tenant_id: session.tenant_id().to_string(),
            session_id: session.session_id().to_string(),
            message: message.to_string(),
        };
        let body = ChatRequestBody {
            tenant_id: request.tenant_id.clone(),
            session_id: request.session_id.clone(),
            user_message: request.message.clone(),
        };

        let started = Instant::now();
        let raw = self
            .client
            .post_json("chat", Some(session.api_key()), &body)
            .await
            .map_err(|e| {
                warn!("Chat request failed in transport: {}", e);
                ChatError::Network(NETWORK_ERROR_MESSAGE.to_string())
            })?;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        if !raw.is_success() {
            let status = raw.status;
            let detail = failure_detail(&raw.text, || format!("Chat request failed ({}).", status));
            warn!("Chat request rejected ({}): {}", status, detail);
            return Err(ChatError::Server(detail));
        }

        let body: ChatResponseBody = decode_body(&raw.text).unwrap_or_default();
        let (latency_ms, latency_source) = match body.latency_ms() {
            Some(server_ms) => (server_ms, LatencySource::Server),
            None => (elapsed_ms, LatencySource::Client),
        };
        let response_text = body
            .response
            .clone()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| EMPTY_RESPONSE_TEXT.to_string());

        let exchange = ChatExchange::new(request, response_text, latency_ms, latency_source)
            .with_tokens_used(body.tokens_used())
            .with_retrieved_doc_ids(body.retrieved_doc_ids());

        info!(
            exchange_id = %exchange.id,
            "Chat exchange completed in {} ({:?})",
            exchange.latency_label(),
            latency_source
        );
        Ok(exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;
    use crate::session::ConfigStore;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    async fn make_session(tenant: &str, key: &str, sid: &str) -> SessionState {
        let store = ConfigStore::new(Arc::new(MemoryStore::new()));
        let mut session = SessionState::restore(store).await.unwrap();
        session.sync(tenant, key, sid).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_server_latency_takes_precedence() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat")
                .header("x-api-key", "k-123")
                .json_body(json!({
                    "tenant_id": "acme",
                    "session_id": "s-1",
                    "user_message": "hello"
                }));
            then.status(200).json_body(json!({
                "response": "Welcome!",
                "latency_ms": 42,
                "tokens_used": 90,
                "estimated_cost": 0.001,
                "retrieved_doc_ids": ["doc-a", "doc-b"]
            }));
        });

        let orchestrator = ChatOrchestrator::new(ServiceClient::with_base_url(server.base_url()).unwrap());
        let session = make_session("acme", "k-123", "s-1").await;

        let exchange = orchestrator.send("  hello ", &session).await.unwrap();
        mock.assert();

        assert_eq!(exchange.latency_ms, 42.0);
        assert_eq!(exchange.latency_source, LatencySource::Server);
        assert_eq!(exchange.response_text, "Welcome!");
        assert_eq!(exchange.tokens_used, Some(90.0));
        assert_eq!(exchange.tokens_label(), "90");
        assert_eq!(exchange.retrieved_doc_ids, vec!["doc-a", "doc-b"]);
        assert_eq!(exchange.request.message, "hello");
    }

    #[tokio::test]
    async fn test_missing_metadata_falls_back() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat");
            then.status(200).json_body(json!({ "response": "ok", "retrieved_doc_ids": [] }));
        });

        let orchestrator = ChatOrchestrator::new(ServiceClient::with_base_url(server.base_url()).unwrap());
        let session = make_session("acme", "k", "s").await;

        let exchange = orchestrator.send("hi", &session).await.unwrap();
        assert_eq!(exchange.latency_source, LatencySource::Client);
        assert!(exchange.latency_ms >= 0.0);
        assert_eq!(exchange.tokens_label(), "--");
        assert_eq!(exchange.docs_label(), "--");
    }

    #[tokio::test]
    async fn test_float_token_count_is_kept() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat");
            then.status(200).json_body(json!({ "response": "hi", "tokens_used": 12.0 }));
        });

        let orchestrator = ChatOrchestrator::new(ServiceClient::with_base_url(server.base_url()).unwrap());
        let session = make_session("acme", "k", "s").await;

        let exchange = orchestrator.send("hello", &session).await.unwrap();
        assert_eq!(exchange.tokens_used, Some(12.0));
        assert_eq!(exchange.tokens_label(), "12");
    }

    #[tokio::test]
    async fn test_not_ready_makes_no_call() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/chat");
            then.status(200).json_body(json!({ "response": "unused" }));
        });

        let orchestrator = ChatOrchestrator::new(ServiceClient::with_base_url(server.base_url()).unwrap());
        let session = make_session("", "", "").await;

        let err = orchestrator.send("hello", &session).await.unwrap_err();
        assert_eq!(err, ChatError::NotReady);
        assert_eq!(mock.calls(), 0);

        let session = make_session("acme", "k", "").await;
        assert_eq!(orchestrator.send("hello", &session).await.unwrap_err(), ChatError::NotReady);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let orchestrator = ChatOrchestrator::new(ServiceClient::with_base_url("http://127.0.0.1:1").unwrap());
        let session = make_session("acme", "k", "s").await;
        assert_eq!(orchestrator.send("   ", &session).await.unwrap_err(), ChatError::EmptyMessage);
    }

    #[tokio::test]
    async fn test_server_error_detail() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat");
            then.status(413).json_body(json!({ "detail": "Message too long" }));
        });

        let orchestrator = ChatOrchestrator::new(ServiceClient::with_base_url(server.base_url()).unwrap());
        let session = make_session("acme", "k", "s").await;

        let err = orchestrator.send("hello", &session).await.unwrap_err();
        assert_eq!(err, ChatError::Server("Message too long".to_string()));
        assert!(session.is_chat_ready());
    }

    #[tokio::test]
    async fn test_server_error_without_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat");
            then.status(500).body("Internal Server Error");
        });

        let orchestrator = ChatOrchestrator::new(ServiceClient::with_base_url(server.base_url()).unwrap());
        let session = make_session("acme", "k", "s").await;

        let err = orchestrator.send("hello", &session).await.unwrap_err();
        assert_eq!(err, ChatError::Server("Chat request failed (500).".to_string()));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let orchestrator = ChatOrchestrator::new(ServiceClient::with_base_url("http://127.0.0.1:1").unwrap());
        let session = make_session("acme", "k", "s").await;

        let err = orchestrator.send("hello", &session).await.unwrap_err();
        assert!(matches!(err, ChatError::Network(_)));
    }

    #[tokio::test]
    async fn test_non_json_success_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat");
            then.status(200).body("not json");
        });

        let orchestrator = ChatOrchestrator::new(ServiceClient::with_base_url(server.base_url()).unwrap());
        let session = make_session("acme", "k", "s").await;

        let exchange = orchestrator.send("hello", &session).await.unwrap();
        assert_eq!(exchange.response_text, "No response returned.");
        assert_eq!(exchange.latency_source, LatencySource::Client);
    }
}
