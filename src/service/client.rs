use reqwest::multipart::Form;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::app::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::service::types::{decode_body, failure_detail, TenantCreateRequest, TenantCreateResponse};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// A response that made it back: status plus the raw body text.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub text: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantCreated {
    pub tenant_id: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantError {
    #[error("Enter a tenant ID before creating a new tenant.")]
    MissingTenantId,

    #[error("{0}")]
    Server(String),

    #[error("Tenant creation failed.")]
    Network,
}

/// HTTP access to the TourAssist service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder
            .build()
            .map_err(|e| Error::platform(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(&ServiceConfig {
            base_url: base_url.into(),
            ..ServiceConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        api_key: Option<&str>,
        body: &T,
    ) -> std::result::Result<RawResponse, reqwest::Error> {
        let mut request = self.client.post(self.endpoint(path)).json(body);
        if let Some(key) = api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        debug!("POST {} (json)", path);
        let response = request.send().await?;
        Self::into_raw(response).await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        api_key: &str,
        form: Form,
    ) -> std::result::Result<RawResponse, reqwest::Error> {
        debug!("POST {} (multipart)", path);
        let response = self
            .client
            .post(self.endpoint(path))
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .await?;
        Self::into_raw(response).await
    }

    async fn into_raw(response: reqwest::Response) -> std::result::Result<RawResponse, reqwest::Error> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!("Response status {} ({} bytes)", status, text.len());
        Ok(RawResponse { status, text })
    }

    /// `POST /tenants`. Needs no credentials.
    pub async fn create_tenant(&self, tenant_id: &str) -> std::result::Result<TenantCreated, TenantError> {
        let tenant_id = tenant_id.trim();
        if tenant_id.is_empty() {
            return Err(TenantError::MissingTenantId);
        }

        let raw = self
            .post_json("tenants", None, &TenantCreateRequest { tenant_id })
            .await
            .map_err(|e| {
                warn!("Tenant creation transport failure: {}", e);
                TenantError::Network
            })?;

        if !raw.is_success() {
            let detail = failure_detail(&raw.text, || "Unable to create tenant.".to_string());
            warn!("Tenant creation rejected ({}): {}", raw.status, detail);
            return Err(TenantError::Server(detail));
        }

        let body: TenantCreateResponse = decode_body(&raw.text).unwrap_or_default();
        let api_key = body
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TenantError::Server("Unable to create tenant.".to_string()))?;

        info!("Tenant '{}' created", tenant_id);
        Ok(TenantCreated {
            tenant_id: body.tenant_id.unwrap_or_else(|| tenant_id.to_string()),
            api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_join() {
        let client = ServiceClient::with_base_url("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.endpoint("/chat"), "http://localhost:8000/chat");
        assert_eq!(client.endpoint("ingest"), "http://localhost:8000/ingest");
    }

    #[tokio::test]
    async fn test_create_tenant_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/tenants")
                .json_body(json!({ "tenant_id": "acme" }));
            then.status(200)
                .json_body(json!({ "tenant_id": "acme", "api_key": "k-123" }));
        });

        let client = ServiceClient::with_base_url(server.base_url()).unwrap();
        let created = client.create_tenant(" acme ").await.unwrap();

        assert_eq!(created.tenant_id, "acme");
        assert_eq!(created.api_key, "k-123");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_create_tenant_conflict_uses_detail() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/tenants");
            then.status(409).json_body(json!({ "detail": "Tenant already exists" }));
        });

        let client = ServiceClient::with_base_url(server.base_url()).unwrap();
        let err = client.create_tenant("acme").await.unwrap_err();
        assert_eq!(err, TenantError::Server("Tenant already exists".to_string()));
    }

    #[tokio::test]
    async fn test_create_tenant_blank_id_skips_network() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/tenants");
            then.status(200);
        });

        let client = ServiceClient::with_base_url(server.base_url()).unwrap();
        let err = client.create_tenant("   ").await.unwrap_err();
        assert_eq!(err, TenantError::MissingTenantId);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_create_tenant_network_failure() {
        let client = ServiceClient::with_base_url("http://127.0.0.1:1").unwrap();
        let err = client.create_tenant("acme").await.unwrap_err();
        assert_eq!(err, TenantError::Network);
    }
}
