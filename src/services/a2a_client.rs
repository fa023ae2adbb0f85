//! Client for the A2A CDP provider, the sibling service that encodes CDP
//! operations into unsigned transactions and answers protocol queries.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::settings::A2aSettings;
use crate::error::AppError;

/// Seam for everything that goes through the A2A protocol. Handlers and the
/// monitor depend on this trait, never on the concrete HTTP client.
#[async_trait]
pub trait CdpProvider: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value, AppError>;
}

#[derive(Debug, Serialize)]
struct A2aRequest {
    method: String,
    params: Value,
    id: String,
}

#[derive(Debug, Deserialize)]
struct A2aResponse {
    result: Option<Value>,
    error: Option<A2aErrorBody>,
}

#[derive(Debug, Deserialize)]
struct A2aErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Clone)]
pub struct HttpCdpProvider {
    client: Client,
    base_url: String,
}

impl HttpCdpProvider {
    pub fn new(settings: &A2aSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: settings.provider_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CdpProvider for HttpCdpProvider {
    async fn call(&self, method: &str, params: Value) -> Result<Value, AppError> {
        let request = A2aRequest {
            method: method.to_string(),
            params,
            id: Uuid::new_v4().to_string(),
        };

        let response = self
            .client
            .post(format!("{}/a2a", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(method, error = %e, "CDP provider unreachable");
                AppError::Upstream(format!("CDP provider unreachable: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(method, status = %status, "CDP provider HTTP error");
            return Err(AppError::Upstream(format!(
                "CDP provider returned HTTP {status}"
            )));
        }

        let body: A2aResponse = response.json().await.map_err(|e| {
            AppError::Upstream(format!("malformed CDP provider response: {e}"))
        })?;

        if let Some(err) = body.error {
            tracing::error!(method, code = err.code, message = %err.message, "A2A error response");
            return Err(AppError::Upstream(format!(
                "A2A error [{}]: {}",
                err.code, err.message
            )));
        }

        body.result
            .ok_or_else(|| AppError::Upstream("A2A response missing result".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> HttpCdpProvider {
        HttpCdpProvider::new(&A2aSettings {
            provider_url: server.uri(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn returns_result_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/a2a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "price": "5000000000000000000000", "formatted": "5000.00" },
                "id": "abc"
            })))
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .call("query.price", json!({ "branchIndex": 0 }))
            .await
            .unwrap();
        assert_eq!(result["formatted"], "5000.00");
    }

    #[tokio::test]
    async fn embedded_error_maps_to_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/a2a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": { "code": -32000, "message": "trove not found" },
                "id": "abc"
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .call("cdp.closeTrove", json!({ "branchIndex": 0, "troveId": "9" }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_ERROR");
        assert!(err.to_string().contains("trove not found"));
    }

    #[tokio::test]
    async fn http_error_maps_to_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/a2a"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .call("query.price", json!({ "branchIndex": 0 }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }
}
