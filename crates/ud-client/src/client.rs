//! Shared HTTP plumbing
//!
//! Non-2xx responses are categorized through [`UdError::from_status`], with
//! the server's `error.message` when the body carries one. A 401 means the
//! stored token is dead: it is cleared before the error is returned.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use ud_core::config::ApiConfig;
use ud_core::{UdError, UdResult};
use ud_queries::QueryParams;

use crate::credentials::CredentialStore;

/// Authenticated client for the admin API
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialStore>) -> UdResult<Self> {
        let http = build_http(config)?;
        Ok(Self::with_http(http, &config.base_url, credentials))
    }

    pub fn with_http(
        http: Client,
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET` with query parameters
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&QueryParams>,
    ) -> UdResult<T> {
        let mut request = self.http.get(self.url(path));
        if let Some(params) = params {
            request = request.query(params);
        }
        self.execute(Method::GET, path, request).await
    }

    /// `PATCH` with a JSON body
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> UdResult<T> {
        let request = self.http.patch(self.url(path)).json(body);
        self.execute(Method::PATCH, path, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        mut request: RequestBuilder,
    ) -> UdResult<T> {
        if let Some(credential) = self.credentials.load().await? {
            request = request.header(reqwest::header::AUTHORIZATION, credential.bearer());
        }

        let response = request.send().await.map_err(transport_error)?;
        debug!(%method, path, status = response.status().as_u16(), "API response");

        match check_status(response).await {
            Err(error) if error.requires_reauthentication() => {
                warn!(path, "Token rejected, clearing stored credentials");
                self.credentials.clear().await?;
                Err(error)
            }
            Err(error) => Err(error),
            Ok(response) => decode_json(response).await,
        }
    }
}

pub(crate) fn build_http(config: &ApiConfig) -> UdResult<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| UdError::Config(format!("failed to build HTTP client: {}", e)))
}

pub(crate) fn transport_error(e: reqwest::Error) -> UdError {
    if e.is_timeout() {
        UdError::Transport(format!("request timed out: {}", e))
    } else {
        UdError::Transport(e.to_string())
    }
}

/// Pass 2xx responses through; turn everything else into a categorized error
pub(crate) async fn check_status(response: Response) -> UdResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(ud_models::envelope::error_message)
                .map(str::to_string)
        });
    Err(UdError::from_status(status.as_u16(), message))
}

pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> UdResult<T> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| UdError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credential, MemoryCredentialStore};
    use crate::test_support::{admin, spawn};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn echo_auth(headers: HeaderMap) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        Json(json!({ "authorization": auth }))
    }

    fn client(base_url: &str, store: Arc<dyn CredentialStore>) -> ApiClient {
        ApiClient::with_http(Client::new(), base_url, store)
    }

    #[tokio::test]
    async fn test_bearer_header_is_attached() {
        let base = spawn(Router::new().route("/echo", get(echo_auth))).await;
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new(
            "tok", admin(),
        )));
        let body: Value = client(&base, store).get("/echo", None).await.unwrap();
        assert_eq!(body["authorization"], "Bearer tok");
    }

    #[tokio::test]
    async fn test_no_header_without_credentials() {
        let base = spawn(Router::new().route("/echo", get(echo_auth))).await;
        let body: Value = client(&base, Arc::new(MemoryCredentialStore::new()))
            .get("echo", None)
            .await
            .unwrap();
        assert_eq!(body["authorization"], "");
    }

    #[tokio::test]
    async fn test_unauthorized_clears_credentials() {
        let router = Router::new().route(
            "/private",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "expired" }))) }),
        );
        let base = spawn(router).await;
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new(
            "old", admin(),
        )));

        let err = client(&base, store.clone())
            .get::<Value>("/private", None)
            .await
            .unwrap_err();
        assert!(err.requires_reauthentication());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_error_message_is_surfaced() {
        let router = Router::new()
            .route(
                "/invalid",
                get(|| async {
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        Json(json!({ "data": null, "error": { "message": "phone taken" } })),
                    )
                }),
            )
            .route(
                "/broken",
                get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
            );
        let base = spawn(router).await;
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new(
            "tok", admin(),
        )));
        let client = client(&base, store.clone());

        let err = client.get::<Value>("/invalid", None).await.unwrap_err();
        assert_eq!(
            err,
            UdError::Unprocessable {
                message: "phone taken".into()
            }
        );
        assert!(err.is_user_visible());

        let err = client.get::<Value>("/broken", None).await.unwrap_err();
        assert_eq!(err.status_code(), 502);
        assert!(matches!(err, UdError::Server { .. }));

        // Only 401 forgets the token
        assert!(store.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let base = spawn(Router::new().route("/text", get(|| async { "plain" }))).await;
        let err = client(&base, Arc::new(MemoryCredentialStore::new()))
            .get::<Value>("/text", None)
            .await
            .unwrap_err();
        assert!(matches!(err, UdError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:1".into(),
            auth_base_url: "http://127.0.0.1:1".into(),
            timeout_seconds: 2,
        };
        let client = ApiClient::new(&config, Arc::new(MemoryCredentialStore::new())).unwrap();
        let err = client.get::<Value>("/", None).await.unwrap_err();
        assert!(matches!(err, UdError::Transport(_)));
    }
}
