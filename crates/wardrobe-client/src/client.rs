//! Authenticated request pipeline.
//!
//! Every outbound call carries the stored access token as a bearer
//! credential. A 401 response triggers exactly one silent refresh through
//! `auth/token/refresh/` followed by one resend of the original request;
//! a second 401, a missing refresh token, or a failed refresh is terminal
//! and clears both tokens. Requests to the refresh endpoint itself are
//! never refresh-retried.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::ApiError;
use crate::models::RefreshResponse;
use crate::token::TokenStore;

/// Path of the token refresh endpoint, exempt from retry logic.
pub const REFRESH_PATH: &str = "auth/token/refresh/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable request descriptor. A resend after refresh rebuilds the wire
/// request from this value; the retry count is threaded through the send
/// loop rather than stored on the descriptor.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, params: &[(String, String)]) -> Self {
        self.query.extend_from_slice(params);
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn json_value(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn is_refresh_call(&self) -> bool {
        self.path.trim_matches('/') == REFRESH_PATH.trim_matches('/')
    }
}

/// HTTP client for the Wardrobe API.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    tokens: Arc<dyn TokenStore>,
    /// Serializes concurrent refresh attempts; see [`ApiClient::refresh_access`].
    refresh_gate: Mutex<()>,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            tokens,
            refresh_gate: Mutex::new(()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Send a request through the pipeline and decode a JSON response.
    pub async fn json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Send a request through the pipeline, discarding the response body.
    pub async fn send_ok(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.send(request).await?;
        Ok(())
    }

    /// Send a request through the pipeline. Non-2xx statuses are mapped to
    /// [`ApiError`]; 401 handling happens in [`ApiClient::execute`].
    pub async fn send(&self, request: ApiRequest) -> Result<reqwest::Response, ApiError> {
        let response = self.execute(&request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    /// The retry loop. At most one resend per original request: `retried`
    /// is a local of this call, so a marker can never leak between
    /// requests.
    async fn execute(&self, request: &ApiRequest) -> Result<reqwest::Response, ApiError> {
        let mut retried = false;
        loop {
            let stored = self.tokens.get();
            let response = self.dispatch(request, stored.access.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            if request.is_refresh_call() || retried {
                return Err(self.give_up());
            }
            let Some(refresh) = stored.refresh else {
                return Err(self.give_up());
            };

            retried = true;
            match self.refresh_access(stored.access.as_deref(), &refresh).await {
                Ok(()) => {
                    tracing::debug!(path = %request.path, "access token refreshed, resending");
                }
                Err(err) => {
                    tracing::debug!(path = %request.path, error = %err, "token refresh failed");
                    return Err(self.give_up());
                }
            }
        }
    }

    /// Terminal 401: the session is over. Clear both tokens and surface
    /// the original unauthorized failure.
    fn give_up(&self) -> ApiError {
        if let Err(err) = self.tokens.clear() {
            tracing::warn!(error = %err, "failed to clear stored tokens");
        }
        ApiError::Unauthorized
    }

    /// Build and send one wire request from the descriptor.
    async fn dispatch(
        &self,
        request: &ApiRequest,
        access: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}/{}", self.base_url, request.path.trim_start_matches('/'));
        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = access {
            builder = builder.bearer_auth(token);
        }
        Ok(builder.send().await?)
    }

    /// Mint a new access token from the refresh token.
    ///
    /// Called directly, outside the retry loop, so a failing refresh can
    /// never recurse into another refresh. Concurrent 401s coalesce here:
    /// whoever holds the gate refreshes, and waiters find a newer access
    /// token already stored and skip their own refresh call.
    async fn refresh_access(
        &self,
        stale_access: Option<&str>,
        refresh: &str,
    ) -> Result<(), ApiError> {
        let _gate = self.refresh_gate.lock().await;

        let current = self.tokens.get().access;
        if current.is_some() && current.as_deref() != stale_access {
            return Ok(());
        }

        let url = format!("{}/{}", self.base_url, REFRESH_PATH);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Unauthorized);
        }

        let body: RefreshResponse = response.json().await?;
        self.tokens.replace_access(&body.access)?;
        Ok(())
    }

    // Convenience wrappers used by the resource services.

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        self.json(ApiRequest::get(path).query(query)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.json(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send_ok(ApiRequest::delete(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MemoryTokenStore;

    #[test]
    fn test_base_url_normalization() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let client = ApiClient::new("http://localhost:8000/api/", tokens).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn test_refresh_path_detection() {
        assert!(ApiRequest::post("auth/token/refresh/").is_refresh_call());
        assert!(ApiRequest::post("/auth/token/refresh").is_refresh_call());
        assert!(!ApiRequest::post("auth/login/").is_refresh_call());
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::get("items/")
            .query(&[("page".to_string(), "2".to_string())])
            .json(&serde_json::json!({"name": "hat"}))
            .unwrap();
        assert_eq!(request.path(), "items/");
        assert_eq!(request.query.len(), 1);
        assert!(request.body.is_some());
    }
}
