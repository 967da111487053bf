//! HTTP client for the QuizHub API
//!
//! [`ApiClient`] is the single entry point for the rest of the application:
//! every call goes through the retry orchestrator, which attaches the stored
//! bearer token, renews it once on 401/403 and backs off on 429/503.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use quizhub_sdk::{ApiClient, FileTokenStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> quizhub_sdk::Result<()> {
//! let store = FileTokenStore::new("/home/ana/.local/share/quizhub/credentials.json");
//! let client = ApiClient::builder()
//!     .base_url("http://localhost:3333")
//!     .token_store(Arc::new(store))
//!     .on_session_expired(|| eprintln!("Session expired, please log in again"))
//!     .build()?;
//!
//! client.login("ana", "secret").await?;
//! let me: serde_json::Value = client.get_data("/me").await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    auth::{
        AuthTokens, MemoryTokenStore, RefreshCoordinator, RotationPolicy, SessionExpiredHook,
        SessionStatus, TokenStore,
    },
    error::{ApiError, Result},
    executor::{RequestExecutor, RequestOptions},
    retry::{RetryOrchestrator, RetryPolicy},
    types::{unwrap_data, LoginOutcome, LoginRequest, SessionUser},
};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout in seconds for API requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Path of the login endpoint
pub const LOGIN_PATH: &str = "/login";

/// HTTP client for interacting with the QuizHub API
#[derive(Debug, Clone)]
pub struct ApiClient {
    executor: RequestExecutor,
    orchestrator: RetryOrchestrator,
}

impl ApiClient {
    /// Create a new client using the builder pattern
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Run one logical call and return the parsed JSON body.
    ///
    /// Successful responses without a body yield `Value::Null`.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value> {
        self.orchestrator.run(path, options).await
    }

    /// Generic GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.request(path, RequestOptions::new(Method::GET)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// GET request whose payload is wrapped in a `{ "data": ... }` envelope
    pub async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.request(path, RequestOptions::new(Method::GET)).await?;
        Ok(serde_json::from_value(unwrap_data(value))?)
    }

    /// Generic POST request
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::POST, path, body).await
    }

    /// Generic PUT request
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::PUT, path, body).await
    }

    /// Generic PATCH request
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::PATCH, path, body).await
    }

    /// Generic DELETE request; the response body is ignored
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(path, RequestOptions::new(Method::DELETE).without_json())
            .await?;
        Ok(())
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let options = RequestOptions::new(method).json(body)?;
        let value = self.request(path, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    // ===== Session =====

    /// Log in and store the returned tokens.
    ///
    /// Login bypasses the retry orchestrator: a 401 here means bad
    /// credentials, not an expired session.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let options = RequestOptions::new(Method::POST).json(&request)?;
        let body = self.executor.execute(LOGIN_PATH, &options).await?;

        let tokens = AuthTokens::from_body(&body).ok_or_else(|| ApiError::InvalidResponse {
            message: body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Login response carried no access token")
                .to_string(),
        })?;

        let store = self.token_store();
        store.set_access_token(&tokens.token);
        match tokens.refresh_token.as_deref() {
            Some(refresh) => store.set_refresh_token(refresh),
            None => store.clear_refresh_token(),
        }

        let user = unwrap_data(body)
            .get("user")
            .cloned()
            .and_then(|u| serde_json::from_value::<SessionUser>(u).ok());

        info!("Logged in as {}", username);
        Ok(LoginOutcome {
            user,
            refreshable: tokens.refresh_token.is_some(),
        })
    }

    /// Store tokens obtained elsewhere (e.g. from a sign-up response)
    pub fn set_tokens(&self, access_token: &str, refresh_token: Option<&str>) {
        let store = self.token_store();
        store.set_access_token(access_token);
        if let Some(refresh) = refresh_token {
            store.set_refresh_token(refresh);
        }
        debug!("Stored tokens in {} store", store.name());
    }

    /// Forget stored credentials
    pub fn logout(&self) {
        self.token_store().clear();
        info!("Logged out");
    }

    /// Local view of the stored session
    pub fn session_status(&self) -> SessionStatus {
        let store = self.token_store();
        SessionStatus::evaluate(
            store.access_token().as_deref(),
            store.refresh_token().is_some(),
            chrono::Utc::now(),
        )
    }

    /// Credential store shared by every call
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        self.executor.token_store()
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        self.executor.base_url()
    }

    /// Retry policy applied to every logical call
    pub fn retry_policy(&self) -> &RetryPolicy {
        self.orchestrator.policy()
    }
}

/// Builder for constructing an ApiClient with custom configuration
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    token_store: Option<Arc<dyn TokenStore>>,
    retry_policy: Option<RetryPolicy>,
    rotation: RotationPolicy,
    on_session_expired: Option<SessionExpiredHook>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_max_idle_per_host: Option<usize>,
}

impl ClientBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL for the API
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Use the given credential store (defaults to an in-memory store)
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Start with tokens held in memory
    pub fn with_tokens(
        mut self,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Self {
        self.token_store = Some(Arc::new(MemoryTokenStore::with_tokens(
            access_token,
            refresh_token,
        )));
        self
    }

    /// Set the retry policy for 429/503 responses
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Set how non-rotating refresh responses are handled
    pub fn rotation_policy(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }

    /// Called after credentials are cleared because the session could not be renewed
    pub fn on_session_expired(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = Some(max);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient> {
        let base_url = self.base_url.ok_or_else(|| ApiError::InvalidRequest {
            message: "base_url is required".into(),
        })?;
        url::Url::parse(&base_url).map_err(|e| ApiError::InvalidRequest {
            message: format!("Invalid base_url '{base_url}': {e}"),
        })?;

        let retry_policy = self.retry_policy.unwrap_or_default();
        if retry_policy.max_attempts == 0 {
            return Err(ApiError::InvalidRequest {
                message: "max_attempts must be at least 1".into(),
            });
        }

        let mut client_builder = reqwest::Client::builder().timeout(
            self.timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        );
        if let Some(timeout) = self.connect_timeout {
            client_builder = client_builder.connect_timeout(timeout);
        }
        if let Some(max) = self.pool_max_idle_per_host {
            client_builder = client_builder.pool_max_idle_per_host(max);
        }
        let http_client = client_builder.build().map_err(ApiError::HttpClient)?;

        let token_store: Arc<dyn TokenStore> = match self.token_store {
            Some(store) => store,
            None => Arc::new(MemoryTokenStore::new()),
        };

        let executor = RequestExecutor::new(http_client, base_url, token_store);
        let refresher =
            RefreshCoordinator::new(executor.clone(), self.rotation, self.on_session_expired);
        let orchestrator = RetryOrchestrator::new(executor.clone(), refresher, retry_policy);

        Ok(ApiClient {
            executor,
            orchestrator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_builder_requires_base_url() {
        let result = ClientBuilder::default().build();
        assert!(matches!(result, Err(ApiError::InvalidRequest { .. })));
    }

    #[test]
    fn test_builder_rejects_invalid_url_and_budget() {
        assert!(ClientBuilder::default().base_url("not a url").build().is_err());
        let zero = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert!(ClientBuilder::default()
            .base_url("http://localhost")
            .retry_policy(zero)
            .build()
            .is_err());
    }

    #[test]
    fn test_builder_with_all_options() {
        let client = ClientBuilder::default()
            .base_url("http://localhost:3333/")
            .with_tokens("test-token", Some("refresh-token".to_string()))
            .rotation_policy(RotationPolicy::Require)
            .on_session_expired(|| {})
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(100)
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "http://localhost:3333");
        assert_eq!(client.retry_policy().max_attempts, 5);
        assert_eq!(
            client.token_store().access_token().as_deref(),
            Some("test-token")
        );
    }

    #[tokio::test]
    async fn test_login_stores_tokens() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({ "username": "ana", "password": "secret" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statusCode": 200,
                "success": true,
                "data": {
                    "token": "login-access",
                    "refreshToken": "login-refresh",
                    "user": { "id": "u1", "name": "Ana", "role": "client" }
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ApiClient::builder()
            .base_url(mock_server.uri())
            .build()
            .unwrap();

        let outcome = client.login("ana", "secret").await.unwrap();
        assert!(outcome.refreshable);
        assert_eq!(outcome.user.unwrap().role.as_deref(), Some("client"));
        assert_eq!(
            client.token_store().access_token().as_deref(),
            Some("login-access")
        );
        assert_eq!(
            client.token_store().refresh_token().as_deref(),
            Some("login-refresh")
        );
    }

    #[tokio::test]
    async fn test_login_bad_credentials_does_not_touch_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = ApiClient::builder()
            .base_url(mock_server.uri())
            .with_tokens("old-access", Some("old-refresh".to_string()))
            .build()
            .unwrap();

        let err = client.login("ana", "wrong").await.unwrap_err();
        assert_eq!(err.message(), "Invalid credentials");
        assert_eq!(
            client.token_store().refresh_token().as_deref(),
            Some("old-refresh")
        );
    }

    #[tokio::test]
    async fn test_login_without_token_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Account locked"
            })))
            .mount(&mock_server)
            .await;

        let client = ApiClient::builder()
            .base_url(mock_server.uri())
            .build()
            .unwrap();

        let err = client.login("ana", "secret").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse { ref message } if message == "Account locked"));
    }

    #[tokio::test]
    async fn test_get_data_unwraps_envelope() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": "u1", "username": "ana" }
            })))
            .mount(&mock_server)
            .await;

        let client = ApiClient::builder()
            .base_url(mock_server.uri())
            .with_tokens("test-token", None)
            .build()
            .unwrap();

        let me: SessionUser = client.get_data("/me").await.unwrap();
        assert_eq!(me.username.as_deref(), Some("ana"));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let client = ApiClient::builder()
            .base_url("http://localhost")
            .with_tokens("a", Some("r".to_string()))
            .build()
            .unwrap();

        assert!(matches!(client.session_status(), SessionStatus::Active { can_refresh: true, .. }));
        client.logout();
        assert_eq!(client.session_status(), SessionStatus::Anonymous);
    }
}
