//! Single-request execution
//!
//! [`RequestExecutor`] performs exactly one HTTP call: it resolves the path
//! against the base URL, attaches the stored bearer token, and turns the
//! response into either a JSON value or a normalized [`HttpError`]. It never
//! retries and never writes to the token store.

use crate::auth::TokenStore;
use crate::error::{ApiError, HttpError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Per-call request description
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method
    pub method: Method,
    /// Caller headers; `Authorization` and `Content-Type` here win over the defaults
    pub headers: HeaderMap,
    /// Pre-serialized body
    pub body: Option<String>,
    /// When false, a successful response yields `Value::Null` without reading JSON
    pub parse_json: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            parse_json: true,
        }
    }
}

impl RequestOptions {
    /// Options for the given method and no body
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Set a pre-serialized body
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize a value as the JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }

    /// Add a header
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ApiError::InvalidRequest {
            message: format!("Invalid header name '{name}': {e}"),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| ApiError::InvalidRequest {
            message: format!("Invalid value for header '{name}': {e}"),
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Skip JSON parsing of the success body
    pub fn without_json(mut self) -> Self {
        self.parse_json = false;
        self
    }

    /// Replace the Authorization header with a bearer token
    pub(crate) fn set_bearer(&mut self, token: &str) -> Result<()> {
        self.headers.insert(AUTHORIZATION, bearer(token)?);
        Ok(())
    }
}

/// Executes one request against the API
#[derive(Clone)]
pub struct RequestExecutor {
    http_client: reqwest::Client,
    base_url: String,
    token_store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.base_url)
            .field("token_store", &self.token_store.name())
            .finish()
    }
}

impl RequestExecutor {
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
            token_store,
        }
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential store this executor reads from
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.token_store
    }

    /// Absolute URL for a relative API path
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Headers actually sent: defaults first, caller headers on top
    fn effective_headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !options.headers.contains_key(AUTHORIZATION) {
            if let Some(token) = self.token_store.access_token() {
                headers.insert(AUTHORIZATION, bearer(&token)?);
            }
        }

        for (name, value) in options.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        Ok(headers)
    }

    /// Perform one request and classify the outcome
    pub async fn execute(&self, path: &str, options: &RequestOptions) -> Result<Value> {
        let url = self.url_for(path);
        let headers = self.effective_headers(options)?;

        debug!("{} {}", options.method, url);

        let mut request = self
            .http_client
            .request(options.method.clone(), &url)
            .headers(headers);
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        let response = request.send().await.map_err(ApiError::HttpClient)?;
        let status = response.status();
        let response_headers = response.headers().clone();

        if status.is_success() && !options.parse_json {
            return Ok(Value::Null);
        }

        let text = response.text().await.map_err(ApiError::HttpClient)?;
        let data = parse_body(&text);

        if status.is_success() {
            debug!("{} {} -> {}", options.method, url, status.as_u16());
            return Ok(data.unwrap_or(Value::Null));
        }

        let error = HttpError::new(status, response_headers, data);
        debug!(
            "{} {} -> {} ({})",
            options.method,
            url,
            status.as_u16(),
            error.message
        );
        Err(ApiError::Http(error))
    }

    /// Access token the executor would attach to the given request, if any
    pub fn outgoing_token(&self, options: &RequestOptions) -> Option<String> {
        match options.headers.get(AUTHORIZATION) {
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string),
            None => self.token_store.access_token(),
        }
    }
}

fn bearer(token: &str) -> Result<HeaderValue> {
    let mut value =
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| ApiError::InvalidRequest {
            message: format!("Access token is not a valid header value: {e}"),
        })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Parse a body as JSON; empty or non-JSON bodies yield `None`
fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn executor(base: &str, token: Option<&str>) -> RequestExecutor {
        let store = match token {
            Some(t) => MemoryTokenStore::with_tokens(t, None),
            None => MemoryTokenStore::new(),
        };
        RequestExecutor::new(reqwest::Client::new(), base, Arc::new(store))
    }

    #[test]
    fn test_url_joining() {
        let exec = executor("https://api.quizhub.dev/", None);
        assert_eq!(exec.url_for("/quizzes"), "https://api.quizhub.dev/quizzes");
        assert_eq!(exec.url_for("me"), "https://api.quizhub.dev/me");
    }

    #[test]
    fn test_bearer_injected_when_absent() {
        let exec = executor("http://localhost", Some("stored"));
        let options = RequestOptions::default();
        let headers = exec.effective_headers(&options).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer stored");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(exec.outgoing_token(&options).as_deref(), Some("stored"));
    }

    #[test]
    fn test_caller_headers_win() {
        let exec = executor("http://localhost", Some("stored"));
        let options = RequestOptions::default()
            .header("Authorization", "Bearer explicit")
            .unwrap()
            .header("Content-Type", "text/plain")
            .unwrap();
        let headers = exec.effective_headers(&options).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer explicit");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(exec.outgoing_token(&options).as_deref(), Some("explicit"));
    }

    #[test]
    fn test_no_token_no_authorization() {
        let exec = executor("http://localhost", None);
        let headers = exec.effective_headers(&RequestOptions::default()).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_parse_body_tolerates_garbage() {
        assert_eq!(parse_body(""), None);
        assert_eq!(parse_body("  \n"), None);
        assert_eq!(parse_body("<html>"), None);
        assert_eq!(parse_body("{\"ok\":true}"), Some(serde_json::json!({ "ok": true })));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let result = RequestOptions::default().header("bad header", "x");
        assert!(matches!(result, Err(ApiError::InvalidRequest { .. })));
    }
}
