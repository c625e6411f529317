//! Transport client for the marketplace REST API.
//!
//! Every request is sent to `base_url + path` with a merged header set,
//! bounded by the configured timeout, and classified into either a decoded
//! [`ApiEnvelope`] or a [`TransportError`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::TokenSlot;
use crate::config::ApiConfig;

use super::envelope::{ApiEnvelope, RawEnvelope};
use super::TransportError;

/// Per-request knobs beyond method, path, and body.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers layered over the client defaults
    pub headers: HeaderMap,
    /// Query parameters appended to the URL
    pub query: Vec<(String, String)>,
    /// Keep a caller-supplied `Authorization` header instead of the
    /// session token. Without this the session token always wins.
    pub keep_caller_auth: bool,
}

impl RequestOptions {
    pub fn with_headers(headers: HeaderMap) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    pub fn with_query(query: Vec<(String, String)>) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }
}

/// API client for the marketplace backend.
/// Clone is cheap - reqwest::Client and the token slot are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    default_headers: HeaderMap,
    slot: Arc<TokenSlot>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, slot: Arc<TokenSlot>) -> Result<Self, TransportError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            default_headers: config.default_headers,
            slot,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn token_slot(&self) -> &Arc<TokenSlot> {
        &self.slot
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Defaults < caller headers < bearer token from the slot
    fn merged_headers(&self, options: &RequestOptions) -> Result<HeaderMap, TransportError> {
        let mut headers = self.default_headers.clone();
        for name in options.headers.keys() {
            headers.remove(name);
            for value in options.headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        let caller_auth = options.keep_caller_auth && options.headers.contains_key(header::AUTHORIZATION);
        if !caller_auth {
            if let Some(token) = self.slot.get() {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| TransportError::InvalidRequest(format!("bad token header: {}", e)))?;
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
        }
        Ok(headers)
    }

    /// Send a request and decode the response envelope.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<ApiEnvelope<T>, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let options = RequestOptions::with_headers(extra_headers.unwrap_or_default());
        self.request_with(method, path, body, options).await
    }

    pub async fn request_with<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<ApiEnvelope<T>, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let headers = self.merged_headers(&options)?;

        let mut builder = self.client.request(method.clone(), &url).headers(headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| TransportError::InvalidRequest(format!("body serialization failed: {}", e)))?;
            builder = builder.body(bytes);
        }

        debug!(method = %method, url = %url, "Sending request");

        // Dropping this future on timeout abandons the call; nothing after
        // the await below runs for a late response.
        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let text = response.text().await?;
            Ok::<_, TransportError>((status, text))
        };

        let (status, text) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    method = %method,
                    url = %url,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Request timed out"
                );
                return Err(TransportError::Timeout);
            }
        };

        debug!(method = %method, url = %url, status, "Response received");
        self.classify(status, &text)
    }

    fn classify<T: DeserializeOwned>(&self, status: u16, body: &str) -> Result<ApiEnvelope<T>, TransportError> {
        if status == 401 {
            warn!("Authorization failure, clearing session token");
            self.slot.clear();
            return Err(TransportError::Unauthorized);
        }

        let raw = RawEnvelope::parse(body);

        if !(200..300).contains(&status) {
            debug!(status, body = %TransportError::truncate_body(body), "Request failed");
            return Err(TransportError::from_status(status, raw.message));
        }
        if !raw.is_success() {
            debug!(status, "Envelope reported failure");
            return Err(TransportError::from_status(status, raw.message));
        }

        raw.decode(status)
    }

    // ===== Verb helpers =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiEnvelope<T>, TransportError> {
        self.request::<T, ()>(Method::GET, path, None, None).await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiEnvelope<T>, TransportError> {
        self.request_with::<T, ()>(Method::GET, path, None, options).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiEnvelope<T>, TransportError> {
        self.request(Method::POST, path, Some(body), None).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiEnvelope<T>, TransportError> {
        self.request(Method::PUT, path, Some(body), None).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiEnvelope<T>, TransportError> {
        self.request(Method::PATCH, path, Some(body), None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiEnvelope<T>, TransportError> {
        self.request::<T, ()>(Method::DELETE, path, None, None).await
    }
}
