// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP transport abstraction
//!
//! The admin API only needs "send a request, get status + headers + a body
//! stream back". [`AdminTransport`] captures that so the decoding pipeline
//! can run against the real broker ([`HttpTransport`]) or canned responses
//! ([`MockTransport`]).
//!
//! Response bodies are streamed. A [`RawResponse`] owns its connection and
//! releases it when dropped, whichever path drops it.

use crate::codec::BatchBuilder;
use crate::config::ClientConfig;
use crate::error::{AdminError, Result, TransportError};
use crate::message::{MessageId, Properties};
use crate::response::{BATCH_HEADER, MESSAGE_ID_HEADER, PROPERTY_PREFIX, PUBLISH_TIME_HEADER};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::VecDeque;
use std::fmt;
use std::io::{Cursor, Read};
use std::sync::{Mutex, MutexGuard};

/// A request against the admin API.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminRequest {
    pub method: Method,
    /// Path segments below the admin prefix, unescaped.
    pub path: Vec<String>,
    pub body: Option<serde_json::Value>,
}

impl AdminRequest {
    pub fn new(method: Method, path: Vec<String>) -> Self {
        Self {
            method,
            path,
            body: None,
        }
    }

    pub fn get(path: Vec<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn put(path: Vec<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn post(path: Vec<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: Vec<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// `/`-joined path, for logs and assertions.
    pub fn path_string(&self) -> String {
        self.path.join("/")
    }
}

/// Status, headers and a streamed body.
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Box<dyn Read + Send>,
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl RawResponse {
    /// Read the whole body.
    pub fn bytes(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.body
            .read_to_end(&mut buf)
            .map_err(AdminError::BodyRead)?;
        Ok(buf)
    }

    /// Read the whole body and decode it as JSON.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes()?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Abstract admin API transport.
pub trait AdminTransport: Send + Sync {
    /// Issue one request. Non-2xx statuses are returned as-is; callers run
    /// [`check_successful`] before decoding.
    fn request(&self, request: AdminRequest) -> Result<RawResponse>;
}

impl<T: AdminTransport + ?Sized> AdminTransport for &T {
    fn request(&self, request: AdminRequest) -> Result<RawResponse> {
        (**self).request(request)
    }
}

impl<T: AdminTransport + ?Sized> AdminTransport for Box<T> {
    fn request(&self, request: AdminRequest) -> Result<RawResponse> {
        (**self).request(request)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    reason: String,
}

/// Turn a non-2xx response into [`TransportError::Status`].
///
/// The broker reports failures as `{"reason": "..."}`; other bodies are used
/// verbatim, and an empty body falls back to the canonical status text.
pub fn check_successful(response: RawResponse) -> Result<RawResponse> {
    if response.status.is_success() {
        return Ok(response);
    }

    let status = response.status;
    let body = response.bytes().unwrap_or_default();
    let reason = match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(parsed) => parsed.reason,
        Err(_) => String::from_utf8_lossy(&body).trim().to_string(),
    };
    let reason = if reason.is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        reason
    };

    Err(TransportError::Status { status, reason }.into())
}

/// Send a request and require a 2xx status.
pub fn send<T>(transport: &T, request: AdminRequest) -> Result<RawResponse>
where
    T: AdminTransport + ?Sized,
{
    check_successful(transport.request(request)?)
}

/// Send a request, require a 2xx status and discard the body.
pub fn send_unit<T: AdminTransport + ?Sized>(transport: &T, request: AdminRequest) -> Result<()> {
    send(transport, request).map(drop)
}

/// Send a request, require a 2xx status and decode the JSON body.
pub fn send_json<T, R>(transport: &T, request: AdminRequest) -> Result<R>
where
    T: AdminTransport + ?Sized,
    R: DeserializeOwned,
{
    send(transport, request)?.json()
}

// ============================================================================
// reqwest implementation
// ============================================================================

/// Blocking HTTP transport backed by `reqwest`.
///
/// No retries: connection failures and timeouts surface as
/// [`TransportError::Http`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    admin_segments: Vec<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.base_url()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("pulsar-admin-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::Http)?;

        Ok(Self {
            client,
            base_url,
            admin_segments: config
                .admin_segments()
                .into_iter()
                .map(String::from)
                .collect(),
        })
    }

    /// Full URL for a path below the admin prefix. Each segment is
    /// percent-encoded, `/` included.
    pub fn endpoint(&self, path: &[String]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransportError::Url(format!("{} cannot be used as a base URL", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend(self.admin_segments.iter())
                .extend(path.iter());
        }
        Ok(url)
    }
}

impl AdminTransport for HttpTransport {
    fn request(&self, request: AdminRequest) -> Result<RawResponse> {
        let url = self.endpoint(&request.path)?;
        tracing::debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method, url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(TransportError::Http)?;
        tracing::debug!("-> {}", response.status());

        Ok(RawResponse {
            status: response.status(),
            headers: response.headers().clone(),
            body: Box::new(response),
        })
    }
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

/// A canned response served by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Peek response for a non-batched entry.
    pub fn single_message(id: MessageId, payload: &[u8], properties: &Properties) -> Self {
        properties
            .iter()
            .fold(Self::new(StatusCode::OK), |resp, (k, v)| {
                resp.header(format!("{}{}", PROPERTY_PREFIX, k), v.clone())
            })
            .header(MESSAGE_ID_HEADER, id.to_string())
            .header(PUBLISH_TIME_HEADER, "2024-05-01T10:00:00.000Z")
            .body(payload)
    }

    /// Peek response for a batched entry.
    pub fn batch(id: MessageId, batch: BatchBuilder) -> Self {
        let count = batch.len();
        Self::new(StatusCode::OK)
            .header(MESSAGE_ID_HEADER, id.to_string())
            .header(PUBLISH_TIME_HEADER, "2024-05-01T10:00:00.000Z")
            .header(BATCH_HEADER, count.to_string())
            .body(batch.build())
    }

    fn into_raw(self) -> Result<RawResponse> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Url(format!("mock header {:?}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Url(format!("mock header value {:?}: {}", value, e)))?;
            headers.append(name, value);
        }
        Ok(RawResponse {
            status: self.status,
            headers,
            body: Box::new(Cursor::new(self.body)),
        })
    }
}

/// Mock transport replaying queued responses in order.
///
/// Once the queue is empty every request gets a 404, which is what the
/// broker answers when peeking past the end of the backlog.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<AdminRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn push(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    /// Queue an empty 204 response.
    pub fn push_no_content(&self) {
        self.push(MockResponse::new(StatusCode::NO_CONTENT));
    }

    /// Queue a 200 response with a JSON body.
    pub fn push_json(&self, value: &serde_json::Value) {
        self.push(
            MockResponse::new(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(value.to_string()),
        );
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<AdminRequest> {
        lock(&self.requests).clone()
    }

    /// Number of queued responses not yet served.
    pub fn pending(&self) -> usize {
        lock(&self.responses).len()
    }
}

impl AdminTransport for MockTransport {
    fn request(&self, request: AdminRequest) -> Result<RawResponse> {
        lock(&self.requests).push(request);

        let response = lock(&self.responses).pop_front().unwrap_or_else(|| {
            MockResponse::new(StatusCode::NOT_FOUND).body(r#"{"reason":"Message not found"}"#)
        });
        response.into_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: StatusCode, body: &str) -> RawResponse {
        MockResponse::new(status).body(body).into_raw().unwrap()
    }

    #[test]
    fn test_check_successful_passes_2xx() {
        let resp = check_successful(raw(StatusCode::NO_CONTENT, "")).unwrap();
        assert_eq!(resp.status, StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_check_successful_json_reason() {
        let err = check_successful(raw(
            StatusCode::NOT_FOUND,
            r#"{"reason":"Subscription not found"}"#,
        ))
        .unwrap_err();
        match err {
            AdminError::Transport(TransportError::Status { status, reason }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(reason, "Subscription not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_check_successful_text_and_empty_bodies() {
        let err = check_successful(raw(StatusCode::CONFLICT, "  already exists\n")).unwrap_err();
        assert!(err.to_string().ends_with("409 Conflict: already exists"));

        let err = check_successful(raw(StatusCode::SERVICE_UNAVAILABLE, "")).unwrap_err();
        assert!(err
            .to_string()
            .ends_with("503 Service Unavailable: Service Unavailable"));
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let config = ClientConfig::builder()
            .web_service_url("http://broker:8080/")
            .build()
            .unwrap();
        let transport = HttpTransport::new(&config).unwrap();

        let url = transport
            .endpoint(&[
                "persistent".to_string(),
                "public".to_string(),
                "default".to_string(),
                "a/b".to_string(),
                "subscription".to_string(),
                "my sub".to_string(),
            ])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://broker:8080/admin/v2/persistent/public/default/a%2Fb/subscription/my%20sub"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = ClientConfig::builder()
            .web_service_url("https://gateway.example.com/pulsar")
            .admin_path("admin/v2/")
            .build()
            .unwrap();
        let transport = HttpTransport::new(&config).unwrap();

        let url = transport.endpoint(&["clusters".to_string()]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gateway.example.com/pulsar/admin/v2/clusters"
        );
    }

    #[test]
    fn test_mock_replays_then_404() {
        let mock = MockTransport::new();
        mock.push_json(&serde_json::json!(["sub-a"]));
        assert_eq!(mock.pending(), 1);

        let names: Vec<String> =
            send_json(&mock, AdminRequest::get(vec!["subscriptions".into()])).unwrap();
        assert_eq!(names, vec!["sub-a"]);

        let err = send_unit(&mock, AdminRequest::get(vec!["again".into()])).unwrap_err();
        assert!(err.is_not_found());

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[1].path_string(), "again");
    }

    #[test]
    fn test_mock_single_message_headers() {
        let props = Properties::from([("foo".to_string(), "bar".to_string())]);
        let resp = MockResponse::single_message(MessageId::new(3, 4), b"hi", &props)
            .into_raw()
            .unwrap();

        assert_eq!(resp.headers.get(MESSAGE_ID_HEADER).unwrap(), "3:4");
        assert_eq!(resp.headers.get("x-pulsar-property-foo").unwrap(), "bar");
        assert_eq!(resp.bytes().unwrap(), b"hi");
    }
}
