use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use crate::engine::error::TransportError;
use crate::schema::field_model::HttpMethod;

/// A fully resolved outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Seam between the engine and the network.
///
/// Implementations must be shareable across threads: the initial load runs
/// independent fetches concurrently.
pub trait Transport: Send + Sync {
    fn send(&self, request: &FetchRequest) -> Result<TransportResponse, TransportError>;
}

// ============================================================================
// HTTP transport (reqwest, blocking)
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    /// Sent with every request unless the request sets the same header
    pub default_headers: BTreeMap<String, String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            default_headers: BTreeMap::new(),
        }
    }
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    default_headers: BTreeMap<String, String>,
}

impl HttpTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self, TransportError> {
        let mut builder = reqwest::blocking::Client::builder().timeout(settings.timeout);
        if let Some(agent) = &settings.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder.build().map_err(TransportError::Client)?;

        Ok(Self {
            client,
            default_headers: settings.default_headers.clone(),
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &FetchRequest) -> Result<TransportResponse, TransportError> {
        let mut headers = self.default_headers.clone();
        headers.extend(request.headers.clone());

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|e| TransportError::Request {
            url: request.url.clone(),
            source: e,
        })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| TransportError::Request {
            url: request.url.clone(),
            source: e,
        })?;

        Ok(TransportResponse { status, body })
    }
}

// ============================================================================
// Mock transport (for testing without a network)
// ============================================================================

#[derive(Debug, Clone)]
pub enum MockReply {
    Json { status: u16, body: Value },
    Text { status: u16, body: String },
    Fail(String),
}

/// Serves canned replies keyed by exact URL and records every request.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, MockReply>>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, url: &str, body: Value) -> Self {
        self.route(url, MockReply::Json { status: 200, body });
        self
    }

    pub fn with_reply(self, url: &str, reply: MockReply) -> Self {
        self.route(url, reply);
        self
    }

    pub fn route(&self, url: &str, reply: MockReply) {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        routes.insert(url.to_string(), reply);
    }

    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.url == url)
            .count()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &FetchRequest) -> Result<TransportResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let reply = self
            .routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&request.url)
            .cloned();

        match reply {
            Some(MockReply::Json { status, body }) => Ok(TransportResponse {
                status,
                body: body.to_string(),
            }),
            Some(MockReply::Text { status, body }) => Ok(TransportResponse { status, body }),
            Some(MockReply::Fail(reason)) => Err(TransportError::Unreachable {
                url: request.url.clone(),
                reason,
            }),
            None => Err(TransportError::Unreachable {
                url: request.url.clone(),
                reason: "no mock route".to_string(),
            }),
        }
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &FetchRequest) -> Result<TransportResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: &FetchRequest) -> Result<TransportResponse, TransportError> {
        (**self).send(request)
    }
}
