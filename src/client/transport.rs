//! Blocking HTTP plumbing shared by the exchange and sentiment clients.

use std::{fmt::Debug, sync::Arc, time::Duration};

use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{ApiErrorPayload, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request as the clients describe it, before any transport sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn query<K, V>(mut self, params: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.query.extend(
            params
                .iter()
                .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned())),
        );
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first header named `name`, ignoring ASCII case.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Sends requests. The production implementation is [`BlockingTransport`];
/// tests substitute canned responses.
pub trait Transport: Debug + Send + Sync {
    /// Performs `request` and returns whatever the server answered,
    /// regardless of status.
    ///
    /// # Errors
    ///
    /// [`Error::Network`] when no response was received.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct BlockingTransport {
    client: reqwest::blocking::Client,
}

impl BlockingTransport {
    /// # Errors
    ///
    /// [`Error::Usage`] when the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quantedge-upbit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Usage(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl Transport for BlockingTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .map_err(|e| Error::network(&request.url, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| Error::network(&request.url, e))?;

        Ok(HttpResponse { status, body })
    }
}

/// A base URL plus the transport that reaches it.
#[derive(Debug, Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl HttpClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path` (which starts with `/`).
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends `request` and decodes a 2xx JSON body into `T`.
    ///
    /// # Errors
    ///
    /// [`Error::Network`], [`Error::Http`] for non-2xx statuses, or
    /// [`Error::Decode`] when the body does not match `T`.
    pub fn execute<T: DeserializeOwned>(&self, request: &HttpRequest) -> Result<T> {
        debug!(method = ?request.method, url = %request.url, "sending request");

        let response = self.transport.send(request)?;
        decode_response(&request.url, &response)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorPayload,
}

pub(crate) fn decode_response<T: DeserializeOwned>(url: &str, response: &HttpResponse) -> Result<T> {
    if !(200..300).contains(&response.status) {
        let payload = serde_json::from_str::<ErrorEnvelope>(&response.body)
            .ok()
            .map(|envelope| envelope.error);

        warn!(status = response.status, %url, error = ?payload, "request failed");

        return Err(Error::Http {
            status: response.status,
            payload,
            body: Some(response.body.clone()),
            url: url.to_owned(),
        });
    }

    serde_json::from_str(&response.body).map_err(|source| Error::Decode {
        url: url.to_owned(),
        source,
    })
}
