use crate::domain::SessionToken;
use crate::endpoints::ROOT_PATH;
use crate::telemetry::error_chain_fmt;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;
use std::time::Duration;
use tracing::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// Value of the `Authorization` header sent with a request.
#[derive(Debug, Clone, Default)]
pub enum Authorization {
    #[default]
    None,
    Bearer(SessionToken),
    /// Sent verbatim, e.g. a token without the `Bearer` prefix.
    Raw(Secret<String>),
}

impl Authorization {
    fn header_value(&self) -> Option<String> {
        match self {
            Authorization::None => None,
            Authorization::Bearer(token) => Some(token.header_value()),
            Authorization::Raw(value) => Some(value.expose_secret().clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub authorization: Authorization,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
            authorization: Authorization::None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: Some(body),
            authorization: Authorization::None,
        }
    }

    pub fn with_authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = authorization;
        self
    }
}

/// Response of the target service, whatever its status code.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// `Null` for an empty body, a JSON string for a non-JSON body.
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Transport,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::Connect => write!(f, "connect"),
            TransportErrorKind::Transport => write!(f, "transport"),
        }
    }
}

#[derive(thiserror::Error)]
pub enum TransportError {
    #[error("The request timed out.")]
    Timeout(#[source] reqwest::Error),
    #[error("Failed to connect to the target service.")]
    Connect(#[source] reqwest::Error),
    #[error("The request could not be completed.")]
    Other(#[source] reqwest::Error),
}

impl TransportError {
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            TransportError::Timeout(_) => TransportErrorKind::Timeout,
            TransportError::Connect(_) => TransportErrorKind::Connect,
            TransportError::Other(_) => TransportErrorKind::Transport,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e)
        } else if e.is_connect() {
            TransportError::Connect(e)
        } else {
            TransportError::Other(e)
        }
    }
}

impl std::fmt::Debug for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Raised before any scenario runs. Aborts the whole run.
#[derive(thiserror::Error)]
pub enum SetupError {
    #[error("Prerequisite service unavailable at {base_url}.")]
    Unavailable {
        base_url: String,
        #[source]
        source: TransportError,
    },
}

impl std::fmt::Debug for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http_client: Client,
}

impl ApiClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Send `request` exactly once.
    ///
    /// Non-2xx responses are returned as `Ok`; only a transport failure is an `Err`.
    #[tracing::instrument(
        name = "Sending API request",
        skip(self, request),
        fields(
            method = %request.method,
            path = %request.path,
            status = tracing::field::Empty
        )
    )]
    pub async fn request(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            HttpMethod::Get => self.http_client.get(&url),
            HttpMethod::Post => self.http_client.post(&url),
        };
        if let Some(value) = request.authorization.header_value() {
            builder = builder.header(reqwest::header::AUTHORIZATION, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            let e = TransportError::from(e);
            tracing::error!(error.kind = %e.kind(), "Failed to send request: {:?}", e);
            e
        })?;

        let status = response.status().as_u16();
        Span::current().record("status", status);
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response.bytes().await?;

        Ok(ApiResponse {
            status,
            headers,
            body: parse_body(&bytes),
        })
    }

    /// Liveness probe on `GET /`. Any HTTP response, even a 404, means the service is up.
    #[tracing::instrument(
        name = "Probing target service",
        skip(self),
        fields(base_url = %self.base_url)
    )]
    pub async fn probe(&self) -> Result<u16, SetupError> {
        self.request(&ApiRequest::get(ROOT_PATH))
            .await
            .map(|response| response.status)
            .map_err(|source| SetupError::Unavailable {
                base_url: self.base_url.clone(),
                source,
            })
    }
}

fn parse_body(bytes: &[u8]) -> serde_json::Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
