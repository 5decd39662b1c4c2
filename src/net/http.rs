//! HTTP gateway for social REST API calls
//!
//! Every request is executed under an [`AuthPolicy`], the body is drained,
//! and the outcome is classified into success or a [`ServiceError`]. Raw
//! transport errors never escape this module.

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, StatusCode};

use super::auth::Session;
use crate::config::ClientConfig;
use crate::error::{Error, ServiceError, ServiceErrorKind};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// How credentials are attached to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    NoAuth,
    /// HTTP Basic with the credentials of the session passed to the call
    BasicAuth,
}

/// A fully drained HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    body: String,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// HTTP gateway, tagged with the service it issues requests for
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    service: &'static str,
}

impl HttpGateway {
    /// Create a gateway from client configuration
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::transport("http", e))?;

        Ok(Self::from_client(client))
    }

    /// Wrap an existing reqwest client
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            service: "http",
        }
    }

    /// Same connection pool, errors attributed to another service
    pub fn with_service(&self, service: &'static str) -> Self {
        Self {
            client: self.client.clone(),
            service,
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Execute a GET request
    pub async fn execute_get(
        &self,
        url: &str,
        policy: AuthPolicy,
        session: &Session,
    ) -> Result<Response, ServiceError> {
        tracing::debug!("GET {}", url);
        self.execute(self.client.get(url), policy, session).await
    }

    /// Execute a POST request with an optional JSON body
    pub async fn execute_post(
        &self,
        url: &str,
        policy: AuthPolicy,
        session: &Session,
        body: Option<String>,
    ) -> Result<Response, ServiceError> {
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        self.execute(request, policy, session).await
    }

    /// Classify a response: 2xx passes, anything else becomes a `ServiceError`
    pub fn handle_error(&self, response: &Response) -> Result<(), ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
        tracing::error!(
            "{} API error: {} - {}",
            self.service,
            status,
            sanitize_for_log(response.body())
        );

        let body = Some(response.body())
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        let kind = if status == StatusCode::NOT_FOUND {
            ServiceErrorKind::NotFound { body }
        } else {
            ServiceErrorKind::Status {
                status: status.as_u16(),
                body,
            }
        };
        Err(ServiceError::new(self.service, kind))
    }

    /// GET and classify, returning the body of a successful response
    pub async fn get(
        &self,
        url: &str,
        policy: AuthPolicy,
        session: &Session,
    ) -> Result<String, ServiceError> {
        let response = self.execute_get(url, policy, session).await?;
        self.handle_error(&response)?;
        Ok(response.into_body())
    }

    /// POST and classify, returning the body of a successful response
    pub async fn post(
        &self,
        url: &str,
        policy: AuthPolicy,
        session: &Session,
        body: Option<String>,
    ) -> Result<String, ServiceError> {
        let response = self.execute_post(url, policy, session, body).await?;
        self.handle_error(&response)?;
        Ok(response.into_body())
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        policy: AuthPolicy,
        session: &Session,
    ) -> Result<Response, ServiceError> {
        let request = match (policy, session.credentials()) {
            (AuthPolicy::BasicAuth, Some(credentials)) => {
                request.basic_auth(credentials.username(), Some(credentials.password()))
            }
            (AuthPolicy::BasicAuth, None) => {
                tracing::debug!("Basic auth requested with an anonymous session");
                request
            }
            (AuthPolicy::NoAuth, _) => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::transport(self.service, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::transport(self.service, e))?;

        tracing::debug!("{} -> {} ({} bytes)", self.service, status, body.len());
        Ok(Response::new(status, body))
    }
}

/// Format a client error for display
/// Security: Generic messages avoid echoing server internals to users
pub fn format_service_error(error: &Error) -> String {
    let Error::Service(err) = error else {
        return error.to_string();
    };

    match &err.kind {
        ServiceErrorKind::NotFound { .. } => "Resource not found.".to_string(),
        ServiceErrorKind::Status { status, .. } => match status {
            400 => "Invalid request. Check your parameters.".to_string(),
            401 => "Authentication failed. Check your username and password.".to_string(),
            403 => "Permission denied for the current session.".to_string(),
            409 => "Resource conflict. The resource may already exist.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            500..=599 => "Social server temporarily unavailable. Please try again.".to_string(),
            other => format!("Request failed (HTTP {}).", other),
        },
        ServiceErrorKind::Transport(_) => {
            "Could not reach the social server. Check your network connection and server URL."
                .to_string()
        }
        ServiceErrorKind::Parse(_) | ServiceErrorKind::InvalidResponse(_) => {
            "The server sent an unexpected response.".to_string()
        }
        ServiceErrorKind::InvalidUrl(_) => "Invalid server URL. Check your configuration.".to_string(),
        ServiceErrorKind::InvalidSegment(id) => format!("Invalid id '{}'.", id),
    }
}
