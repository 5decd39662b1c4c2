//! Social Client
//!
//! Main client for the social REST API, combining configuration, the HTTP
//! gateway and the active session.

use url::Url;

use super::auth::{Session, SessionContext};
use super::http::HttpGateway;
use crate::config::ClientConfig;
use crate::error::{Result, ServiceError, ServiceErrorKind};
use crate::service::{ActivityService, IdentityService};

/// Main social client
#[derive(Clone)]
pub struct SocialClient {
    config: ClientConfig,
    http: HttpGateway,
    session: SessionContext,
}

impl SocialClient {
    /// Create a new client with an anonymous session
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = HttpGateway::new(&config)?;
        Ok(Self::with_gateway(config, http))
    }

    /// Create a client on top of an existing gateway
    pub fn with_gateway(config: ClientConfig, http: HttpGateway) -> Self {
        Self {
            config,
            http,
            session: SessionContext::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Gateway whose errors are attributed to `service`
    pub fn gateway(&self, service: &'static str) -> HttpGateway {
        self.http.with_service(service)
    }

    /// The shared session context
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Snapshot of the active session
    pub fn current_session(&self) -> Session {
        self.session.current()
    }

    pub fn start_session_as(&self, username: &str, password: &str) {
        self.session.start_session_as(username, password);
    }

    pub fn start_session_as_anonymous(&self) {
        self.session.start_session_as_anonymous();
    }

    pub fn end_session(&self) {
        self.session.end_session();
    }

    /// A client sharing this one's connection pool but bound to its own session
    pub fn with_session(&self, session: Session) -> Self {
        Self {
            config: self.config.clone(),
            http: self.http.clone(),
            session: SessionContext::new(session),
        }
    }

    pub fn activities(&self) -> ActivityService {
        ActivityService::new(self.clone())
    }

    pub fn identities(&self) -> IdentityService {
        IdentityService::new(self.clone())
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build an authenticated API URL: `{server}/{rest}/private/api/social/{version}/{container}/{path}`
    pub fn api_url(&self, service: &'static str, path: &str) -> std::result::Result<Url, ServiceError> {
        self.config
            .base_url(true)
            .and_then(|base| base.join(path))
            .map_err(|e| ServiceError::new(service, ServiceErrorKind::InvalidUrl(e)))
    }

    /// Same as [`api_url`](Self::api_url) with query parameters appended in order
    pub fn api_url_with_query<'a>(
        &self,
        service: &'static str,
        path: &str,
        query: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> std::result::Result<Url, ServiceError> {
        let mut url = self.api_url(service, path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }
}

/// Encode one path segment (ids may contain reserved characters)
///
/// Empty, `.` and `..` ids are rejected: URL resolution would drop them and
/// the request would reach another endpoint.
pub(crate) fn segment(service: &'static str, value: &str) -> std::result::Result<String, ServiceError> {
    if matches!(value, "" | "." | "..") {
        return Err(ServiceError::new(
            service,
            ServiceErrorKind::InvalidSegment(value.to_string()),
        ));
    }
    Ok(urlencoding::encode(value).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SocialClient {
        SocialClient::new(ClientConfig::new("http://localhost:8080")).unwrap()
    }

    #[test]
    fn test_api_url() {
        let url = client().api_url("activity", "activity/a1.json").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/rest/private/api/social/v1-alpha1/portal/activity/a1.json"
        );
    }

    #[test]
    fn test_api_url_with_query() {
        let url = client()
            .api_url_with_query("activity", "activity/a1.json", [("activityStream", "t")])
            .unwrap();
        assert!(url.as_str().ends_with("activity/a1.json?activityStream=t"));

        let url = client()
            .api_url_with_query("activity", "activity/a1.json", [])
            .unwrap();
        assert!(url.query().is_none());
    }

    #[test]
    fn test_invalid_server_url() {
        let client = SocialClient::new(ClientConfig::new("::nope")).unwrap();
        let err = client.api_url("activity", "activity.json").unwrap_err();
        assert!(matches!(err.kind, ServiceErrorKind::InvalidUrl(_)));
        assert_eq!(err.service, "activity");
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("activity", "a b/c").unwrap(), "a%20b%2Fc");
        assert_eq!(segment("activity", "v1.2").unwrap(), "v1.2");
        assert_eq!(segment("activity", "...").unwrap(), "...");
    }

    #[test]
    fn test_segment_rejects_dot_segments() {
        for id in ["", ".", ".."] {
            let err = segment("activity_stream", id).unwrap_err();
            assert_eq!(err.service, "activity_stream");
            assert!(matches!(err.kind, ServiceErrorKind::InvalidSegment(ref s) if s == id));
        }
    }

    #[test]
    fn test_with_session_is_isolated() {
        let shared = client();
        shared.start_session_as("demo", "gtn");
        let isolated = shared.with_session(Session::Anonymous);
        assert!(isolated.current_session().is_anonymous());
        assert!(!shared.current_session().is_anonymous());
    }
}
