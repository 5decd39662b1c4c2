//! Session and credential handling
//!
//! The gateway never reads credentials from a hidden global: callers pass a
//! [`Session`] explicitly. [`SessionContext`] is the shared "current session"
//! that [`SocialClient`](super::client::SocialClient) snapshots before every
//! authenticated call. Only one identity can be active per context at a time;
//! callers working as several users concurrently should give each its own
//! context via `SocialClient::with_session`.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Username and password for HTTP Basic authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

// Security: never print the password
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Who requests are made as
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    User(Credentials),
}

impl Session {
    pub fn user(username: impl Into<String>, password: impl Into<String>) -> Self {
        Session::User(Credentials::new(username, password))
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            Session::Anonymous => None,
            Session::User(credentials) => Some(credentials),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Session::Anonymous)
    }
}

/// Shared, switchable active session
///
/// Set by `start_session_as*`, read on every authenticated request, cleared
/// by `end_session`. Clones share the same underlying session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    current: Arc<RwLock<Session>>,
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self {
            current: Arc::new(RwLock::new(session)),
        }
    }

    /// Start authenticating as the given user
    pub fn start_session_as(&self, username: impl Into<String>, password: impl Into<String>) {
        let session = Session::user(username, password);
        tracing::debug!(
            "Session started for user {}",
            session.credentials().map(Credentials::username).unwrap_or_default()
        );
        self.replace(session);
    }

    pub fn start_session_as_anonymous(&self) {
        tracing::debug!("Anonymous session started");
        self.replace(Session::Anonymous);
    }

    /// Clear the active credentials
    pub fn end_session(&self) {
        tracing::debug!("Session ended");
        self.replace(Session::Anonymous);
    }

    /// Snapshot of the active session
    pub fn current(&self) -> Session {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, session: Session) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let context = SessionContext::default();
        assert!(context.current().is_anonymous());

        context.start_session_as("demo", "gtn");
        let session = context.current();
        let credentials = session.credentials().unwrap();
        assert_eq!(credentials.username(), "demo");
        assert_eq!(credentials.password(), "gtn");

        context.start_session_as_anonymous();
        assert!(context.current().is_anonymous());

        context.start_session_as("john", "secret");
        context.end_session();
        assert_eq!(context.current(), Session::Anonymous);
    }

    #[test]
    fn test_clones_share_state() {
        let context = SessionContext::default();
        let other = context.clone();
        context.start_session_as("demo", "gtn");
        assert_eq!(other.current(), Session::user("demo", "gtn"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("demo", "gtn"));
        assert!(debug.contains("demo"));
        assert!(!debug.contains("gtn"));
    }
}
