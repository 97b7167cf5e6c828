//! Session lifecycle: checking a stored token, logging in and out.
//!
//! The `SessionManager` is an owned value. Whoever holds it (the TUI `App`
//! or a one-shot CLI command) reads the session through `session()` and
//! mutates it only through `check_session`, `login` and `logout`.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::User;

use super::TokenStore;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Rejected(String),

    #[error("Unable to reach the server: {0}")]
    Network(#[source] ApiError),

    #[error("Login failed: {0}")]
    Remote(#[source] ApiError),

    #[error("Could not store session token: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Remote { status, message } if matches!(status, 400 | 401 | 403) => {
                AuthError::Rejected(message)
            }
            ApiError::Unauthorized => AuthError::Rejected("Invalid email or password".to_string()),
            e @ ApiError::Network(_) => AuthError::Network(e),
            other => AuthError::Remote(other),
        }
    }
}

impl AuthError {
    /// Message suitable for the login form
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Rejected(message) => message.clone(),
            AuthError::Network(e) | AuthError::Remote(e) => e.user_message(),
            AuthError::Storage(e) => format!("Could not save your session: {}", e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Authenticated,
    Unauthenticated,
}

/// Client-side view of the current login
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SessionState,
    pub user: Option<User>,
    pub token: Option<String>,
    pub loading: bool,
}

impl Session {
    /// Fresh session at start-up, before the token has been checked
    pub fn initializing() -> Self {
        Self {
            state: SessionState::Initializing,
            user: None,
            token: None,
            loading: true,
        }
    }

    pub fn logged_out() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            user: None,
            token: None,
            loading: false,
        }
    }

    fn authenticated(user: User, token: String) -> Self {
        Self {
            state: SessionState::Authenticated,
            user: Some(user),
            token: Some(token),
            loading: false,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

pub struct SessionManager {
    api: ApiClient,
    store: Box<dyn TokenStore>,
    session: Session,
}

impl SessionManager {
    /// `api` should carry no token; the manager attaches the stored one.
    pub fn new(api: ApiClient, store: Box<dyn TokenStore>) -> Self {
        Self {
            api: api.without_token(),
            store,
            session: Session::initializing(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// API client carrying the current bearer token, if any
    pub fn authorized_client(&self) -> ApiClient {
        match self.session.token() {
            Some(token) => self.api.with_token(token),
            None => self.api.without_token(),
        }
    }

    /// Revalidate the stored token against the server.
    ///
    /// Never fails: any problem leaves the session logged out and the stored
    /// token removed. `loading` is false on return in every path.
    pub async fn check_session(&mut self) -> &Session {
        if let Err(e) = self.revalidate().await {
            warn!(error = %e, "Session check failed");
        }
        &self.session
    }

    /// Shared body of `check_session` and `login`. On `Err` the session is
    /// already logged out and the token discarded.
    async fn revalidate(&mut self) -> Result<(), ApiError> {
        self.session.loading = true;

        let token = match self.store.load() {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token, discarding it");
                self.discard_token();
                return Ok(());
            }
        };

        let Some(token) = token else {
            debug!("No stored token");
            self.session = Session::logged_out();
            return Ok(());
        };

        if let Ok(Some(saved_at)) = self.store.saved_at() {
            let age = Utc::now() - saved_at;
            debug!(age_hours = age.num_hours(), "Verifying stored token");
        }

        match self.api.with_token(token.as_str()).get_user().await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "Session verified");
                self.session = Session::authenticated(user, token);
                Ok(())
            }
            Ok(None) => {
                info!("Server did not recognise the stored token");
                self.discard_token();
                Ok(())
            }
            Err(e) => {
                self.discard_token();
                Err(e)
            }
        }
    }

    /// Log in, persist the token, then re-check the session to load the user
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let response = match self.api.login(email, password).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login failed");
                return Err(e.into());
            }
        };

        let token = response
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AuthError::Rejected("Login response did not include a token".to_string()))?;

        self.store.save(&token)?;
        info!("Login accepted, verifying session");

        if let Err(e) = self.revalidate().await {
            warn!(error = %e, "Could not verify the new session");
            return Err(e.into());
        }
        self.session
            .user()
            .cloned()
            .ok_or_else(|| AuthError::Rejected("Could not verify the new session".to_string()))
    }

    /// Drop the session after the server refused its token on another call
    pub fn invalidate(&mut self) {
        if self.session.is_logged_in() {
            info!("Server rejected the session token");
        }
        self.discard_token();
    }

    /// Best-effort remote logout, then unconditionally forget the session
    pub async fn logout(&mut self) {
        let token = self
            .session
            .token
            .clone()
            .or_else(|| self.store.load().ok().flatten());

        let api = match token {
            Some(ref token) => self.api.with_token(token.as_str()),
            None => self.api.without_token(),
        };

        if let Err(e) = api.logout().await {
            warn!(error = %e, "Remote logout failed");
        }

        self.discard_token();
        info!("Logged out");
    }

    fn discard_token(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored token");
        }
        self.session = Session::logged_out();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::{FileTokenStore, MemoryTokenStore};
    use mockito::{Server, ServerGuard};

    const ANA: &str = r#"{"data":{"_id":"u1","name":"Ana","email":"ana@example.com"}}"#;

    fn manager(url: &str, store: &MemoryTokenStore) -> SessionManager {
        let api = ApiClient::new(url, Duration::from_secs(5)).expect("Failed to build client");
        SessionManager::new(api, Box::new(store.clone()))
    }

    async fn mock_get_user(server: &mut ServerGuard, token: &str) -> mockito::Mock {
        server
            .mock("GET", "/users/getUser")
            .match_header("authorization", format!("Bearer {}", token).as_str())
            .with_status(200)
            .with_body(ANA)
            .create_async()
            .await
    }

    #[test]
    fn test_new_session_is_initializing() {
        let store = MemoryTokenStore::new();
        let manager = manager("http://127.0.0.1:1", &store);
        assert_eq!(manager.session().state, SessionState::Initializing);
        assert!(manager.session().loading);
        assert!(!manager.session().is_logged_in());
    }

    #[tokio::test]
    async fn test_check_session_valid_token() {
        let mut server = Server::new_async().await;
        let m = mock_get_user(&mut server, "abc123").await;

        let store = MemoryTokenStore::with_token("abc123");
        let mut manager = manager(&server.url(), &store);
        let session = manager.check_session().await;

        assert!(session.is_logged_in());
        assert!(!session.loading);
        assert_eq!(session.user().map(|u| u.name.as_str()), Some("Ana"));
        assert_eq!(session.token(), Some("abc123"));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_session_without_token_makes_no_request() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/users/getUser")
            .expect(0)
            .create_async()
            .await;

        let store = MemoryTokenStore::new();
        let mut manager = manager(&server.url(), &store);
        let session = manager.check_session().await;

        assert!(!session.is_logged_in());
        assert!(!session.loading);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_session_expired_token_clears_store() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/getUser")
            .with_status(401)
            .with_body(r#"{"message":"jwt expired"}"#)
            .create_async()
            .await;

        let store = MemoryTokenStore::with_token("stale");
        let mut manager = manager(&server.url(), &store);
        let session = manager.check_session().await;

        assert_eq!(session.state, SessionState::Unauthenticated);
        assert!(!session.loading);
        assert_eq!(store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn test_check_session_null_user_clears_store() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/getUser")
            .with_status(200)
            .with_body(r#"{"data":null}"#)
            .create_async()
            .await;

        let store = MemoryTokenStore::with_token("orphan");
        let mut manager = manager(&server.url(), &store);

        assert!(!manager.check_session().await.is_logged_in());
        assert_eq!(store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn test_check_session_network_failure_resolves_logged_out() {
        let store = MemoryTokenStore::with_token("abc123");
        // Nothing listens on port 1
        let mut manager = manager("http://127.0.0.1:1", &store);
        let session = manager.check_session().await;

        assert_eq!(session.state, SessionState::Unauthenticated);
        assert!(!session.loading);
        assert_eq!(store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn test_login_then_check_session_is_idempotent() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/users/login")
            .with_status(200)
            .with_body(r#"{"data":{"token":"abc123","user":{"_id":"u1","name":"Ana"}}}"#)
            .create_async()
            .await;
        let m = server
            .mock("GET", "/users/getUser")
            .match_header("authorization", "Bearer abc123")
            .with_status(200)
            .with_body(ANA)
            .expect(2)
            .create_async()
            .await;

        let store = MemoryTokenStore::new();
        let mut manager = manager(&server.url(), &store);

        let user = manager
            .login("ana@example.com", "secret")
            .await
            .expect("login failed");
        assert_eq!(user.name, "Ana");
        assert_eq!(store.load().expect("load"), Some("abc123".to_string()));

        let after_login = manager.session().user().cloned();
        let session = manager.check_session().await;
        assert!(session.is_logged_in());
        assert_eq!(session.user().cloned(), after_login);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejected_surfaces_server_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/users/login")
            .with_status(400)
            .with_body(r#"{"message":"Incorrect password"}"#)
            .create_async()
            .await;

        let store = MemoryTokenStore::new();
        let mut manager = manager(&server.url(), &store);

        match manager.login("ana@example.com", "nope").await {
            Err(AuthError::Rejected(message)) => assert_eq!(message, "Incorrect password"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(store.load().expect("load"), None);
        assert!(!manager.session().is_logged_in());
    }

    #[tokio::test]
    async fn test_check_session_corrupt_token_file_is_discarded() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let session_file = dir.path().join("session.json");
        std::fs::write(&session_file, "not json").expect("write");

        let api = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(5))
            .expect("Failed to build client");
        let mut manager = SessionManager::new(
            api,
            Box::new(FileTokenStore::new(dir.path().to_path_buf())),
        );
        let session = manager.check_session().await;

        assert_eq!(session.state, SessionState::Unauthenticated);
        assert!(!session.loading);
        assert!(!session_file.exists());
    }

    #[tokio::test]
    async fn test_login_keeps_cause_when_verification_fails() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/users/login")
            .with_status(200)
            .with_body(r#"{"data":{"token":"abc123","user":{"_id":"u1","name":"Ana"}}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/users/getUser")
            .with_status(503)
            .with_body(r#"{"message":"Service unavailable"}"#)
            .create_async()
            .await;

        let store = MemoryTokenStore::new();
        let mut manager = manager(&server.url(), &store);

        match manager.login("ana@example.com", "secret").await {
            Err(AuthError::Remote(ApiError::Remote { status, message })) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service unavailable");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!manager.session().is_logged_in());
        assert_eq!(store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn test_invalidate_drops_session_and_token() {
        let mut server = Server::new_async().await;
        let _m = mock_get_user(&mut server, "abc123").await;

        let store = MemoryTokenStore::with_token("abc123");
        let mut manager = manager(&server.url(), &store);
        assert!(manager.check_session().await.is_logged_in());

        manager.invalidate();

        assert_eq!(manager.session().state, SessionState::Unauthenticated);
        assert!(manager.session().user().is_none());
        assert_eq!(store.load().expect("load"), None);
        assert!(!manager.authorized_client().has_token());
    }

    #[tokio::test]
    async fn test_login_network_failure() {
        let store = MemoryTokenStore::new();
        let mut manager = manager("http://127.0.0.1:1", &store);

        let result = manager.login("ana@example.com", "secret").await;
        assert!(matches!(result, Err(AuthError::Network(_))));
    }

    #[tokio::test]
    async fn test_login_without_token_is_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/users/login")
            .with_status(200)
            .with_body(r#"{"data":{"user":{"_id":"u1","name":"Ana"}}}"#)
            .create_async()
            .await;

        let store = MemoryTokenStore::new();
        let mut manager = manager(&server.url(), &store);

        let result = manager.login("ana@example.com", "secret").await;
        assert!(matches!(result, Err(AuthError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_logout_clears_session_even_when_remote_fails() {
        let mut server = Server::new_async().await;
        let _user = mock_get_user(&mut server, "abc123").await;
        let logout = server
            .mock("GET", "/users/logout")
            .with_status(500)
            .create_async()
            .await;

        let store = MemoryTokenStore::with_token("abc123");
        let mut manager = manager(&server.url(), &store);
        assert!(manager.check_session().await.is_logged_in());

        manager.logout().await;

        logout.assert_async().await;
        assert_eq!(manager.session().state, SessionState::Unauthenticated);
        assert!(manager.session().user().is_none());
        assert_eq!(store.load().expect("load"), None);
        assert!(!manager.authorized_client().has_token());
    }

    #[tokio::test]
    async fn test_logout_when_server_unreachable() {
        let store = MemoryTokenStore::with_token("abc123");
        let mut manager = manager("http://127.0.0.1:1", &store);

        manager.logout().await;

        assert!(!manager.session().is_logged_in());
        assert_eq!(store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn test_authorized_client_carries_token() {
        let mut server = Server::new_async().await;
        let _m = mock_get_user(&mut server, "abc123").await;

        let store = MemoryTokenStore::with_token("abc123");
        let mut manager = manager(&server.url(), &store);
        assert!(!manager.authorized_client().has_token());

        manager.check_session().await;
        assert!(manager.authorized_client().has_token());
    }
}
