//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `TokenStore`: durable storage for the bearer token (file, keychain or memory)
//! - `SessionManager`: the check/login/logout lifecycle over the recipe service
//!
//! The token is never trusted on its own; it is revalidated with the server
//! every time the session is checked.

pub mod session;
pub mod token_store;

pub use session::{AuthError, Session, SessionManager, SessionState};
pub use token_store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
