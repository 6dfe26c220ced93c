//! Explicit session context.
//!
//! The session is owned by the caller and handed to every page operation; nothing
//! in this crate keeps a global token. Once invalidated a session stays invalid,
//! re-authentication produces a new one.

use std::fmt;
use tracing::info;

use crate::error::{ClientError, Result};

/// Opaque credential attached to every store call.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value of the `Authorization` header for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    Valid(SessionToken),
    Invalid,
}

/// Authentication state of the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new(token: SessionToken) -> Self {
        Self {
            state: SessionState::Valid(token),
        }
    }

    /// A session that never authenticated.
    pub fn signed_out() -> Self {
        Self {
            state: SessionState::Invalid,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.state, SessionState::Valid(_))
    }

    /// Token for the next store call, or `SessionExpired` once invalidated.
    pub fn token(&self) -> Result<&SessionToken> {
        match &self.state {
            SessionState::Valid(token) => Ok(token),
            SessionState::Invalid => Err(ClientError::SessionExpired),
        }
    }

    /// Drops the credential. Further calls fail until a new session is created.
    pub fn invalidate(&mut self) {
        if self.is_valid() {
            info!("Session invalidated, re-authentication required");
        }
        self.state = SessionState::Invalid;
    }
}
