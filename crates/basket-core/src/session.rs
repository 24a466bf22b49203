//! Explicit credential context shared by the stream manager and the CRUD client.
//!
//! The household access key lives here instead of in ambient global state.
//! Replacing or invalidating it is observable through [`Session::subscribe`],
//! which is how a host learns it has been forced into the logged-out state.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
}

struct SessionInner {
    token: RwLock<Option<String>>,
    state_tx: watch::Sender<SessionState>,
}

/// Cheap-to-clone handle; every clone sees the same credential.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// A logged-out session.
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(SessionState::LoggedOut);
        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(None),
                state_tx,
            }),
        }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.replace(token);
        session
    }

    /// Current credential. Blank tokens are never handed out.
    pub fn token(&self) -> Option<String> {
        self.inner.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.token.read().is_some()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state_tx.borrow()
    }

    /// Install a new credential. A blank token logs the session out.
    pub fn replace(&self, token: impl Into<String>) {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            self.invalidate();
            return;
        }
        *self.inner.token.write() = Some(token.to_string());
        self.inner.state_tx.send_replace(SessionState::LoggedIn);
        info!("session credential replaced");
    }

    /// Discard the credential. Returns true if one was held.
    pub fn invalidate(&self) -> bool {
        let had_token = self.inner.token.write().take().is_some();
        if had_token {
            warn!("session credential discarded, now logged out");
        }
        self.inner.state_tx.send_replace(SessionState::LoggedOut);
        had_token
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the key itself
        f.debug_struct("Session")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_logged_out() {
        let session = Session::new();
        assert!(session.token().is_none());
        assert_eq!(session.state(), SessionState::LoggedOut);
    }

    #[test]
    fn test_replace_trims_and_logs_in() {
        let session = Session::new();
        session.replace("  key-123 ");
        assert_eq!(session.token().as_deref(), Some("key-123"));
        assert_eq!(session.state(), SessionState::LoggedIn);
    }

    #[test]
    fn test_blank_token_logs_out() {
        let session = Session::with_token("key");
        session.replace("   ");
        assert!(session.token().is_none());
        assert_eq!(session.state(), SessionState::LoggedOut);
    }

    #[test]
    fn test_invalidate_is_shared_between_clones() {
        let session = Session::with_token("key");
        let clone = session.clone();
        let mut rx = session.subscribe();

        assert!(clone.invalidate());
        assert!(!session.is_authenticated());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::LoggedOut);

        // Second invalidate has nothing to discard
        assert!(!session.invalidate());
    }

    #[test]
    fn test_debug_hides_token() {
        let session = Session::with_token("super-secret");
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("super-secret"));
    }
}
