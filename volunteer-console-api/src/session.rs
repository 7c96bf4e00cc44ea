//! Process wide session state.
//!
//! Any request that comes back with a 401 flips the shared state to [`SessionState::Expired`].
//! Long running work subscribes through [`SessionWatch`] and stops when that happens.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedIn { token: String },
    Expired,
    SignedOut,
}

impl SessionState {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }
}

impl core::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SignedIn { .. } => f.write_str("SignedIn"),
            Self::Expired => f.write_str("Expired"),
            Self::SignedOut => f.write_str("SignedOut"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<watch::Sender<SessionState>>,
}

impl Session {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        let state = token.map_or(SessionState::SignedOut, |token| SessionState::SignedIn {
            token,
        });
        Self {
            state: Arc::new(watch::Sender::new(state)),
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        match &*self.state.borrow() {
            SessionState::SignedIn { token } => Some(token.clone()),
            SessionState::Expired | SessionState::SignedOut => None,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn sign_in(&self, token: String) {
        info!("signed in");
        self.state.send_replace(SessionState::SignedIn { token });
    }

    pub fn sign_out(&self) {
        info!("signed out");
        self.state.send_replace(SessionState::SignedOut);
    }

    /// Called on a 401. Clears the token for everyone sharing this session.
    pub fn expire(&self) {
        let previous = self.state.send_replace(SessionState::Expired);
        if previous.is_active() {
            warn!("session expired, sign in again");
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            receiver: self.state.subscribe(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionWatch {
    receiver: watch::Receiver<SessionState>,
}

impl SessionWatch {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.receiver.borrow().is_active()
    }

    /// Resolves once the session is no longer signed in. Never resolves if the session is gone.
    pub async fn ended(&mut self) {
        let ended = self
            .receiver
            .wait_for(|state| !state.is_active())
            .await
            .map(|_| ());
        if ended.is_err() {
            core::future::pending::<()>().await;
        }
    }
}
