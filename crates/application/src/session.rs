//! Session state and the sign-out subscriber.

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::{Subscription, TokenStore, UnauthorizedChannel};

/// Whether the application currently holds a usable session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Credentials are stored.
    SignedIn,
    /// No session; the user must authenticate.
    SignedOut,
}

/// Owns the application's view of the session.
///
/// Reacts to the unauthorized signal by moving to `SignedOut`. The request
/// layer clears the stored credentials before it raises the signal.
/// Observers follow state changes through [`SessionController::watch`].
#[derive(Debug, Clone)]
pub struct SessionController {
    tokens: TokenStore,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionController {
    /// Creates a controller in the signed-out state.
    #[must_use]
    pub fn new(tokens: TokenStore) -> Self {
        let (state, _) = watch::channel(SessionState::SignedOut);
        Self {
            tokens,
            state: Arc::new(state),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Records a successful login or registration.
    pub fn mark_signed_in(&self) {
        self.transition(SessionState::SignedIn);
    }

    /// Derives the state from stored credentials, e.g. at start-up.
    pub async fn resume(&self) -> SessionState {
        let next = if self.tokens.credentials().await.has_session() {
            SessionState::SignedIn
        } else {
            SessionState::SignedOut
        };
        self.transition(next);
        next
    }

    /// Forgets the session.
    ///
    /// Safe to call repeatedly. Returns `false` when there was nothing stored
    /// to forget.
    pub async fn sign_out(&self) -> bool {
        let had_credentials = !self.tokens.credentials().await.is_empty();
        if had_credentials {
            let _ = self.tokens.clear().await;
        }
        self.transition(SessionState::SignedOut);
        had_credentials
    }

    /// Marks the session signed out on every unauthorized signal.
    ///
    /// The handler runs inside `emit`, so the state has changed by the time
    /// the failing request returns. Only signals emitted after this call are
    /// observed; dropping the subscription detaches the controller.
    pub fn attach(&self, channel: &UnauthorizedChannel) -> Subscription {
        let controller = self.clone();
        channel.subscribe(move || {
            if controller.state() == SessionState::SignedIn {
                tracing::info!("signed out after unrecoverable 401");
            }
            controller.transition(SessionState::SignedOut);
        })
    }

    fn transition(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            tracing::debug!(from = ?*current, to = ?next, "session state changed");
            *current = next;
            true
        });
    }
}
