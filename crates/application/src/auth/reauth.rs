//! Reauthentication on 401.
//!
//! [`ReauthCoordinator`] wraps the [`RequestExecutor`]. When a request comes
//! back 401 it renews the session with the stored refresh token and retries
//! the request. Concurrent 401s share one refresh: the first caller creates
//! the in-flight handle under the state lock, later callers join it, and
//! every joined caller sees the same outcome.
//!
//! The refresh runs on its own task, so a caller that gives up on its request
//! does not cancel a refresh other callers are waiting on.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pulse_domain::{
    ApiError, ApiRequest, ApiResult, RefreshRequest, TokenGrant, TokenKey, token_preview,
};
use thiserror::Error;
use tokio::sync::{Mutex, watch};

use super::token_store::TokenStore;
use super::unauthorized::UnauthorizedChannel;
use crate::config::ClientConfig;
use crate::executor::RequestExecutor;

/// How a shared refresh settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New tokens are stored; retry the request.
    Refreshed,
    /// The session is gone; return the original 401.
    Failed,
}

type RefreshHandle = watch::Receiver<Option<RefreshOutcome>>;

#[derive(Debug, Error)]
enum RefreshError {
    #[error("refresh rejected: {0}")]
    Rejected(ApiError),

    #[error("refresh timed out after {0:?}")]
    TimedOut(Duration),

    #[error("refresh response carried no token pair")]
    MissingTokens,
}

#[derive(Default)]
struct State {
    in_flight: Option<RefreshHandle>,
}

struct Inner {
    executor: RequestExecutor,
    tokens: TokenStore,
    channel: UnauthorizedChannel,
    refresh_path: String,
    refresh_timeout: Duration,
    max_cycles: u32,
    state: Mutex<State>,
}

/// Request entry point with transparent, single-flight session renewal.
///
/// Clones share the same in-flight refresh.
#[derive(Clone)]
pub struct ReauthCoordinator {
    inner: Arc<Inner>,
}

impl fmt::Debug for ReauthCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReauthCoordinator")
            .field("refresh_path", &self.inner.refresh_path)
            .field("refresh_timeout", &self.inner.refresh_timeout)
            .field("max_cycles", &self.inner.max_cycles)
            .finish_non_exhaustive()
    }
}

impl ReauthCoordinator {
    /// Creates a coordinator over the executor's token store.
    #[must_use]
    pub fn new(
        executor: RequestExecutor,
        channel: UnauthorizedChannel,
        config: &ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                tokens: executor.token_store().clone(),
                executor,
                channel,
                refresh_path: config.refresh_path.clone(),
                refresh_timeout: config.refresh_timeout(),
                max_cycles: config.reauth_cycles(),
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// The token store shared with the executor.
    #[must_use]
    pub fn token_store(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// The channel unrecoverable 401s are reported on.
    #[must_use]
    pub fn channel(&self) -> &UnauthorizedChannel {
        &self.inner.channel
    }

    /// Sends a request, renewing the session on 401.
    ///
    /// Every status other than 401 is returned untouched. A 401 is retried
    /// after a successful refresh, at most `max_reauth_cycles` times. When the
    /// session cannot be renewed the original 401 is returned.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] of the final attempt.
    pub async fn request(&self, request: &ApiRequest) -> ApiResult {
        let mut cycles = 0;
        loop {
            let attempt = self.inner.executor.send(request).await;
            let error = match attempt.result {
                Err(error) if error.is_unauthorized() => error,
                other => return other,
            };

            if request.has_authorization() {
                return Err(error);
            }
            if cycles >= self.inner.max_cycles {
                tracing::warn!(
                    path = %request.path,
                    cycles,
                    "still unauthorized after reauthentication; giving up"
                );
                return Err(error);
            }
            cycles += 1;

            match self.reauthenticate(attempt.access_token.as_deref()).await {
                RefreshOutcome::Refreshed => {
                    tracing::debug!(path = %request.path, cycle = cycles, "retrying after refresh");
                }
                RefreshOutcome::Failed => return Err(error),
            }
        }
    }

    /// Runs or joins the shared refresh for a request sent with `attached`.
    async fn reauthenticate(&self, attached: Option<&str>) -> RefreshOutcome {
        let mut handle = {
            let mut state = self.inner.state.lock().await;

            let joinable = state
                .in_flight
                .as_ref()
                .filter(|handle| handle.has_changed().is_ok())
                .cloned();

            if let Some(handle) = joinable {
                handle
            } else {
                let current = self.inner.tokens.get(TokenKey::AccessToken).await;
                if attached.is_some() && current.is_some() && current.as_deref() != attached {
                    tracing::debug!("access token rotated since the request was sent");
                    return RefreshOutcome::Refreshed;
                }

                let Some(refresh_token) = self.inner.tokens.get(TokenKey::RefreshToken).await
                else {
                    // Only a request that carried the stored token ends the session.
                    let expired = attached.is_some() && current.is_some();
                    if expired {
                        tracing::warn!("session expired and cannot be renewed");
                        if let Err(e) = self.inner.tokens.clear().await {
                            tracing::debug!(error = %e, "clear failed; reported by the fault hook");
                        }
                    }
                    drop(state);
                    if expired {
                        self.inner.channel.emit();
                    }
                    return RefreshOutcome::Failed;
                };

                let (sender, handle) = watch::channel(None);
                state.in_flight = Some(handle.clone());
                tokio::spawn(run_refresh(Arc::clone(&self.inner), refresh_token, sender));
                handle
            }
        };

        match handle.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).unwrap_or(RefreshOutcome::Failed),
            Err(_) => RefreshOutcome::Failed,
        }
    }
}

async fn run_refresh(
    inner: Arc<Inner>,
    refresh_token: String,
    sender: watch::Sender<Option<RefreshOutcome>>,
) {
    tracing::info!(refresh_token = %token_preview(&refresh_token), "refreshing session");

    let outcome = match exchange(&inner, refresh_token).await {
        Ok(grant) => {
            // Both tokens are written before any joined caller retries. A
            // failed write still retries; the cycle ceiling bounds it.
            if let Err(e) = inner.tokens.store_grant(&grant).await {
                tracing::debug!(error = %e, "storing refreshed tokens failed");
            }
            tracing::info!(access_token = %token_preview(&grant.access_token), "session refreshed");
            RefreshOutcome::Refreshed
        }
        Err(e) => {
            tracing::warn!(error = %e, "session refresh failed; clearing credentials");
            if let Err(e) = inner.tokens.clear().await {
                tracing::debug!(error = %e, "clear failed; reported by the fault hook");
            }
            RefreshOutcome::Failed
        }
    };

    inner.state.lock().await.in_flight = None;
    if outcome == RefreshOutcome::Failed {
        inner.channel.emit();
    }
    sender.send_replace(Some(outcome));
}

async fn exchange(inner: &Inner, refresh_token: String) -> Result<TokenGrant, RefreshError> {
    let body = serde_json::to_value(RefreshRequest { refresh_token })
        .map_err(|e| RefreshError::Rejected(ApiError::fetch_error(e.to_string())))?;
    let request = ApiRequest::post(inner.refresh_path.as_str(), body);

    let data = tokio::time::timeout(inner.refresh_timeout, inner.executor.execute(&request))
        .await
        .map_err(|_| RefreshError::TimedOut(inner.refresh_timeout))?
        .map_err(RefreshError::Rejected)?;

    TokenGrant::from_body(&data).ok_or(RefreshError::MissingTokens)
}
