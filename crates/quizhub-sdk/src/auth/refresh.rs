//! Single-flight token refresh
//!
//! Refresh tokens rotate: once an exchange succeeds the old refresh token is
//! dead, so a second concurrent exchange with the same token would fail and
//! log the user out. [`RefreshCoordinator`] keeps at most one exchange in
//! flight; every caller that arrives while it is pending awaits the same
//! shared future and receives the same outcome.
//!
//! A failed exchange also ends the session exactly once: the shared future
//! clears the store and fires the session-expired hook before any waiter
//! resumes.

use super::types::AuthTokens;
use crate::executor::{RequestExecutor, RequestOptions};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Path of the refresh endpoint, relative to the API base URL
pub const REFRESH_PATH: &str = "/refresh";

/// Callback invoked when the session could not be renewed
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// What to do when a refresh response carries no new refresh token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Keep using the existing refresh token
    #[default]
    ReuseExisting,
    /// Drop the refresh token so the next expiry requires a new login
    Require,
}

type RefreshFuture = Shared<BoxFuture<'static, Option<String>>>;

struct InFlight {
    generation: u64,
    future: RefreshFuture,
}

struct RefreshState {
    executor: RequestExecutor,
    rotation: RotationPolicy,
    on_session_expired: Option<SessionExpiredHook>,
    pending: Mutex<Option<InFlight>>,
    generation: AtomicU64,
}

/// Exchanges the refresh token for a new access token, one exchange at a time
#[derive(Clone)]
pub struct RefreshCoordinator {
    state: Arc<RefreshState>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("rotation", &self.state.rotation)
            .field("on_session_expired", &self.state.on_session_expired.is_some())
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(
        executor: RequestExecutor,
        rotation: RotationPolicy,
        on_session_expired: Option<SessionExpiredHook>,
    ) -> Self {
        Self {
            state: Arc::new(RefreshState {
                executor,
                rotation,
                on_session_expired,
                pending: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Whether an exchange is currently in flight
    pub fn is_pending(&self) -> bool {
        self.state.pending.lock().is_some()
    }

    /// Obtain a fresh access token.
    ///
    /// `stale_token` is the access token the failed request was sent with.
    /// If the store already holds a different token, an exchange finished
    /// after that request went out and its token is returned directly.
    ///
    /// Returns `None` when the session cannot be renewed. The session has
    /// then already been torn down; callers only propagate their error.
    pub async fn refresh(&self, stale_token: Option<&str>) -> Option<String> {
        let future = {
            let mut pending = self.state.pending.lock();
            match pending.as_ref() {
                Some(in_flight) => {
                    debug!("Joining in-flight token refresh");
                    in_flight.future.clone()
                }
                None => {
                    let current = self.state.executor.token_store().access_token();
                    match (current, stale_token) {
                        (Some(current), stale) if stale != Some(current.as_str()) => {
                            debug!("Access token already renewed by a concurrent refresh");
                            return Some(current);
                        }
                        (None, Some(_)) => {
                            debug!("Session already ended by an earlier failed refresh");
                            return None;
                        }
                        _ => {}
                    }

                    let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    let state = Arc::clone(&self.state);
                    let future = async move {
                        let outcome = state.exchange().await;
                        if outcome.is_none() {
                            state.expire_session();
                        }
                        state.settle(generation);
                        outcome
                    }
                    .boxed()
                    .shared();

                    *pending = Some(InFlight {
                        generation,
                        future: future.clone(),
                    });
                    future
                }
            }
        };

        future.await
    }
}

impl RefreshState {
    /// Clear the pending marker if it still belongs to this exchange
    fn settle(&self, generation: u64) {
        let mut pending = self.pending.lock();
        if pending
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == generation)
        {
            *pending = None;
        }
    }

    /// Drop stored credentials and notify the embedding application
    fn expire_session(&self) {
        warn!("Session could not be renewed; clearing stored credentials");
        self.executor.token_store().clear();
        if let Some(hook) = &self.on_session_expired {
            hook();
        }
    }

    /// One call to the refresh endpoint; all failures collapse to `None`
    async fn exchange(&self) -> Option<String> {
        let store = self.executor.token_store();
        let Some(refresh_token) = store.refresh_token() else {
            debug!("No refresh token stored; cannot renew session");
            return None;
        };

        let options = match RequestOptions::new(Method::POST)
            .json(&json!({ "refreshToken": refresh_token }))
        {
            Ok(options) => options,
            Err(e) => {
                warn!("Failed to build refresh request: {}", e);
                return None;
            }
        };

        let body = match self.executor.execute(REFRESH_PATH, &options).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                return None;
            }
        };

        let Some(tokens) = AuthTokens::from_body(&body) else {
            warn!("Token refresh response carried no access token");
            return None;
        };

        store.set_access_token(&tokens.token);
        match tokens.refresh_token.as_deref() {
            Some(rotated) => store.set_refresh_token(rotated),
            None => match self.rotation {
                RotationPolicy::ReuseExisting => {
                    warn!("Refresh response did not rotate the refresh token; reusing the existing one");
                }
                RotationPolicy::Require => {
                    warn!("Refresh response did not rotate the refresh token; discarding it");
                    store.clear_refresh_token();
                }
            },
        }

        info!("Token refresh completed successfully");
        Some(tokens.token)
    }
}
