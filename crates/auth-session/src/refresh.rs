//! Single-flight token refresh.
//!
//! At most one refresh network call runs at a time. Callers arriving while
//! one is in flight await the same shared future and see the same result.
//! The refresh runs on its own task, so it completes even when every caller
//! stops waiting. The in-flight slot is cleared by that task when it
//! settles, so the next call after that starts a fresh refresh.

use crate::backend::AuthBackend;
use crate::context::SessionContext;
use crate::error::{AuthError, AuthResult};
use crate::refresh_fsm::{RefreshMachine, RefreshMachineInput, RefreshMachineState, RefreshState};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use session_storage::TokenKind;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type InFlight = Shared<BoxFuture<'static, bool>>;

#[derive(Clone)]
pub struct TokenRefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    context: Arc<SessionContext>,
    backend: Arc<dyn AuthBackend>,
    in_flight: Mutex<Option<InFlight>>,
    fsm: Mutex<RefreshMachine>,
}

impl TokenRefreshCoordinator {
    pub fn new(context: Arc<SessionContext>, backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            inner: Arc::new(Inner {
                context,
                backend,
                in_flight: Mutex::new(None),
                fsm: Mutex::new(RefreshMachine::new()),
            }),
        }
    }

    /// State of the refresh cycle. `LoggedOut` is left once the session is
    /// signed in again.
    pub fn state(&self) -> RefreshState {
        let mut fsm = self.inner.fsm.lock();
        if *fsm.state() == RefreshMachineState::LoggedOut
            && self.inner.context.store().is_authenticated()
            && fsm.consume(&RefreshMachineInput::SignedIn).is_ok()
        {
            debug!("Session signed in again, refresh cycle reset");
        }
        RefreshState::from(fsm.state())
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.in_flight.lock().is_some()
    }

    /// Refresh the token pair, joining a refresh already in flight.
    ///
    /// Returns `true` when new tokens were stored. On `false` the session and
    /// both token slots have been cleared.
    pub async fn refresh_tokens(&self) -> bool {
        let refresh = {
            let mut slot = self.inner.in_flight.lock();
            match slot.as_ref() {
                Some(pending) => {
                    debug!("Joining in-flight token refresh");
                    pending.clone()
                }
                None => {
                    let inner = self.inner.clone();
                    let task = tokio::spawn(async move {
                        let refreshed = inner.perform_refresh().await;
                        *inner.in_flight.lock() = None;
                        refreshed
                    });

                    let inner = self.inner.clone();
                    let refresh = async move {
                        match task.await {
                            Ok(refreshed) => refreshed,
                            Err(e) => {
                                error!(error = %e, "Token refresh task did not finish");
                                *inner.in_flight.lock() = None;
                                false
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await
    }

    /// True when `error` means the access token must be refreshed.
    pub fn is_expired_error(error: &AuthError) -> bool {
        error.is_token_expired()
    }

    /// Run `request`, refreshing and retrying once if the access token expired.
    ///
    /// - success: `Ok(Some(value))`
    /// - expiry then failed refresh: `Ok(None)`, no second attempt
    /// - expiry then refresh then failed retry: logged, `Ok(None)`
    /// - any other error: returned unchanged
    pub async fn retry_with_refresh<T, F, Fut>(&self, mut request: F) -> AuthResult<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AuthResult<T>>,
    {
        match request().await {
            Ok(value) => Ok(Some(value)),
            Err(e) if Self::is_expired_error(&e) => {
                info!(code = %e.error_code(), "Access token expired, refreshing");
                if !self.refresh_tokens().await {
                    return Ok(None);
                }
                match request().await {
                    Ok(value) => Ok(Some(value)),
                    Err(e) => {
                        error!(error = %e, "Request failed after token refresh");
                        Ok(None)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }
}

impl Inner {
    async fn perform_refresh(&self) -> bool {
        self.transition(&RefreshMachineInput::RefreshRequested);

        let Some(refresh_token) = self.context.tokens().get(TokenKind::Refresh) else {
            warn!("No refresh token available, logging out");
            self.fail();
            return false;
        };

        match self.backend.refresh_tokens(&refresh_token).await {
            Ok(pair) => {
                let tokens = self.context.tokens();
                tokens.save_pair(&pair.access_token, &pair.refresh_token);
                self.context
                    .store()
                    .set_tokens(Some(pair.access_token), Some(pair.refresh_token));
                self.transition(&RefreshMachineInput::RefreshSucceeded);
                info!("Tokens refreshed");
                true
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, logging out");
                self.fail();
                false
            }
        }
    }

    fn fail(&self) {
        self.context.logout();
        self.transition(&RefreshMachineInput::RefreshFailed);
    }

    fn transition(&self, input: &RefreshMachineInput) {
        let mut fsm = self.fsm.lock();
        let old_state = RefreshState::from(fsm.state());
        if fsm.consume(input).is_err() {
            error!(input = ?input, state = ?old_state, "Invalid refresh state transition");
            return;
        }
        debug!(
            old_state = ?old_state,
            new_state = ?RefreshState::from(fsm.state()),
            "Refresh state transition"
        );
    }
}
