//! GitHub OAuth: authorize URL construction and one-shot callback processing.

use crate::backend::AuthBackend;
use crate::context::SessionContext;
use crate::error::{AuthError, AuthResult};
use crate::types::{AuthErrorCode, User};
use automator_config::Config;
use rand::RngCore;
use serde::Serialize;
use session_storage::{KeyValueStore, StorageKeys};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

pub const GITHUB_SCOPE: &str = "read:user user:email";

/// Path GitHub redirects back to, relative to the app origin.
pub const CALLBACK_PATH: &str = "/auth/github/callback";

/// Where the user lands after the callback, success or not.
pub const REDIRECT_TARGET: &str = "/";

pub const SUCCESS_REDIRECT_DELAY: Duration = Duration::from_millis(1000);

pub const ERROR_REDIRECT_DELAY: Duration = Duration::from_millis(3000);

/// Fresh single-use CSRF state: 32 random bytes, hex encoded.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

/// Whether `url` (absolute, or a path with query) is the OAuth callback route.
pub fn is_callback_url(url: &str) -> bool {
    parse_callback_url(url)
        .map(|u| u.path() == CALLBACK_PATH)
        .unwrap_or(false)
}

fn parse_callback_url(raw: &str) -> AuthResult<Url> {
    match Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse("http://localhost")?;
            Ok(base.join(raw)?)
        }
        Err(e) => Err(e.into()),
    }
}

/// A started authorization: the URL to open and the state it carries.
#[derive(Debug, Clone)]
pub struct OAuthStart {
    pub authorize_url: Url,
    pub state: String,
}

/// Builds GitHub authorize URLs and stashes their state.
pub struct GitHubOAuth {
    client_id: Option<String>,
    app_origin: String,
    transient: Arc<dyn KeyValueStore>,
}

impl GitHubOAuth {
    pub fn new(
        client_id: Option<String>,
        app_origin: &str,
        transient: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            client_id,
            app_origin: app_origin.to_string(),
            transient,
        }
    }

    pub fn from_config(config: &Config, transient: Arc<dyn KeyValueStore>) -> Self {
        Self::new(config.github_client_id.clone(), &config.app_origin, transient)
    }

    /// `<app_origin>/auth/github/callback`
    pub fn redirect_uri(&self) -> AuthResult<Url> {
        Ok(Url::parse(&self.app_origin)?.join(CALLBACK_PATH)?)
    }

    /// Generate and stash a state, then build the authorize URL.
    ///
    /// Fails with a configuration error when no client id is set; nothing is
    /// stashed in that case.
    pub fn start(&self) -> AuthResult<OAuthStart> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AuthError::Config("GitHub OAuth client ID not configured".to_string()))?;
        let redirect_uri = self.redirect_uri()?;
        let state = generate_state();

        let mut authorize_url = Url::parse(GITHUB_AUTHORIZE_URL)?;
        authorize_url
            .query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("scope", GITHUB_SCOPE)
            .append_pair("state", &state);

        self.transient.set(StorageKeys::OAUTH_STATE, &state)?;
        info!(redirect_uri = %redirect_uri, "GitHub OAuth flow started");

        Ok(OAuthStart {
            authorize_url,
            state,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Processing,
    Success,
    Error,
}

/// Navigation the front end performs once the callback settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectPlan {
    pub target: String,
    #[serde(with = "duration_ms")]
    pub delay: Duration,
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(delay.as_millis() as u64)
    }
}

/// Terminal result of a callback.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackOutcome {
    pub status: CallbackStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<AuthErrorCode>,
    pub redirect: RedirectPlan,
}

impl CallbackOutcome {
    pub fn success(user: User) -> Self {
        Self {
            status: CallbackStatus::Success,
            message: format!("Signed in as {}", user.email),
            user: Some(user),
            error_code: None,
            redirect: RedirectPlan {
                target: REDIRECT_TARGET.to_string(),
                delay: SUCCESS_REDIRECT_DELAY,
            },
        }
    }

    pub fn failure(error: &AuthError) -> Self {
        Self {
            status: CallbackStatus::Error,
            message: error.to_string(),
            user: None,
            error_code: Some(error.error_code()),
            redirect: RedirectPlan {
                target: REDIRECT_TARGET.to_string(),
                delay: ERROR_REDIRECT_DELAY,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CallbackStatus::Success
    }
}

/// Processes one GitHub OAuth callback.
///
/// `process` consumes the processor, so a callback is handled at most once
/// and the code is exchanged at most once. There are no retries.
pub struct OAuthCallbackProcessor {
    context: Arc<SessionContext>,
    backend: Arc<dyn AuthBackend>,
    status: CallbackStatus,
}

impl OAuthCallbackProcessor {
    pub fn new(context: Arc<SessionContext>, backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            context,
            backend,
            status: CallbackStatus::Processing,
        }
    }

    pub fn status(&self) -> CallbackStatus {
        self.status
    }

    pub async fn process(mut self, callback_url: &str) -> CallbackOutcome {
        let store = self.context.store();
        store.set_loading(true);

        let outcome = match self.run(callback_url).await {
            Ok(user) => {
                info!(user_id = %user.id, "GitHub OAuth sign-in complete");
                CallbackOutcome::success(user)
            }
            Err(e) => {
                warn!(error = %e, "GitHub OAuth callback failed");
                store.set_error(Some(e.error_code()));
                CallbackOutcome::failure(&e)
            }
        };

        store.set_loading(false);
        self.status = outcome.status;
        outcome
    }

    async fn run(&self, callback_url: &str) -> AuthResult<User> {
        // The stashed state is single use: consumed whatever happens next,
        // including an unparseable callback URL.
        let stored_state = match self.context.transient().take(StorageKeys::OAUTH_STATE) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Could not read stored OAuth state");
                None
            }
        };

        let url = parse_callback_url(callback_url)?;

        let mut code = None;
        let mut returned_state = None;
        let mut provider_error = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => returned_state = Some(value.into_owned()),
                "error" => provider_error = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(error) = provider_error {
            return Err(AuthError::OAuthProvider(error));
        }

        let code = code
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingAuthorizationCode)?;

        let state = match (returned_state, stored_state) {
            (Some(returned), Some(stored)) if returned == stored => returned,
            _ => return Err(AuthError::OAuthStateMismatch),
        };

        debug!("OAuth state verified, exchanging code");
        let response = self.backend.exchange_oauth_code(&code, &state).await?;

        let access_token = response.access_token().map(str::to_string);
        let refresh_token = response.refresh_token().map(str::to_string);
        let (user, access_token) = match (response.success, response.user, access_token) {
            (true, Some(user), Some(access)) => (user, access),
            _ => return Err(AuthError::InvalidResponse("Invalid OAuth response".to_string())),
        };

        if refresh_token.is_none() {
            warn!("OAuth response carried no refresh token");
        }
        self.context
            .commit_login(user.clone(), access_token, refresh_token);
        Ok(user)
    }
}
