//! Email/password sign-in and signup.

use crate::backend::AuthBackend;
use crate::context::SessionContext;
use crate::error::{AuthError, AuthResult};
use crate::types::{AuthErrorCode, AuthResponse, SignupRequest, User};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

pub const MIN_PASSWORD_LEN: usize = 8;

const SPECIAL_CHARS: &str = "!@#$%^&*";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("valid name regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialsMode {
    Login,
    Signup,
}

#[derive(Debug, Clone, Default)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
    /// Only checked in signup mode.
    pub confirm_password: String,
    pub name: Option<String>,
}

impl CredentialsForm {
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn signup(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

pub fn validate_email(email: &str) -> AuthResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthError::validation(AuthErrorCode::InvalidEmail, "Email is required"));
    }
    if !email_regex().is_match(email) {
        return Err(AuthError::validation(
            AuthErrorCode::InvalidEmail,
            "Enter a valid email address",
        ));
    }
    Ok(())
}

/// Display name: 2 to 100 characters of letters, spaces, hyphens and apostrophes.
pub fn validate_name(name: &str) -> AuthResult<()> {
    let invalid = |message: &str| AuthError::validation(AuthErrorCode::InvalidCredentials, message);
    let len = name.chars().count();
    if len == 0 {
        return Err(invalid("Name is required"));
    }
    if len < 2 {
        return Err(invalid("Name must be at least 2 characters long"));
    }
    if len > 100 {
        return Err(invalid("Name must not exceed 100 characters"));
    }
    if !name_regex().is_match(name) {
        return Err(invalid(
            "Name can only contain letters, spaces, hyphens, and apostrophes",
        ));
    }
    Ok(())
}

/// Strength rules a signup password fails. Empty means strong enough.
pub fn password_strength_issues(password: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        issues.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        issues.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("Password must contain at least one number");
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        issues.push("Password must contain at least one special character (!@#$%^&*)");
    }
    issues
}

/// Form checks run before any request is made.
pub fn validate_credentials(mode: CredentialsMode, form: &CredentialsForm) -> AuthResult<()> {
    validate_email(&form.email)?;
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(
            AuthErrorCode::WeakPassword,
            "Password must be at least 8 characters",
        ));
    }
    if mode == CredentialsMode::Signup {
        if form.password != form.confirm_password {
            return Err(AuthError::validation(
                AuthErrorCode::InvalidCredentials,
                "Passwords must match",
            ));
        }
        if let Some(name) = form.name.as_deref() {
            validate_name(name)?;
        }
    }
    Ok(())
}

/// Credentials sign-in against an [`AuthBackend`], committed to the session.
pub struct CredentialsAuth {
    context: Arc<SessionContext>,
    backend: Arc<dyn AuthBackend>,
}

impl CredentialsAuth {
    pub fn new(context: Arc<SessionContext>, backend: Arc<dyn AuthBackend>) -> Self {
        Self { context, backend }
    }

    /// Validate, call login or signup, and commit the session.
    ///
    /// Validation failures return before `is_loading` is touched. Backend
    /// failures are recorded in the session's `error` and returned.
    pub async fn submit(&self, mode: CredentialsMode, form: &CredentialsForm) -> AuthResult<User> {
        let store = self.context.store();
        store.set_error(None);
        validate_credentials(mode, form)?;

        store.set_loading(true);
        let result = self.authenticate(mode, form).await;
        store.set_loading(false);

        match result {
            Ok(user) => Ok(user),
            Err(e) => {
                warn!(error = %e, ?mode, "Credentials authentication failed");
                store.set_error(Some(e.error_code()));
                Err(e)
            }
        }
    }

    async fn authenticate(&self, mode: CredentialsMode, form: &CredentialsForm) -> AuthResult<User> {
        let email = form.email.trim();
        let response = match mode {
            CredentialsMode::Login => self.backend.login(email, &form.password).await?,
            CredentialsMode::Signup => {
                let request = SignupRequest {
                    email: email.to_string(),
                    password: form.password.clone(),
                    name: form.name.clone(),
                };
                self.backend.signup(&request).await?
            }
        };
        self.commit(response)
    }

    fn commit(&self, response: AuthResponse) -> AuthResult<User> {
        if !response.success {
            let message = response
                .message
                .clone()
                .or_else(|| response.error.clone())
                .unwrap_or_else(|| "Authentication failed".to_string());
            let code = response.error_code.unwrap_or(AuthErrorCode::UnknownError);
            return Err(AuthError::validation(code, message));
        }

        let access_token = response
            .access_token()
            .ok_or_else(|| AuthError::InvalidResponse("Authentication response missing access token".to_string()))?
            .to_string();
        // Backends that do not issue refresh tokens reuse the access token.
        let refresh_token = response
            .refresh_token()
            .map(str::to_string)
            .unwrap_or_else(|| access_token.clone());
        let user = response
            .user
            .ok_or_else(|| AuthError::InvalidResponse("Authentication response missing user".to_string()))?;

        self.context
            .commit_login(user.clone(), access_token, Some(refresh_token));
        info!(user_id = %user.id, "Credentials sign-in complete");
        Ok(user)
    }

    /// Tell the backend (best effort), then clear the local session.
    pub async fn logout(&self) {
        if let Some(token) = self.context.store().access_token() {
            if let Err(e) = self.backend.logout(&token).await {
                debug!(error = %e, "Backend logout failed, clearing local session anyway");
            }
        }
        self.context.logout();
    }
}
