//! Authentication commands.

use super::Client;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use auth_session::{
    password_strength_issues, AppMode, AuthBackend, AuthError, CredentialsAuth, CredentialsForm,
    CredentialsMode,
};
use std::io::{self, Write};
use tracing::debug;

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Login with email and password.
pub async fn login(client: &Client, format: &OutputFormat) -> Result<()> {
    if let Some(user) = client.session.store().user() {
        output::print_success(&format!("Already logged in as {}", user.email), format);
        return Ok(());
    }

    let email = prompt("Email: ")?;
    let password = rpassword::prompt_password("Password: ")?;
    let form = CredentialsForm::login(email, password);

    submit(client, CredentialsMode::Login, &form, format).await
}

/// Create an account and sign in.
pub async fn signup(client: &Client, format: &OutputFormat) -> Result<()> {
    let email = prompt("Email: ")?;
    let name = prompt("Name (optional): ")?;
    let password = rpassword::prompt_password("Password: ")?;

    let issues = password_strength_issues(&password);
    if !issues.is_empty() && *format == OutputFormat::Text {
        println!("Weak password:");
        for issue in &issues {
            println!("  - {}", issue);
        }
    }

    let confirm = rpassword::prompt_password("Confirm password: ")?;
    let mut form = CredentialsForm::signup(email, password, confirm);
    if !name.is_empty() {
        form = form.with_name(name);
    }

    submit(client, CredentialsMode::Signup, &form, format).await
}

async fn submit(
    client: &Client,
    mode: CredentialsMode,
    form: &CredentialsForm,
    format: &OutputFormat,
) -> Result<()> {
    let auth = CredentialsAuth::new(client.session.clone(), client.backend.clone());
    if *format == OutputFormat::Text {
        println!("Signing in...");
    }

    match auth.submit(mode, form).await {
        Ok(user) => {
            if client.modes.get().is_none() {
                client.modes.set(AppMode::Cloud)?;
            }
            output::print_success(&format!("Logged in as {}", user.email), format);
        }
        Err(e) => output::print_error(&failure_message(&e), format),
    }
    Ok(())
}

fn failure_message(error: &AuthError) -> String {
    match error {
        AuthError::Api(api) => api.message.clone(),
        other => other.to_string(),
    }
}

/// Logout and clear session.
pub async fn logout(client: &Client, format: &OutputFormat) -> Result<()> {
    if !client.session.store().is_authenticated() && !client.session.tokens().has_tokens() {
        output::print_success("Not logged in", format);
        return Ok(());
    }

    CredentialsAuth::new(client.session.clone(), client.backend.clone())
        .logout()
        .await;
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Check authentication status.
pub async fn status(client: &Client, format: &OutputFormat) -> Result<()> {
    let state = client.session.store().snapshot();
    let mode = client.modes.get();
    let refresh = client.refresher.state();

    match format {
        OutputFormat::Text => {
            println!("Mode:     {}", mode.map(|m| m.as_str()).unwrap_or("not selected"));
            match &state.user {
                Some(user) if state.is_authenticated => {
                    println!("Auth:     logged in");
                    println!("User:     {} <{}>", user.name, user.email);
                    println!("User ID:  {}", user.id);
                    println!(
                        "Refresh:  {}",
                        if state.refresh_token.is_some() { "available" } else { "none" }
                    );
                }
                _ => println!("Auth:     not logged in"),
            }
            if let Some(code) = state.error {
                println!("Error:    {}", code);
            }
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "mode": mode,
            "logged_in": state.is_authenticated,
            "user": state.user,
            "has_refresh_token": state.refresh_token.is_some(),
            "refresh_state": refresh,
            "error": state.error,
        }))?,
    }
    Ok(())
}

/// Force a token refresh.
pub async fn refresh(client: &Client, format: &OutputFormat) -> Result<()> {
    if client.refresher.refresh_tokens().await {
        output::print_success("Tokens refreshed", format);
    } else {
        output::print_error("Session expired. Please sign in again.", format);
    }
    Ok(())
}

/// Fetch the profile, refreshing once if the access token expired.
pub async fn profile(client: &Client, format: &OutputFormat) -> Result<()> {
    let store = client.session.store();
    if store.access_token().is_none() {
        output::print_error("Not logged in", format);
        return Ok(());
    }

    let backend = client.backend.clone();
    let result = client
        .refresher
        .retry_with_refresh(|| {
            let backend = backend.clone();
            let token = store.access_token().unwrap_or_default();
            async move { backend.get_profile(&token).await }
        })
        .await;

    match result {
        Ok(Some(user)) => {
            debug!(user_id = %user.id, "Profile fetched");
            store.set_user(Some(user.clone()));
            match format {
                OutputFormat::Text => {
                    output::print_heading("Profile");
                    output::print_row("ID", &user.id);
                    output::print_row("Name", &user.name);
                    output::print_row("Email", &user.email);
                    if let Some(github) = &user.github_username {
                        output::print_row("GitHub", github);
                    }
                    output::print_row("Verified", if user.email_verified { "yes" } else { "no" });
                    output::print_row("Created", &user.created_at.to_rfc3339());
                }
                OutputFormat::Json => output::print_json(&user)?,
            }
        }
        Ok(None) => output::print_error("Session expired. Please sign in again.", format),
        Err(e) => output::print_error(&failure_message(&e), format),
    }
    Ok(())
}
