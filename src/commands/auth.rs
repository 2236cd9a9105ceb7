use std::io::{self, IsTerminal, Write};

use serde::Serialize;

use crate::cli::AuthCommand;
use crate::config::{self, Settings};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct AuthStatusView {
    profile: String,
    logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    acquired_at_unix: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

pub async fn run(ctx: &AppContext, command: AuthCommand) -> AppResult<()> {
    match command {
        AuthCommand::Login => login(ctx).await,
        AuthCommand::Status => status(ctx),
        AuthCommand::Logout => logout(ctx).await,
    }
}

async fn login(ctx: &AppContext) -> AppResult<()> {
    let settings = ensure_login_settings(ctx)?;
    let auth = ctx.auth_client_with(&settings)?;
    let credential = auth.authenticate(true).await?;

    let view = AuthStatusView {
        profile: ctx.profile.clone(),
        logged_in: true,
        acquired_at_unix: Some(credential.acquired_at_unix),
        note: Some("authorization completed and credential stored".to_string()),
    };
    let text = format!("{}: logged in", view.profile);
    ctx.output.emit(&text, &view)
}

fn status(ctx: &AppContext) -> AppResult<()> {
    let credential = ctx.token_store().get()?;

    let view = match credential {
        Some(credential) => AuthStatusView {
            profile: ctx.profile.clone(),
            logged_in: true,
            acquired_at_unix: Some(credential.acquired_at_unix),
            note: None,
        },
        None => AuthStatusView {
            profile: ctx.profile.clone(),
            logged_in: false,
            acquired_at_unix: None,
            note: Some("no credential stored".to_string()),
        },
    };

    let text = if view.logged_in {
        format!("{}: logged in", view.profile)
    } else {
        format!("{}: logged out", view.profile)
    };
    ctx.output.emit(&text, &view)
}

async fn logout(ctx: &AppContext) -> AppResult<()> {
    // Revocation needs oauth settings; clearing the local store does
    // not. Fall back to a local-only logout when they are absent.
    let note = match ctx.auth_client() {
        Ok(auth) => {
            if auth.logout().await? {
                "credential revoked and removed".to_string()
            } else {
                "no credential stored".to_string()
            }
        }
        Err(_) => {
            ctx.token_store().clear()?;
            "local credential removed (no oauth settings for revocation)".to_string()
        }
    };

    let view = AuthStatusView {
        profile: ctx.profile.clone(),
        logged_in: false,
        acquired_at_unix: None,
        note: Some(note),
    };
    let text = format!("{}: logged out", view.profile);
    ctx.output.emit(&text, &view)
}

fn ensure_login_settings(ctx: &AppContext) -> AppResult<Settings> {
    let mut settings = ctx.settings.clone();
    let missing_client_id = settings
        .client_id
        .as_deref()
        .map(str::trim)
        .is_none_or(str::is_empty);

    if !missing_client_id {
        return Ok(settings);
    }

    let settings_path = ctx.paths.settings_file(&ctx.profile);
    if !io::stdin().is_terminal() {
        return Err(AppError::Config(format!(
            "missing oauth client_id in {}. run `mailsort auth login` in an interactive terminal to be prompted, or add it manually",
            settings_path.display(),
        )));
    }

    println!("OAuth client config is missing for profile `{}`.", ctx.profile);
    println!("Settings will be saved to {}.", settings_path.display());

    settings.client_id = Some(prompt_required("OAuth client_id: ")?);

    let client_secret = prompt_line("OAuth client_secret (blank for none): ")?;
    if !client_secret.is_empty() {
        settings.client_secret = Some(client_secret);
    }

    config::save_settings(&ctx.paths, &ctx.profile, &settings)?;
    println!("Saved profile settings to {}.", settings_path.display());

    Ok(settings)
}

fn prompt_required(prompt: &str) -> AppResult<String> {
    loop {
        let value = prompt_line(prompt)?;
        if !value.is_empty() {
            return Ok(value);
        }
        eprintln!("value is required");
    }
}

fn prompt_line(prompt: &str) -> AppResult<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}
