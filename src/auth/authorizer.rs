use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time;
use url::Url;

use crate::config::Settings;
use crate::error::{AppError, AppResult};

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const REVOKE_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";
const CALLBACK_TIMEOUT_SECS: u64 = 180;
const SCOPES: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Interactive-authorization collaborator. Production uses the OAuth
/// loopback flow below; tests substitute scripted implementations.
pub trait Authorizer: Send + Sync {
    fn get_token(&self, interactive: bool) -> impl Future<Output = AppResult<String>> + Send;
    fn invalidate(&self, token: &str) -> impl Future<Output = AppResult<()>> + Send;
}

/// Browser-based authorization code flow with PKCE against a loopback
/// redirect. Mints bare access tokens; there is no silent grant, so a
/// non-interactive request always fails.
#[derive(Debug, Clone)]
pub struct OauthAuthorizer {
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
    http: reqwest::Client,
}

impl OauthAuthorizer {
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        Ok(Self {
            client_id: settings.client_id()?.to_string(),
            client_secret: settings.client_secret().map(ToOwned::to_owned),
            redirect_uri: settings.redirect_uri(),
            http: reqwest::Client::new(),
        })
    }

    async fn run_interactive_flow(&self) -> AppResult<String> {
        let state = random_token(32);
        let code_verifier = random_token(96);
        let authorization_url = self.authorization_url(&state, &code_verifier)?;

        if !open_browser(&authorization_url) {
            eprintln!("open this URL in your browser to authorize:\n{authorization_url}");
        }

        let code = wait_for_callback(
            &self.redirect_uri,
            &state,
            Duration::from_secs(CALLBACK_TIMEOUT_SECS),
        )
        .await?;

        self.exchange_code(&code, &code_verifier).await
    }

    fn authorization_url(&self, state: &str, code_verifier: &str) -> AppResult<String> {
        let mut url = Url::parse(AUTH_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", SCOPES)
            .append_pair("state", state)
            .append_pair("code_challenge", &pkce_challenge(code_verifier))
            .append_pair("code_challenge_method", "S256");

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AppResult<String> {
        let mut form = HashMap::from([
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("client_id", self.client_id.clone()),
            ("redirect_uri", self.redirect_uri.clone()),
            ("code_verifier", code_verifier.to_string()),
        ]);

        if let Some(client_secret) = &self.client_secret {
            form.insert("client_secret", client_secret.clone());
        }

        let response = self.http.post(TOKEN_ENDPOINT).form(&form).send().await?;
        parse_token_response(response).await
    }
}

impl Authorizer for OauthAuthorizer {
    async fn get_token(&self, interactive: bool) -> AppResult<String> {
        if !interactive {
            return Err(AppError::AuthDenied(
                "no silent grant available; interactive authorization required".to_string(),
            ));
        }

        self.run_interactive_flow().await
    }

    async fn invalidate(&self, token: &str) -> AppResult<()> {
        let response = self
            .http
            .post(REVOKE_ENDPOINT)
            .form(&HashMap::from([("token", token.to_string())]))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(AppError::AuthDenied(format!(
            "revoke endpoint returned {}",
            response.status()
        )))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

async fn parse_token_response(response: reqwest::Response) -> AppResult<String> {
    if response.status().is_success() {
        let payload: TokenResponse = response.json().await?;
        return Ok(payload.access_token);
    }

    let status = response.status();
    let body = response.text().await?;
    if let Ok(payload) = serde_json::from_str::<TokenErrorResponse>(&body) {
        let error = payload.error.unwrap_or_else(|| "unknown_error".to_string());
        let description = payload
            .error_description
            .unwrap_or_else(|| "no description".to_string());
        return Err(AppError::AuthDenied(format!(
            "token exchange failed ({status}): {error} ({description})"
        )));
    }

    Err(AppError::AuthDenied(format!(
        "token exchange failed ({status}): {body}"
    )))
}

async fn wait_for_callback(
    redirect_uri: &str,
    expected_state: &str,
    timeout: Duration,
) -> AppResult<String> {
    let redirect = Url::parse(redirect_uri)?;
    if redirect.scheme() != "http" {
        return Err(AppError::Config(
            "redirect_uri must use http for loopback capture".to_string(),
        ));
    }

    let host = redirect
        .host_str()
        .ok_or_else(|| AppError::Config("redirect_uri is missing host".to_string()))?;
    let port = redirect
        .port_or_known_default()
        .ok_or_else(|| AppError::Config("redirect_uri is missing port".to_string()))?;
    let path = redirect.path().to_string();

    let listener = TcpListener::bind((host, port)).await.map_err(|err| {
        AppError::AuthDenied(format!("failed to bind callback listener on {host}:{port}: {err}"))
    })?;

    time::timeout(timeout, accept_callback(&listener, &path, expected_state))
        .await
        .map_err(|_| AppError::AuthDenied("timed out waiting for authorization callback".to_string()))?
}

async fn accept_callback(
    listener: &TcpListener,
    expected_path: &str,
    expected_state: &str,
) -> AppResult<String> {
    let (mut stream, _) = listener.accept().await?;

    let mut buf = vec![0_u8; 8192];
    let size = stream.read(&mut buf).await?;
    if size == 0 {
        return Err(AppError::AuthDenied("empty callback request".to_string()));
    }

    let request = String::from_utf8_lossy(&buf[..size]);
    let request_line = request
        .lines()
        .next()
        .ok_or_else(|| AppError::AuthDenied("malformed callback request".to_string()))?;
    let target = request_line.split_whitespace().nth(1).unwrap_or_default();

    match extract_callback_code(target, expected_path, expected_state) {
        Ok(code) => {
            respond(&mut stream, "200 OK", "authorization complete. you can return to the terminal.")
                .await?;
            Ok(code)
        }
        Err(err) => {
            let _ = respond(&mut stream, "400 Bad Request", &format!("callback error: {err}")).await;
            Err(err)
        }
    }
}

fn extract_callback_code(
    target: &str,
    expected_path: &str,
    expected_state: &str,
) -> AppResult<String> {
    let callback_url = Url::parse(&format!("http://localhost{target}"))?;
    if callback_url.path() != expected_path {
        return Err(AppError::AuthDenied(format!(
            "callback path mismatch: expected {expected_path}, got {}",
            callback_url.path()
        )));
    }

    let mut code = None;
    let mut state = None;
    let mut flow_error = None;

    for (key, value) in callback_url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => flow_error = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(error) = flow_error {
        return Err(AppError::AuthDenied(format!("authorization refused: {error}")));
    }

    let received_state =
        state.ok_or_else(|| AppError::AuthDenied("callback missing state parameter".to_string()))?;
    if received_state != expected_state {
        return Err(AppError::AuthDenied("state mismatch; aborting authorization".to_string()));
    }

    code.ok_or_else(|| AppError::AuthDenied("callback missing code parameter".to_string()))
}

async fn respond(
    stream: &mut tokio::net::TcpStream,
    status: &str,
    message: &str,
) -> AppResult<()> {
    let body = format!("<!doctype html><html><body><p>{}</p></body></html>", escape_html(message));
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Random URL-safe token, also used for rule ids.
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0_u8; len];
    rand::thread_rng().fill(bytes.as_mut_slice());
    URL_SAFE_NO_PAD.encode(bytes)
}

fn pkce_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

fn open_browser(url: &str) -> bool {
    #[cfg(target_os = "macos")]
    {
        return std::process::Command::new("open")
            .arg(url)
            .status()
            .is_ok_and(|status| status.success());
    }

    #[cfg(target_os = "linux")]
    {
        return std::process::Command::new("xdg-open")
            .arg(url)
            .status()
            .is_ok_and(|status| status.success());
    }

    #[cfg(target_os = "windows")]
    {
        return std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .status()
            .is_ok_and(|status| status.success());
    }

    #[allow(unreachable_code)]
    false
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
