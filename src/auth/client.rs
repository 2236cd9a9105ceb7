use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::storage::KeyValueStore;

use super::authorizer::Authorizer;
use super::credential::Credential;
use super::token_store::TokenStore;

/// Owns the interactive-authorization flow and token refresh.
///
/// Refresh is single-flight: the `refresh_gate` serializes attempts, and
/// a caller that was queued behind an in-flight refresh recognizes the
/// already-replaced credential by comparing tokens instead of starting a
/// second interactive flow.
#[derive(Debug)]
pub struct AuthClient<A, S> {
    authorizer: A,
    tokens: TokenStore<S>,
    refresh_gate: Mutex<()>,
}

impl<A: Authorizer, S: KeyValueStore> AuthClient<A, S> {
    pub fn new(authorizer: A, tokens: TokenStore<S>) -> Self {
        Self {
            authorizer,
            tokens,
            refresh_gate: Mutex::new(()),
        }
    }

    /// Current credential, running one interactive authentication if the
    /// store is empty. Callers that race an in-flight refresh queue on
    /// the gate and pick up its result.
    pub async fn current_or_login(&self) -> AppResult<Credential> {
        if let Some(credential) = self.tokens.get()? {
            return Ok(credential);
        }

        let _gate = self.refresh_gate.lock().await;
        if let Some(credential) = self.tokens.get()? {
            return Ok(credential);
        }

        self.authenticate(true).await
    }

    /// Acquire a fresh credential from the authorization collaborator
    /// and publish it to the store.
    pub async fn authenticate(&self, interactive: bool) -> AppResult<Credential> {
        let token = match self.authorizer.get_token(interactive).await {
            Ok(token) => token,
            Err(AppError::AuthDenied(detail)) => return Err(AppError::AuthDenied(detail)),
            Err(err) => return Err(AppError::AuthDenied(err.to_string())),
        };

        let credential = Credential::acquired_now(token);
        self.tokens.set(&credential)?;
        debug!("stored freshly acquired credential");
        Ok(credential)
    }

    /// Replace a credential the remote side rejected. `stale_token` is
    /// the token the caller observed failing; if the stored credential
    /// has already moved past it, another caller finished the refresh
    /// and its result is returned as-is.
    pub async fn refresh(&self, stale_token: &str) -> AppResult<Credential> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.tokens.get()? {
            if current.token != stale_token {
                debug!("refresh already completed by a concurrent caller");
                return Ok(current);
            }
        }

        self.tokens.clear()?;
        if let Err(err) = self.authorizer.invalidate(stale_token).await {
            // Best-effort: the remote cache entry may already be gone.
            warn!("failed to invalidate stale token: {err}");
        }

        self.authenticate(true).await
    }

    /// Revoke and drop the stored credential, if any.
    pub async fn logout(&self) -> AppResult<bool> {
        let Some(credential) = self.tokens.get()? else {
            return Ok(false);
        };

        if let Err(err) = self.authorizer.invalidate(&credential.token).await {
            warn!("failed to revoke token during logout: {err}");
        }

        self.tokens.clear()?;
        Ok(true)
    }

    pub fn stored_credential(&self) -> AppResult<Option<Credential>> {
        self.tokens.get()
    }
}
