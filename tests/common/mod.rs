#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mailsort::api::ApiGateway;
use mailsort::auth::{AuthClient, Authorizer, TokenStore};
use mailsort::error::{AppError, AppResult};
use mailsort::storage::MemoryStore;

/// Authorizer that hands out a fixed token sequence and records what it
/// was asked to do. The optional grant delay lets tests pile callers up
/// behind the refresh gate.
pub struct SequenceAuthorizer {
    tokens: Vec<String>,
    grant_delay: Duration,
    grants: Arc<AtomicUsize>,
    invalidated: Arc<Mutex<Vec<String>>>,
}

#[derive(Clone)]
pub struct AuthorizerProbe {
    grants: Arc<AtomicUsize>,
    invalidated: Arc<Mutex<Vec<String>>>,
}

impl AuthorizerProbe {
    pub fn grant_count(&self) -> usize {
        self.grants.load(Ordering::SeqCst)
    }

    pub fn invalidated(&self) -> Vec<String> {
        self.invalidated.lock().expect("probe lock").clone()
    }
}

impl SequenceAuthorizer {
    pub fn new(tokens: &[&str]) -> (Self, AuthorizerProbe) {
        Self::with_grant_delay(tokens, Duration::ZERO)
    }

    pub fn with_grant_delay(tokens: &[&str], grant_delay: Duration) -> (Self, AuthorizerProbe) {
        let grants = Arc::new(AtomicUsize::new(0));
        let invalidated = Arc::new(Mutex::new(Vec::new()));
        let probe = AuthorizerProbe {
            grants: Arc::clone(&grants),
            invalidated: Arc::clone(&invalidated),
        };

        let authorizer = Self {
            tokens: tokens.iter().map(ToString::to_string).collect(),
            grant_delay,
            grants,
            invalidated,
        };

        (authorizer, probe)
    }
}

impl Authorizer for SequenceAuthorizer {
    async fn get_token(&self, _interactive: bool) -> AppResult<String> {
        if !self.grant_delay.is_zero() {
            tokio::time::sleep(self.grant_delay).await;
        }

        let n = self.grants.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .get(n)
            .cloned()
            .ok_or_else(|| AppError::AuthDenied("token sequence exhausted".to_string()))
    }

    async fn invalidate(&self, token: &str) -> AppResult<()> {
        self.invalidated
            .lock()
            .expect("probe lock")
            .push(token.to_string());
        Ok(())
    }
}

pub type TestGateway = ApiGateway<SequenceAuthorizer, MemoryStore>;

pub fn gateway(base_url: &str, tokens: &[&str]) -> (TestGateway, AuthorizerProbe) {
    gateway_with_delay(base_url, tokens, Duration::ZERO)
}

pub fn gateway_with_delay(
    base_url: &str,
    tokens: &[&str],
    grant_delay: Duration,
) -> (TestGateway, AuthorizerProbe) {
    let (authorizer, probe) = SequenceAuthorizer::with_grant_delay(tokens, grant_delay);
    let auth = Arc::new(AuthClient::new(authorizer, TokenStore::new(MemoryStore::new())));
    (
        ApiGateway::with_base_url(auth, base_url.to_string()),
        probe,
    )
}
