use std::sync::Arc;

use crate::api::ApiGateway;
use crate::auth::{AuthClient, OauthAuthorizer, TokenStore};
use crate::config::{self, AppPaths, Settings};
use crate::engine::StoredRules;
use crate::error::AppResult;
use crate::output::Output;
use crate::relay::RelayClient;
use crate::storage::FileStore;

pub type AppAuth = AuthClient<OauthAuthorizer, FileStore>;
pub type AppGateway = ApiGateway<OauthAuthorizer, FileStore>;
pub type AppRules = StoredRules<FileStore>;

#[derive(Debug)]
pub struct AppContext {
    pub profile: String,
    pub verbose: u8,
    pub paths: AppPaths,
    pub settings: Settings,
    pub output: Output,
}

impl AppContext {
    pub fn bootstrap(profile: String, json: bool, verbose: u8) -> AppResult<Self> {
        let profile = config::resolve_profile(&profile);
        let paths = AppPaths::discover()?;
        let settings = config::load_settings(&paths, &profile)?;
        let output = Output::new(json);

        Ok(Self {
            profile,
            verbose,
            paths,
            settings,
            output,
        })
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(self.paths.profile_store_dir(&self.profile))
    }

    pub fn token_store(&self) -> TokenStore<FileStore> {
        TokenStore::new(self.store())
    }

    /// Built on demand: commands that never touch the network must work
    /// without oauth settings.
    pub fn auth_client(&self) -> AppResult<Arc<AppAuth>> {
        self.auth_client_with(&self.settings)
    }

    pub fn auth_client_with(&self, settings: &Settings) -> AppResult<Arc<AppAuth>> {
        let authorizer = OauthAuthorizer::from_settings(settings)?;
        Ok(Arc::new(AuthClient::new(authorizer, self.token_store())))
    }

    pub fn gateway(&self) -> AppResult<AppGateway> {
        Ok(ApiGateway::new(self.auth_client()?))
    }

    pub fn rules(&self) -> AppRules {
        StoredRules::new(self.store())
    }

    pub fn relay(&self) -> RelayClient {
        RelayClient::new(self.settings.relay_url())
    }
}
