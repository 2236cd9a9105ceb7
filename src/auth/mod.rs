pub mod authorizer;
pub mod client;
pub mod credential;
pub mod token_store;

pub use authorizer::{Authorizer, OauthAuthorizer, random_token};
pub use client::AuthClient;
pub use credential::Credential;
pub use token_store::TokenStore;
