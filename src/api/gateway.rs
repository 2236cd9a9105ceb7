use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{AuthClient, Authorizer};
use crate::error::{AppError, AppResult};
use crate::storage::KeyValueStore;

use super::endpoints;
use super::models::{
    CreateLabelRequest, ItemMetadata, LabelListResource, LabelResource, LabelView,
    MessageListResource, MessageResource, ModifyMessageRequest, ModifyMessageResponse,
};

const API_BASE_URL: &str = "https://gmail.googleapis.com";

/// Authenticated gateway to the mailbox API. Every call attaches the
/// current bearer credential; a 401 triggers at most one refresh
/// followed by exactly one retry of the same request, after which a
/// second 401 surfaces as `AuthExhausted`. Retries exist only on this
/// path: other HTTP failures and transport failures are returned to the
/// caller untouched.
#[derive(Debug)]
pub struct ApiGateway<A, S> {
    http: Client,
    base_url: String,
    auth: Arc<AuthClient<A, S>>,
}

// Clones share the auth client; `A`/`S` themselves need not be `Clone`.
impl<A, S> Clone for ApiGateway<A, S> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            auth: Arc::clone(&self.auth),
        }
    }
}

impl<A: Authorizer, S: KeyValueStore> ApiGateway<A, S> {
    pub fn new(auth: Arc<AuthClient<A, S>>) -> Self {
        Self::with_base_url(auth, API_BASE_URL.to_string())
    }

    pub fn with_base_url(auth: Arc<AuthClient<A, S>>, base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
            auth,
        }
    }

    pub fn auth(&self) -> &AuthClient<A, S> {
        &self.auth
    }

    /// Item ids from the remote list endpoint, newest first.
    pub async fn list_items(&self, limit: u32, search: Option<&str>) -> AppResult<Vec<String>> {
        let query = endpoints::list_query(limit, search);
        let list: MessageListResource = self
            .get_json(endpoints::list_messages_endpoint(), Some(&query))
            .await?;

        Ok(list
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|entry| entry.id)
            .collect())
    }

    pub async fn get_metadata(&self, id: &str) -> AppResult<ItemMetadata> {
        let endpoint = endpoints::message_endpoint(id);
        let query = endpoints::metadata_query();
        let resource: MessageResource = self.get_json(&endpoint, Some(&query)).await?;
        Ok(resource.into_metadata())
    }

    pub async fn apply_label(&self, id: &str, label_id: &str) -> AppResult<()> {
        let endpoint = endpoints::modify_message_endpoint(id);
        let body = ModifyMessageRequest {
            add_label_ids: vec![label_id.to_string()],
        };

        let _: ModifyMessageResponse = self.post_json(&endpoint, &body).await?;
        Ok(())
    }

    pub async fn list_labels(&self) -> AppResult<Vec<LabelView>> {
        let list: LabelListResource = self.get_json(endpoints::labels_endpoint(), None).await?;
        let mut labels = list
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(LabelResource::into_view)
            .collect::<Vec<_>>();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(labels)
    }

    pub async fn create_label(&self, name: &str) -> AppResult<LabelView> {
        let body = CreateLabelRequest {
            name: name.to_string(),
            label_list_visibility: "labelShow".to_string(),
            message_list_visibility: "show".to_string(),
        };

        let created: LabelResource = self.post_json(endpoints::labels_endpoint(), &body).await?;
        Ok(created.into_view())
    }

    /// Resolve a label by id or case-insensitive name, creating it when
    /// nothing matches.
    pub async fn ensure_label(&self, name_or_id: &str) -> AppResult<LabelView> {
        let needle = name_or_id.trim();
        if needle.is_empty() {
            return Err(AppError::InvalidInput("label must not be empty".to_string()));
        }

        for label in self.list_labels().await? {
            if label.id == needle || label.name.eq_ignore_ascii_case(needle) {
                return Ok(label);
            }
        }

        debug!(label = needle, "label not found, creating it");
        self.create_label(needle).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&[(String, String)]>,
    ) -> AppResult<T> {
        self.request(Method::GET, endpoint, query, None::<&()>).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> AppResult<T> {
        self.request(Method::POST, endpoint, None, Some(body)).await
    }

    /// One logical call. The retry budget is a single explicit second
    /// attempt guarded by the refresh above it; there is no loop to
    /// terminate.
    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<&[(String, String)]>,
        body: Option<&B>,
    ) -> AppResult<T> {
        let credential = self.auth.current_or_login().await?;
        let response = self
            .dispatch(method.clone(), endpoint, query, body, &credential.token)
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return parse_response(response).await;
        }

        warn!(%endpoint, "request rejected with 401, refreshing credential");
        let refreshed = self.auth.refresh(&credential.token).await?;
        let retry = self
            .dispatch(method, endpoint, query, body, &refreshed.token)
            .await?;

        if retry.status() == StatusCode::UNAUTHORIZED {
            return Err(AppError::AuthExhausted);
        }

        parse_response(retry).await
    }

    async fn dispatch<B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<&[(String, String)]>,
        body: Option<&B>,
        token: &str,
    ) -> AppResult<reqwest::Response> {
        let url = self.endpoint_url(endpoint)?;
        let mut request = self.http.request(method, url).bearer_auth(token);

        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    fn endpoint_url(&self, endpoint: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.set_path(endpoint.trim_start_matches('/'));
        Ok(url)
    }
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(map_api_error(status, &body))
}

fn map_api_error(status: StatusCode, body: &str) -> AppError {
    let detail = parse_api_error_detail(body).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "no error details in response body".to_string()
        } else {
            body.to_string()
        }
    });

    AppError::RemoteApi {
        status: status.as_u16(),
        detail,
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    status: Option<String>,
    message: Option<String>,
}

fn parse_api_error_detail(body: &str) -> Option<String> {
    let envelope = serde_json::from_str::<ApiErrorEnvelope>(body).ok()?;
    let mut parts = Vec::new();

    if let Some(message) = envelope.error.message {
        parts.push(message);
    }

    if let Some(status) = envelope.error.status {
        parts.push(format!("status={status}"));
    }

    if parts.is_empty() {
        return None;
    }

    Some(parts.join(", "))
}
