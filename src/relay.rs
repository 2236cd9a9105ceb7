use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Client for the local relay process that bulk-sorts existing mail for
/// one sender. The relay's internals are its own business; this side
/// only speaks its request/response contract.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SortRequest {
    sender_email: String,
    label_name: String,
}

#[derive(Debug, Deserialize)]
struct SortResponse {
    output: Option<String>,
    error: Option<String>,
}

impl RelayClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn sort_by_sender(&self, sender_email: &str, label_name: &str) -> AppResult<String> {
        let url = format!("{}/run-python", self.base_url.trim_end_matches('/'));
        let request = SortRequest {
            sender_email: sender_email.to_string(),
            label_name: label_name.to_string(),
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        let payload: SortResponse = match response.json().await {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => {
                return Err(AppError::RemoteApi {
                    status: status.as_u16(),
                    detail: "relay returned no parseable body".to_string(),
                });
            }
            Err(err) => return Err(AppError::Transport(err)),
        };

        if let Some(error) = payload.error {
            return Err(AppError::RemoteApi {
                status: status.as_u16(),
                detail: error,
            });
        }

        Ok(payload.output.unwrap_or_default())
    }
}
