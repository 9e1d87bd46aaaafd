//! HTTP client for a remote repository API.

use async_trait::async_trait;
use repogrid_core::models::repository::FIELD_NAME;
use repogrid_core::models::{
    Connection, EditOutcome, EditRequest, FetchRequest, FieldError, Page, RenameRequest,
    RenameResponse,
};
use repogrid_core::{AppError, Config, MutationTransport, RemoteSource, SourceError};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Talks to `/api/repositories` on a RepoGrid-compatible server.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: reqwest::Url,
    token: Option<String>,
}

impl HttpSource {
    /// Build a client for the server at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL cannot serve as an API base or the HTTP
    /// client cannot be constructed.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let base = reqwest::Url::parse(base_url)
            .map_err(|err| AppError::BadRequest(format!("Invalid server URL '{}': {}", base_url, err)))?;
        if base.cannot_be_a_base() {
            return Err(AppError::BadRequest(format!(
                "Server URL '{}' cannot be used as an API base",
                base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Server(format!("failed to build HTTP client: {}", err)))?;
        Ok(Self {
            client,
            base,
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(&config.source_url, config.token.clone(), config.fetch_timeout())
    }

    fn api_url(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

fn transport_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout
    } else if err.is_decode() {
        SourceError::Malformed(err.to_string())
    } else {
        SourceError::Transport(err.to_string())
    }
}

/// Human-readable message for a failed response, preferring the JSON
/// `error` field the server emits.
fn error_message_for_response(status: reqwest::StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}

async fn status_error(res: reqwest::Response) -> SourceError {
    let status = res.status();
    let body = match res.text().await {
        Ok(body) => body,
        Err(err) => format!("failed to read error response body: {}", err),
    };
    SourceError::Status {
        status: status.as_u16(),
        message: error_message_for_response(status, &body),
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn fetch_page(&self, request: FetchRequest) -> Result<Page, SourceError> {
        let mut url = self.api_url(&["api", "repositories"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("first", &request.count.to_string());
            if let Some(after) = &request.after {
                query.append_pair("after", after.as_str());
            }
            if let Some(sort) = request.sort {
                query.append_pair("order_field", sort.field.as_str());
                query.append_pair("order_direction", sort.direction.as_str());
            }
        }
        debug!(url = %url, "fetching repository page");

        let res = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        if !res.status().is_success() {
            return Err(status_error(res).await);
        }
        let connection: Connection = res.json().await.map_err(|err| {
            if err.is_timeout() {
                SourceError::Timeout
            } else {
                SourceError::Malformed(err.to_string())
            }
        })?;
        Ok(connection.into_page())
    }
}

/// A 422 never commits: without field errors to report it is a plain
/// status failure.
fn rejection_outcome(field_errors: Vec<FieldError>) -> Result<EditOutcome, SourceError> {
    if field_errors.is_empty() {
        return Err(SourceError::Status {
            status: reqwest::StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
            message: "rename rejected without field errors".to_string(),
        });
    }
    Ok(EditOutcome::rejected(field_errors))
}

#[async_trait]
impl MutationTransport for HttpSource {
    async fn submit_edit(&self, request: EditRequest) -> Result<EditOutcome, SourceError> {
        if request.field != FIELD_NAME {
            return Ok(EditOutcome::rejected(vec![FieldError::new(
                request.field.as_str(),
                "field is read-only",
            )]));
        }
        let Some(name) = request.value.as_text() else {
            return Ok(EditOutcome::rejected(vec![FieldError::new(
                FIELD_NAME,
                "name must be text",
            )]));
        };

        let url = self.api_url(&["api", "repositories", request.row_id.as_str(), "name"]);
        let res = self
            .authorized(self.client.put(url))
            .json(&RenameRequest {
                name: name.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;

        match res.status() {
            status if status.is_success() => Ok(EditOutcome::ok()),
            reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                let body: RenameResponse = res
                    .json()
                    .await
                    .map_err(|err| SourceError::Malformed(err.to_string()))?;
                rejection_outcome(body.field_errors)
            }
            _ => Err(status_error(res).await),
        }
    }
}
