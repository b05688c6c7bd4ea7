//! Firebase Authentication directory over the Identity Toolkit REST API.

use std::env;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use authsweep_application::{MAX_DELETE_BATCH_SIZE, MAX_LIST_PAGE_SIZE, UserDirectory};
use authsweep_core::{AppError, AppResult};
use authsweep_domain::{DeletionError, DeletionResult, UserPage, UserRecord};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::google_access_token::{AccessTokenSource, application_default_project_id};

const PRODUCTION_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const MAX_UID_LENGTH: usize = 128;
const PROJECT_ID_VARIABLES: [&str; 2] = ["GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"];

static DEFAULT_DIRECTORY: OnceLock<Arc<FirebaseAuthDirectory>> = OnceLock::new();

/// Connection settings for the Firebase Authentication directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseAuthConfig {
    /// Google Cloud project that owns the Firebase app.
    pub project_id: String,
    /// `host:port` of a local Auth emulator, when testing against one.
    pub emulator_host: Option<String>,
    /// Per-request timeout.
    pub http_timeout: Duration,
}

impl FirebaseAuthConfig {
    /// Loads settings from the process environment.
    ///
    /// The project comes from `GOOGLE_CLOUD_PROJECT` or `GCLOUD_PROJECT`. Outside
    /// the emulator it falls back to the project of the Application Default
    /// Credentials, which is how Cloud Run jobs learn it.
    pub async fn from_env() -> AppResult<Self> {
        let emulator_host = non_empty_env("FIREBASE_AUTH_EMULATOR_HOST");
        let configured_project = configured_project_id(non_empty_env);
        let credentials_project = if configured_project.is_none() && emulator_host.is_none() {
            application_default_project_id().await
        } else {
            None
        };
        let project_id = select_project_id(configured_project, credentials_project)?;

        let http_timeout_secs = match env::var("AUTHSWEEP_HTTP_TIMEOUT_SECS") {
            Ok(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid AUTHSWEEP_HTTP_TIMEOUT_SECS value '{value}': {error}"
                ))
            })?,
            Err(_) => 30,
        };

        if http_timeout_secs == 0 {
            return Err(AppError::Validation(
                "AUTHSWEEP_HTTP_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            project_id,
            emulator_host,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }

    fn base_url(&self) -> String {
        match &self.emulator_host {
            Some(host) => format!("http://{host}/identitytoolkit.googleapis.com/v1"),
            None => PRODUCTION_BASE_URL.to_owned(),
        }
    }
}

/// Creates the process-wide directory client.
///
/// Fails with `AppError::Conflict` when called more than once.
pub fn initialize_default_directory(
    config: FirebaseAuthConfig,
) -> AppResult<Arc<FirebaseAuthDirectory>> {
    let directory = Arc::new(FirebaseAuthDirectory::new(config)?);
    DEFAULT_DIRECTORY.set(directory.clone()).map_err(|_| {
        AppError::Conflict("the default auth directory is already initialized".to_owned())
    })?;

    info!(
        project_id = directory.project_id(),
        emulated = directory.is_emulated(),
        "auth directory initialized"
    );
    Ok(directory)
}

/// `UserDirectory` backed by Firebase Authentication.
pub struct FirebaseAuthDirectory {
    http_client: reqwest::Client,
    project_id: String,
    base_url: String,
    token_source: AccessTokenSource,
}

impl FirebaseAuthDirectory {
    /// Creates a directory client for `config`.
    pub fn new(config: FirebaseAuthConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
        let token_source = if config.emulator_host.is_some() {
            AccessTokenSource::emulator()
        } else {
            AccessTokenSource::application_default()
        };

        Ok(Self {
            http_client,
            base_url: config.base_url(),
            project_id: config.project_id,
            token_source,
        })
    }

    /// Returns the project the client is bound to.
    #[must_use]
    pub fn project_id(&self) -> &str {
        self.project_id.as_str()
    }

    /// Returns whether requests go to a local emulator.
    #[must_use]
    pub fn is_emulated(&self) -> bool {
        matches!(self.token_source, AccessTokenSource::Emulator)
    }

    fn accounts_url(&self, method: &str) -> AppResult<Url> {
        let endpoint = format!(
            "{}/projects/{}/accounts:{method}",
            self.base_url, self.project_id
        );
        Url::parse(&endpoint)
            .map_err(|error| AppError::Validation(format!("invalid endpoint '{endpoint}': {error}")))
    }
}

#[async_trait]
impl UserDirectory for FirebaseAuthDirectory {
    async fn list_users(&self, page_token: Option<&str>) -> AppResult<UserPage> {
        let mut url = self.accounts_url("batchGet")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("maxResults", &MAX_LIST_PAGE_SIZE.to_string());
            if let Some(page_token) = page_token {
                query.append_pair("nextPageToken", page_token);
            }
        }

        let token = self.token_source.bearer_token().await?;
        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?;

        let body = read_json::<ListUsersResponse>(response, "list users").await?;
        let page = body.into_page()?;
        debug!(
            count = page.users.len(),
            has_next_page = page.has_next_page(),
            "listed directory page"
        );

        Ok(page)
    }

    async fn delete_users(&self, uids: &[String]) -> AppResult<DeletionResult> {
        validate_delete_batch(uids)?;
        if uids.is_empty() {
            return Ok(DeletionResult::default());
        }

        let url = self.accounts_url("batchDelete")?;
        let token = self.token_source.bearer_token().await?;
        let response = self
            .http_client
            .post(url)
            .bearer_auth(token)
            .json(&BatchDeleteRequest {
                local_ids: uids,
                force: true,
            })
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete users: {error}")))?;

        let body = read_json::<BatchDeleteResponse>(response, "delete users").await?;
        Ok(body.into_result(uids.len()))
    }
}

fn validate_delete_batch(uids: &[String]) -> AppResult<()> {
    if uids.len() > MAX_DELETE_BATCH_SIZE {
        return Err(AppError::InvalidArgument(format!(
            "a delete batch must contain at most {MAX_DELETE_BATCH_SIZE} uids, got {}",
            uids.len()
        )));
    }

    if let Some(uid) = uids
        .iter()
        .find(|uid| uid.is_empty() || uid.len() > MAX_UID_LENGTH)
    {
        return Err(AppError::InvalidArgument(format!(
            "uid '{uid}' must be a non-empty string of at most {MAX_UID_LENGTH} characters"
        )));
    }

    Ok(())
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> AppResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());
        return Err(error_for_status(status, operation, &body));
    }

    response.json::<T>().await.map_err(|error| {
        AppError::Internal(format!("failed to parse {operation} response body: {error}"))
    })
}

fn error_for_status(status: StatusCode, operation: &str, body: &str) -> AppError {
    let message = serde_json::from_str::<GoogleErrorResponse>(body)
        .map(|response| response.error.message)
        .unwrap_or_else(|_| body.to_owned());
    let detail = format!("{operation} returned status {}: {message}", status.as_u16());

    match status {
        StatusCode::BAD_REQUEST => AppError::InvalidArgument(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(detail),
        _ => AppError::Internal(detail),
    }
}

/// Returns the first project variable set, in precedence order.
fn configured_project_id(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    PROJECT_ID_VARIABLES.into_iter().find_map(lookup)
}

fn select_project_id(
    configured_project: Option<String>,
    credentials_project: Option<String>,
) -> AppResult<String> {
    configured_project
        .or(credentials_project)
        .map(|project_id| project_id.trim().to_owned())
        .filter(|project_id| !project_id.is_empty())
        .ok_or_else(|| {
            AppError::Validation(
                "no project id: set GOOGLE_CLOUD_PROJECT or GCLOUD_PROJECT, or use credentials that name a project"
                    .to_owned(),
            )
        })
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListUsersResponse {
    #[serde(default)]
    users: Vec<UserInfoResponse>,
    next_page_token: Option<String>,
}

impl ListUsersResponse {
    fn into_page(self) -> AppResult<UserPage> {
        let users = self
            .users
            .into_iter()
            .map(UserInfoResponse::into_record)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(UserPage {
            users,
            next_page_token: self.next_page_token.filter(|token| !token.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserInfoResponse {
    local_id: String,
    email: Option<String>,
    phone_number: Option<String>,
    /// Milliseconds since the epoch, encoded as a string.
    created_at: Option<String>,
    /// RFC 3339 timestamp.
    last_refresh_at: Option<String>,
}

impl UserInfoResponse {
    fn into_record(self) -> AppResult<UserRecord> {
        let created_at = self
            .created_at
            .as_deref()
            .and_then(|value| value.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "user '{}' has a missing or invalid creation time",
                    self.local_id
                ))
            })?;
        let last_refresh_at = self
            .last_refresh_at
            .as_deref()
            .map(|value| {
                DateTime::parse_from_rfc3339(value)
                    .map(|timestamp| timestamp.with_timezone(&Utc))
                    .map_err(|error| {
                        AppError::Internal(format!(
                            "user '{}' has an invalid last refresh time '{value}': {error}",
                            self.local_id
                        ))
                    })
            })
            .transpose()?;

        Ok(UserRecord::new(self.local_id, created_at)
            .with_email(self.email)
            .with_phone_number(self.phone_number)
            .with_last_refresh_at(last_refresh_at))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchDeleteRequest<'a> {
    local_ids: &'a [String],
    force: bool,
}

#[derive(Debug, Default, Deserialize)]
struct BatchDeleteResponse {
    #[serde(default)]
    errors: Vec<BatchDeleteErrorResponse>,
}

impl BatchDeleteResponse {
    fn into_result(self, submitted: usize) -> DeletionResult {
        let errors = self
            .errors
            .into_iter()
            .map(|error| DeletionError {
                index: error.index,
                reason: error
                    .message
                    .unwrap_or_else(|| "unknown deletion failure".to_owned()),
            })
            .collect();

        DeletionResult::from_errors(submitted, errors)
    }
}

#[derive(Debug, Deserialize)]
struct BatchDeleteErrorResponse {
    // Zero indices are omitted from the JSON encoding.
    #[serde(default)]
    index: usize,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}
