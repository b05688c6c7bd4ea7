//! OAuth access tokens for the Identity Toolkit API.

use std::time::{Duration, Instant};

use authsweep_core::{AppError, AppResult};
use google_cloud_token::TokenSourceProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const IDENTITY_TOOLKIT_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/identitytoolkit",
];

/// Google access tokens live for an hour; refresh well before that.
const TOKEN_CACHE_DURATION: Duration = Duration::from_secs(50 * 60);

/// Token the Auth emulator accepts as an administrator credential.
const EMULATOR_TOKEN: &str = "owner";

pub(crate) struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Source of bearer tokens for directory requests.
pub(crate) enum AccessTokenSource {
    Emulator,
    ApplicationDefault { cache: RwLock<Option<CachedToken>> },
}

impl AccessTokenSource {
    pub(crate) fn emulator() -> Self {
        Self::Emulator
    }

    pub(crate) fn application_default() -> Self {
        Self::ApplicationDefault {
            cache: RwLock::new(None),
        }
    }

    /// Returns a bearer token, loading Application Default Credentials when
    /// the cached token is missing or stale.
    pub(crate) async fn bearer_token(&self) -> AppResult<String> {
        let cache = match self {
            Self::Emulator => return Ok(EMULATOR_TOKEN.to_owned()),
            Self::ApplicationDefault { cache } => cache,
        };

        {
            let cached = cache.read().await;
            if let Some(cached) = cached.as_ref()
                && cached.expires_at > Instant::now()
            {
                return Ok(cached.token.clone());
            }
        }

        let config =
            google_cloud_auth::project::Config::default().with_scopes(&IDENTITY_TOOLKIT_SCOPES);
        let provider = google_cloud_auth::token::DefaultTokenSourceProvider::new(config)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to load application default credentials: {error}"
                ))
            })?;
        let header_value = provider
            .token_source()
            .token()
            .await
            .map_err(|error| AppError::Internal(format!("failed to obtain access token: {error}")))?;

        // The token source yields a complete header value.
        let token = header_value
            .strip_prefix("Bearer ")
            .unwrap_or(header_value.as_str())
            .to_owned();

        *cache.write().await = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + TOKEN_CACHE_DURATION,
        });
        debug!("refreshed identity toolkit access token");

        Ok(token)
    }
}

/// Returns the project named by Application Default Credentials, if any.
///
/// Comes from the credentials file or, on Google Cloud, the metadata server.
pub(crate) async fn application_default_project_id() -> Option<String> {
    let config =
        google_cloud_auth::project::Config::default().with_scopes(&IDENTITY_TOOLKIT_SCOPES);
    match google_cloud_auth::token::DefaultTokenSourceProvider::new(config).await {
        Ok(provider) => provider.project_id,
        Err(error) => {
            warn!(%error, "could not read project id from application default credentials");
            None
        }
    }
}
