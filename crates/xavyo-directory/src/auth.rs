//! Bearer tokens for Graph, obtained through the client credentials grant.

use chrono::{DateTime, Duration, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::{CloudEnvironment, DirectoryCredentials, DirectoryError, DirectoryResult};

/// Tokens closer than this to expiry are replaced before use.
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// Fields of the token endpoint reply that matter here.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    bearer: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn from_grant(grant: TokenGrant, issued_at: DateTime<Utc>) -> Self {
        Self {
            bearer: grant.access_token,
            expires_at: issued_at + Duration::seconds(grant.expires_in),
        }
    }

    fn usable_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin < self.expires_at
    }
}

/// Shared bearer token for one tenant.
///
/// Readers reuse the cached token until it enters the refresh margin. Only
/// one task at a time talks to the token endpoint; the others wait on the
/// write lock and pick up the fresh token.
#[derive(Debug)]
pub struct TokenCache {
    credentials: DirectoryCredentials,
    token_url: String,
    scope: String,
    http_client: reqwest::Client,
    current: RwLock<Option<AccessToken>>,
    refresh_margin: Duration,
}

impl TokenCache {
    pub fn new(
        credentials: DirectoryCredentials,
        cloud_environment: &CloudEnvironment,
        tenant_id: &str,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            credentials,
            token_url: format!(
                "{}/{tenant_id}/oauth2/v2.0/token",
                cloud_environment.login_endpoint()
            ),
            scope: format!("{}/.default", cloud_environment.graph_endpoint()),
            http_client,
            current: RwLock::new(None),
            refresh_margin: Duration::minutes(REFRESH_MARGIN_MINUTES),
        }
    }

    /// Token endpoint of the tenant.
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Returns a bearer token, requesting a new one when none is usable.
    #[instrument(skip(self), fields(token_url = %self.token_url))]
    pub async fn get_token(&self) -> DirectoryResult<String> {
        let cached = self.usable(self.current.read().await.as_ref());
        if let Some(bearer) = cached {
            return Ok(bearer);
        }

        let mut current = self.current.write().await;
        if let Some(bearer) = self.usable(current.as_ref()) {
            return Ok(bearer);
        }

        let token = self.request_token().await?;
        let bearer = token.bearer.clone();
        *current = Some(token);
        Ok(bearer)
    }

    /// Forgets the cached token, e.g. after Graph rejected it.
    pub async fn invalidate(&self) {
        self.current.write().await.take();
    }

    fn usable(&self, token: Option<&AccessToken>) -> Option<String> {
        token
            .filter(|t| t.usable_at(Utc::now(), self.refresh_margin))
            .map(|t| t.bearer.clone())
    }

    async fn request_token(&self) -> DirectoryResult<AccessToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.expose_secret()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| DirectoryError::Auth(format!("Could not reach token endpoint: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Auth(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| DirectoryError::Auth(format!("Malformed token grant: {e}")))?;

        let token = AccessToken::from_grant(grant, Utc::now());
        debug!(expires_at = %token.expires_at, "Token acquired");
        Ok(token)
    }
}
