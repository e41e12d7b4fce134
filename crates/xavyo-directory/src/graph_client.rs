//! Microsoft Graph implementation of [`DirectoryClient`].

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::client::DirectoryClient;
use crate::model::{Collection, ContinuationToken, DirectoryObject, ObjectKind, Page, PageQuery};
use crate::{DirectoryConfig, DirectoryCredentials, DirectoryError, DirectoryResult, TokenCache};

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// `OData` error response from Microsoft Graph.
#[derive(Debug, Deserialize)]
pub struct ODataError {
    pub error: ODataErrorBody,
}

/// `OData` error body.
#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: String,
}

/// Paged collection response.
#[derive(Debug, Deserialize)]
pub struct ODataResponse<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Directory object as serialized by Graph.
#[derive(Debug, Deserialize)]
struct GraphObject {
    #[serde(rename = "@odata.type")]
    odata_type: Option<String>,
    id: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    mail: Option<String>,
}

impl GraphObject {
    fn into_directory_object(self, implied_kind: Option<&ObjectKind>) -> DirectoryObject {
        let kind = match (self.odata_type.as_deref(), implied_kind) {
            (Some(odata_type), _) => ObjectKind::from_odata_type(odata_type),
            (None, Some(kind)) => kind.clone(),
            (None, None) => ObjectKind::Other("#microsoft.graph.directoryObject".to_string()),
        };

        DirectoryObject {
            id: self.id,
            display_name: self.display_name,
            mail: self.mail,
            kind,
        }
    }
}

/// Directory client speaking to Microsoft Graph over HTTPS.
///
/// Owns the transport policy: throttled (429) and transient (502/503/504)
/// responses are retried up to `max_retries` times, an expired token is
/// refreshed once on 401.
#[derive(Debug)]
pub struct GraphDirectoryClient {
    http_client: reqwest::Client,
    token_cache: Arc<TokenCache>,
    base_url: String,
    graph_origin: url::Origin,
    max_retries: u32,
    max_retry_after: Duration,
}

impl GraphDirectoryClient {
    /// Creates a client for the configured tenant.
    pub fn new(config: &DirectoryConfig, credentials: DirectoryCredentials) -> DirectoryResult<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DirectoryError::Config(format!("Failed to create HTTP client: {e}")))?;

        let token_cache = Arc::new(TokenCache::new(
            credentials,
            &config.cloud_environment,
            &config.tenant_id,
            http_client.clone(),
        ));

        Self::with_token_cache(config, http_client, token_cache)
    }

    /// Creates a client sharing an existing HTTP client and token cache.
    pub fn with_token_cache(
        config: &DirectoryConfig,
        http_client: reqwest::Client,
        token_cache: Arc<TokenCache>,
    ) -> DirectoryResult<Self> {
        let graph_origin = Url::parse(config.cloud_environment.graph_endpoint())?.origin();

        Ok(Self {
            http_client,
            token_cache,
            base_url: config.graph_base_url(),
            graph_origin,
            max_retries: config.max_retries,
            max_retry_after: Duration::from_secs(config.max_retry_after_secs),
        })
    }

    /// Graph base URL including the API version.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL of an initial page request.
    #[must_use]
    pub fn query_url(&self, query: &PageQuery) -> String {
        let mut url = format!("{}/{}", self.base_url, collection_path(&query.collection));

        let mut params = Vec::new();
        if !query.select.is_empty() {
            let select: Vec<_> = query
                .select
                .iter()
                .map(|field| urlencoding::encode(field))
                .collect();
            params.push(format!("$select={}", select.join(",")));
        }
        if let Some(top) = query.top {
            params.push(format!("$top={top}"));
        }
        if let Some(filter) = &query.filter {
            params.push(format!("$filter={}", urlencoding::encode(filter.as_str())));
        }

        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }

    fn check_next_link(&self, next_link: &str) -> DirectoryResult<()> {
        let trusted = Url::parse(next_link)
            .map(|url| url.origin() == self.graph_origin)
            .unwrap_or(false);

        if trusted {
            Ok(())
        } else {
            Err(DirectoryError::UntrustedNextLink(next_link.to_string()))
        }
    }

    async fn get_page(&self, url: &str, collection: Collection) -> DirectoryResult<Page> {
        debug!(url, "Fetching page");
        let response = self.send(reqwest::Method::GET, url, None).await?;
        let body: ODataResponse<GraphObject> = response.json().await?;

        let implied_kind = collection.implied_kind();
        let items: Vec<DirectoryObject> = body
            .value
            .into_iter()
            .map(|object| object.into_directory_object(implied_kind.as_ref()))
            .collect();

        debug!(items = items.len(), has_next = body.next_link.is_some(), "Page received");

        let next = body
            .next_link
            .map(|link| ContinuationToken::new(link, collection));
        Ok(Page { items, next })
    }

    /// Sends a request, retrying throttled and transient failures.
    async fn send(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> DirectoryResult<reqwest::Response> {
        let mut attempts = 0u32;
        let mut backoff = INITIAL_BACKOFF;
        let mut refreshed_token = false;

        loop {
            let token = self.token_cache.get_token().await?;

            let mut request = self
                .http_client
                .request(method.clone(), url)
                .bearer_auth(&token);
            if let Some(b) = body {
                request = request.json(b);
            }

            let response = request.send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if status == reqwest::StatusCode::UNAUTHORIZED && !refreshed_token {
                debug!("Access token rejected, refreshing");
                self.token_cache.invalidate().await;
                refreshed_token = true;
                continue;
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(1);

                if attempts >= self.max_retries {
                    return Err(DirectoryError::RateLimited { retry_after_secs });
                }
                attempts += 1;

                let wait = Duration::from_secs(retry_after_secs).min(self.max_retry_after);
                warn!(
                    "Throttled, retry {}/{} after {:?}",
                    attempts, self.max_retries, wait
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            if matches!(
                status,
                reqwest::StatusCode::BAD_GATEWAY
                    | reqwest::StatusCode::SERVICE_UNAVAILABLE
                    | reqwest::StatusCode::GATEWAY_TIMEOUT
            ) && attempts < self.max_retries
            {
                attempts += 1;
                warn!(
                    "Transient error {}, retry {}/{} after {:?}",
                    status, attempts, self.max_retries, backoff
                );
                tokio::time::sleep(backoff).await;
                backoff = next_backoff(backoff);
                continue;
            }

            let error_body = response.text().await.unwrap_or_default();
            return Err(graph_error(status, error_body));
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2).min(MAX_BACKOFF)
}

fn collection_path(collection: &Collection) -> String {
    match collection {
        Collection::Users => "users".to_string(),
        Collection::Groups => "groups".to_string(),
        Collection::GroupMembers {
            group_id,
            transitive,
        } => format!(
            "groups/{}/{}",
            urlencoding::encode(group_id),
            if *transitive {
                "transitiveMembers"
            } else {
                "members"
            }
        ),
    }
}

fn graph_error(status: reqwest::StatusCode, body: String) -> DirectoryError {
    match serde_json::from_str::<ODataError>(&body) {
        Ok(odata_error) => DirectoryError::GraphApi {
            status: status.as_u16(),
            code: odata_error.error.code,
            message: odata_error.error.message,
        },
        Err(_) => DirectoryError::GraphApi {
            status: status.as_u16(),
            code: status.to_string(),
            message: body,
        },
    }
}

#[async_trait]
impl DirectoryClient for GraphDirectoryClient {
    #[instrument(skip(self))]
    async fn fetch_page(&self, query: &PageQuery) -> DirectoryResult<Page> {
        let url = self.query_url(query);
        self.get_page(&url, query.collection.clone()).await
    }

    #[instrument(skip(self, token))]
    async fn fetch_next(&self, token: ContinuationToken) -> DirectoryResult<Page> {
        let (next_link, collection) = token.into_parts();
        self.check_next_link(&next_link)?;
        self.get_page(&next_link, collection).await
    }

    #[instrument(skip(self))]
    async fn add_member_reference(&self, group_id: &str, member_id: &str) -> DirectoryResult<()> {
        let url = format!(
            "{}/groups/{}/members/$ref",
            self.base_url,
            urlencoding::encode(group_id)
        );
        let body = serde_json::json!({
            "@odata.id": format!(
                "{}/directoryObjects/{}",
                self.base_url,
                urlencoding::encode(member_id)
            )
        });

        self.send(reqwest::Method::POST, &url, Some(&body)).await?;
        info!("Member reference added");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_member_reference(
        &self,
        group_id: &str,
        member_id: &str,
    ) -> DirectoryResult<()> {
        let url = format!(
            "{}/groups/{}/members/{}/$ref",
            self.base_url,
            urlencoding::encode(group_id),
            urlencoding::encode(member_id)
        );

        self.send(reqwest::Method::DELETE, &url, None).await?;
        info!("Member reference removed");
        Ok(())
    }
}
