//! Common test utilities for xavyo-directory integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use xavyo_directory::{
    CloudEnvironment, Collection, ContinuationToken, DirectoryClient, DirectoryConfig,
    DirectoryCredentials, DirectoryError, DirectoryObject, DirectoryResult, ObjectKind,
    ODataFilter, Page, PageQuery,
};

pub const TENANT_ID: &str = "test-tenant";

/// A call observed by [`ScriptedDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchPage(PageQuery),
    FetchNext(String),
    AddMember { group_id: String, member_id: String },
    RemoveMember { group_id: String, member_id: String },
}

/// In-memory directory serving scripted pages and recording every call.
#[derive(Default)]
pub struct ScriptedDirectory {
    users: Vec<DirectoryObject>,
    groups: Vec<DirectoryObject>,
    member_pages: HashMap<String, Vec<Vec<DirectoryObject>>>,
    failing_member_page: Option<(String, usize)>,
    failing_writes: bool,
    deferred_lookups: bool,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: &str, mail: &str) -> Self {
        self.users.push(DirectoryObject::user(id, Some(mail)));
        self
    }

    pub fn with_group(mut self, id: &str, mail: &str) -> Self {
        self.groups.push(DirectoryObject::group(id, Some(mail)));
        self
    }

    /// Scripts the member listing of a group, one inner vector per page.
    pub fn with_member_pages(mut self, group_id: &str, pages: Vec<Vec<DirectoryObject>>) -> Self {
        self.member_pages.insert(group_id.to_string(), pages);
        self
    }

    /// Makes fetching member page `index` (0 = first page) of `group_id` fail.
    pub fn failing_member_page(mut self, group_id: &str, index: usize) -> Self {
        self.failing_member_page = Some((group_id.to_string(), index));
        self
    }

    /// Serves mail lookups as an empty first page whose continuation
    /// carries the matches.
    pub fn with_deferred_lookups(mut self) -> Self {
        self.deferred_lookups = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.failing_writes = true;
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of page round trips, initial and continuation.
    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::FetchPage(_) | Call::FetchNext(_)))
            .count()
    }

    pub fn write_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::AddMember { .. } | Call::RemoveMember { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn member_page(&self, group_id: &str, index: usize) -> DirectoryResult<Page> {
        if self.failing_member_page.as_ref() == Some(&(group_id.to_string(), index)) {
            return Err(unavailable());
        }

        let Some(pages) = self.member_pages.get(group_id) else {
            return Err(DirectoryError::GraphApi {
                status: 404,
                code: "Request_ResourceNotFound".to_string(),
                message: format!("Group {group_id} does not exist"),
            });
        };

        let items = pages.get(index).cloned().unwrap_or_default();
        if index + 1 < pages.len() {
            let token = ContinuationToken::new(
                format!("{group_id}#{}", index + 1),
                Collection::members(group_id, false),
            );
            Ok(Page::with_next(items, token))
        } else {
            Ok(Page::last(items))
        }
    }

    fn mail_matches(objects: &[DirectoryObject], filter: Option<&ODataFilter>) -> Vec<DirectoryObject> {
        let Some(filter) = filter else {
            return objects.to_vec();
        };
        objects
            .iter()
            .filter(|o| {
                o.mail
                    .as_deref()
                    .and_then(|mail| ODataFilter::equals("mail", mail).ok())
                    .is_some_and(|f| &f == filter)
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DirectoryClient for ScriptedDirectory {
    async fn fetch_page(&self, query: &PageQuery) -> DirectoryResult<Page> {
        self.record(Call::FetchPage(query.clone()));

        let (objects, cursor) = match &query.collection {
            Collection::Users => (&self.users, "users#deferred"),
            Collection::Groups => (&self.groups, "groups#deferred"),
            Collection::GroupMembers { group_id, .. } => return self.member_page(group_id, 0),
        };

        if self.deferred_lookups {
            let token = ContinuationToken::new(cursor, query.collection.clone());
            return Ok(Page::with_next(vec![], token));
        }
        Ok(Page::last(Self::mail_matches(objects, query.filter.as_ref())))
    }

    async fn fetch_next(&self, token: ContinuationToken) -> DirectoryResult<Page> {
        self.record(Call::FetchNext(token.cursor().to_string()));

        match token.cursor() {
            "users#deferred" => return Ok(Page::last(self.users.clone())),
            "groups#deferred" => return Ok(Page::last(self.groups.clone())),
            _ => {}
        }

        let (group_id, index) = token
            .cursor()
            .split_once('#')
            .expect("scripted cursors are group#index");
        self.member_page(group_id, index.parse().expect("numeric page index"))
    }

    async fn add_member_reference(&self, group_id: &str, member_id: &str) -> DirectoryResult<()> {
        self.record(Call::AddMember {
            group_id: group_id.to_string(),
            member_id: member_id.to_string(),
        });
        if self.failing_writes {
            return Err(unavailable());
        }
        Ok(())
    }

    async fn remove_member_reference(
        &self,
        group_id: &str,
        member_id: &str,
    ) -> DirectoryResult<()> {
        self.record(Call::RemoveMember {
            group_id: group_id.to_string(),
            member_id: member_id.to_string(),
        });
        if self.failing_writes {
            return Err(unavailable());
        }
        Ok(())
    }
}

pub fn unavailable() -> DirectoryError {
    DirectoryError::GraphApi {
        status: 503,
        code: "serviceUnavailable".to_string(),
        message: "Service unavailable".to_string(),
    }
}

pub fn user(id: &str) -> DirectoryObject {
    DirectoryObject::user(id, None)
}

pub fn group(id: &str) -> DirectoryObject {
    DirectoryObject::group(id, None)
}

pub fn service_principal(id: &str) -> DirectoryObject {
    DirectoryObject::new(id, None, ObjectKind::ServicePrincipal)
}

// =============================================================================
// Graph mock server helpers
// =============================================================================

/// Test data factory for a Graph member entry.
pub fn graph_member(odata_type: &str, id: &str) -> Value {
    json!({
        "@odata.type": format!("#microsoft.graph.{odata_type}"),
        "id": id
    })
}

/// Test data factory for a Graph user as returned by `/users`.
pub fn graph_user(id: &str, mail: &str) -> Value {
    json!({
        "id": id,
        "displayName": format!("Test User {id}"),
        "mail": mail
    })
}

/// Test data factory for a Graph group as returned by `/groups`.
pub fn graph_group(id: &str, mail: &str) -> Value {
    json!({
        "id": id,
        "displayName": format!("Test Group {id}"),
        "mail": mail
    })
}

/// Wraps items in an `OData` collection response.
pub fn odata_response(items: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut response = json!({ "value": items });
    if let Some(link) = next_link {
        response["@odata.nextLink"] = json!(link);
    }
    response
}

/// Creates an `OData` error response.
pub fn odata_error(code: &str, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}

fn token_endpoint() -> Mock {
    Mock::given(method("POST"))
        .and(path(format!("/{TENANT_ID}/oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "mock-access-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
}

/// Mock Graph server with a token endpoint.
pub struct MockGraphServer {
    pub server: MockServer,
}

impl MockGraphServer {
    /// Starts the server and mounts the token endpoint.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        token_endpoint().mount(&server).await;
        Self { server }
    }

    /// Like [`MockGraphServer::start`], but verifies on drop that the token
    /// endpoint was hit exactly `requests` times.
    pub async fn start_expecting_token_requests(requests: u64) -> Self {
        let server = MockServer::start().await;
        token_endpoint().expect(requests).mount(&server).await;
        Self { server }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Configuration pointing both endpoints at the mock server.
    pub fn config(&self) -> DirectoryConfig {
        DirectoryConfig::builder()
            .tenant_id(TENANT_ID)
            .cloud_environment(CloudEnvironment::Custom {
                graph_endpoint: self.url(),
                login_endpoint: self.url(),
            })
            .page_size(2)
            .max_retries(1)
            .build()
            .expect("valid test config")
    }

    pub fn credentials() -> DirectoryCredentials {
        DirectoryCredentials {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string().into(),
        }
    }
}
