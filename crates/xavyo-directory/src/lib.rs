//! Directory lookups and group membership for xavyo
//!
//! Resolves users and groups by mail address and answers "is this user a
//! member of this group" over Microsoft Graph, following `@odata.nextLink`
//! continuation one page at a time.
//!
//! # Features
//!
//! - Mail lookup against users or groups, with ambiguity reporting
//! - Membership checks that stop at the first matching page
//! - Direct or transitive (nested group) membership
//! - Adding and removing group members by mail
//! - Escaped `OData` filter construction
//! - Multi-cloud support (Commercial, US Government, China, custom endpoints)
//!
//! The lookup logic is written against the [`DirectoryClient`] trait;
//! [`GraphDirectoryClient`] is the Microsoft Graph implementation.
//!
//! # Example
//!
//! ```no_run
//! use xavyo_directory::{Directory, DirectoryConfig, DirectoryCredentials};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DirectoryConfig::builder()
//!     .tenant_id("your-tenant-id")
//!     .transitive_members(true)
//!     .build()?;
//!
//! let credentials = DirectoryCredentials {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: "your-client-secret".to_string().into(),
//! };
//!
//! let directory = Directory::connect(&config, credentials)?;
//! if !directory.is_member_by_mail("team@example.com", "jane@example.com").await? {
//!     directory.add_user_to_group("jane@example.com", "team@example.com").await?;
//! }
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod config;
mod directory;
mod error;
mod filter;
mod graph_client;
mod membership;
mod model;
mod mutation;
mod pager;
mod resolver;

// Re-exports
pub use auth::TokenCache;
pub use client::DirectoryClient;
pub use config::{
    CloudEnvironment, DirectoryConfig, DirectoryConfigBuilder, DirectoryCredentials, MAX_PAGE_SIZE,
};
pub use directory::Directory;
pub use error::{DirectoryError, DirectoryResult};
pub use filter::{escape_odata_string, ODataFilter};
pub use graph_client::{GraphDirectoryClient, ODataError, ODataErrorBody, ODataResponse};
pub use model::{
    Collection, ContinuationToken, DirectoryObject, MailMatch, MembershipQuery, ObjectCollection,
    ObjectKind, Page, PageQuery,
};
pub use pager::{walk, PageWalker};
