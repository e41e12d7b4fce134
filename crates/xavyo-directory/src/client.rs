//! The directory client boundary.

use async_trait::async_trait;

use crate::model::{ContinuationToken, Page, PageQuery};
use crate::DirectoryResult;

/// Remote directory operations consumed by lookups and membership checks.
///
/// Each call is one round trip. Implementations own transport concerns
/// (authentication, retries, rate limiting); callers treat every error as an
/// opaque failure of that round trip.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch the first page of a query.
    async fn fetch_page(&self, query: &PageQuery) -> DirectoryResult<Page>;

    /// Fetch the page a continuation token points to.
    ///
    /// The token must come from the page fetched immediately before.
    async fn fetch_next(&self, token: ContinuationToken) -> DirectoryResult<Page>;

    /// Record `member_id` as a member of `group_id`.
    async fn add_member_reference(&self, group_id: &str, member_id: &str) -> DirectoryResult<()>;

    /// Remove `member_id` from `group_id`.
    async fn remove_member_reference(
        &self,
        group_id: &str,
        member_id: &str,
    ) -> DirectoryResult<()>;
}

#[async_trait]
impl<C: DirectoryClient + ?Sized> DirectoryClient for std::sync::Arc<C> {
    async fn fetch_page(&self, query: &PageQuery) -> DirectoryResult<Page> {
        (**self).fetch_page(query).await
    }

    async fn fetch_next(&self, token: ContinuationToken) -> DirectoryResult<Page> {
        (**self).fetch_next(token).await
    }

    async fn add_member_reference(&self, group_id: &str, member_id: &str) -> DirectoryResult<()> {
        (**self).add_member_reference(group_id, member_id).await
    }

    async fn remove_member_reference(
        &self,
        group_id: &str,
        member_id: &str,
    ) -> DirectoryResult<()> {
        (**self).remove_member_reference(group_id, member_id).await
    }
}
