//! Lazy traversal of paged collections.
//!
//! A walk starts from an already-fetched first page and follows continuation
//! tokens one page at a time. The next page is requested only once the
//! caller has pulled every buffered item, so stopping early never costs an
//! extra round trip.

use futures::stream::{self, Stream};
use tracing::debug;

use crate::client::DirectoryClient;
use crate::model::{ContinuationToken, DirectoryObject, Page};
use crate::{DirectoryError, DirectoryResult};

/// Starts a walk over `first` and every page after it.
pub fn walk<C: DirectoryClient + ?Sized>(client: &C, first: Page) -> PageWalker<'_, C> {
    PageWalker::new(client, first)
}

/// Forward-only cursor over all items of a paged collection.
///
/// A failed fetch is returned from the pull that triggered it; items already
/// yielded stay yielded. The walker is finished after a failure.
pub struct PageWalker<'a, C: ?Sized> {
    client: &'a C,
    buffered: std::vec::IntoIter<DirectoryObject>,
    next: Option<ContinuationToken>,
    pages_fetched: usize,
}

impl<'a, C: DirectoryClient + ?Sized> PageWalker<'a, C> {
    /// Creates a walker positioned before the first item of `first`.
    pub fn new(client: &'a C, first: Page) -> Self {
        Self {
            client,
            buffered: first.items.into_iter(),
            next: first.next,
            pages_fetched: 0,
        }
    }

    /// Returns the next item, fetching the following page when needed.
    pub async fn try_next(&mut self) -> DirectoryResult<Option<DirectoryObject>> {
        loop {
            if let Some(item) = self.buffered.next() {
                return Ok(Some(item));
            }

            // Taken before the fetch: a failed fetch leaves nothing to resume.
            let Some(token) = self.next.take() else {
                return Ok(None);
            };

            debug!(pages_fetched = self.pages_fetched, "Fetching next page");
            let page = self.client.fetch_next(token).await?;
            self.pages_fetched += 1;
            self.buffered = page.items.into_iter();
            self.next = page.next;
        }
    }

    /// Number of pages fetched after the first one.
    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Drains the walk into a vector.
    pub async fn try_collect(mut self) -> DirectoryResult<Vec<DirectoryObject>> {
        let mut items = Vec::new();
        while let Some(item) = self.try_next().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Exposes the walk as a stream.
    pub fn into_stream(self) -> impl Stream<Item = DirectoryResult<DirectoryObject>> + 'a {
        stream::try_unfold(self, |mut walker| async move {
            let item = walker.try_next().await?;
            Ok::<_, DirectoryError>(item.map(|item| (item, walker)))
        })
    }
}
