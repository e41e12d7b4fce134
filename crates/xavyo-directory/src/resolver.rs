//! Lookup of users and groups by mail address.
//!
//! Only the first page of the filtered query is examined. An exact `mail eq`
//! filter should never push a match past the first page, but if the server
//! returns an empty first page with a continuation link the lookup still
//! reports not found.

use tracing::{debug, instrument, warn};

use crate::client::DirectoryClient;
use crate::filter::ODataFilter;
use crate::model::{DirectoryObject, MailMatch, ObjectCollection, PageQuery};
use crate::{Directory, DirectoryError, DirectoryResult};

/// Properties fetched for resolved objects.
const RESOLVE_SELECT_FIELDS: &[&str] = &["id", "displayName", "mail"];

/// Two candidates are enough to tell a unique match from an ambiguous one.
const RESOLVE_PAGE_SIZE: u32 = 2;

impl<C: DirectoryClient> Directory<C> {
    /// Finds the object in `collection` whose mail equals `mail`.
    ///
    /// Returns the first match in server order. Mail is not guaranteed to be
    /// unique; check [`MailMatch::is_ambiguous`] when that matters.
    #[instrument(skip(self))]
    pub async fn resolve_by_mail(
        &self,
        collection: ObjectCollection,
        mail: &str,
    ) -> DirectoryResult<Option<MailMatch>> {
        let mail = mail.trim();
        if mail.is_empty() {
            return Err(DirectoryError::InvalidInput("mail must not be empty".into()));
        }

        let query = PageQuery::new(collection.into())
            .with_filter(ODataFilter::equals("mail", mail)?)
            .with_select(RESOLVE_SELECT_FIELDS)
            .with_top(RESOLVE_PAGE_SIZE);

        let page = self.client().fetch_page(&query).await?;
        let has_more = !page.is_last();
        let candidates = page.items.len();

        let Some(object) = page.items.into_iter().next() else {
            if has_more {
                debug!("Empty first page with continuation, treating as not found");
            } else {
                debug!("No match");
            }
            return Ok(None);
        };

        if candidates > 1 {
            warn!(
                object_id = %object.id,
                candidates,
                "Mail matches more than one object, using the first"
            );
        } else {
            debug!(object_id = %object.id, "Resolved");
        }

        Ok(Some(MailMatch { object, candidates }))
    }

    /// Like [`Directory::resolve_by_mail`], but a miss is an error.
    pub async fn require_by_mail(
        &self,
        collection: ObjectCollection,
        mail: &str,
    ) -> DirectoryResult<DirectoryObject> {
        self.resolve_by_mail(collection, mail)
            .await?
            .map(|found| found.object)
            .ok_or_else(|| DirectoryError::NotFound {
                collection,
                mail: mail.trim().to_string(),
            })
    }
}
