//! Group membership checks.

use tracing::{debug, info, instrument};

use crate::client::DirectoryClient;
use crate::model::{Collection, MembershipQuery, ObjectCollection, ObjectKind, PageQuery};
use crate::pager::walk;
use crate::{Directory, DirectoryResult};

/// Member listings only need the ID; `@odata.type` is always returned.
const MEMBER_SELECT_FIELDS: &[&str] = &["id"];

impl<C: DirectoryClient> Directory<C> {
    /// Returns true if the user is a member of the group.
    ///
    /// Only members typed as users are compared, by object ID. Nested groups
    /// and service principals never match, even if their ID equals the
    /// target's. The walk stops at the first match.
    #[instrument(skip(self), fields(group_id = %query.group_id, user_id = %query.user_id))]
    pub async fn check_membership(&self, query: &MembershipQuery) -> DirectoryResult<bool> {
        let members = PageQuery::new(Collection::members(
            query.group_id.as_str(),
            self.transitive_members(),
        ))
        .with_select(MEMBER_SELECT_FIELDS)
        .with_top(self.page_size());

        let first = self.client().fetch_page(&members).await?;
        let mut walker = walk(self.client(), first);

        while let Some(member) = walker.try_next().await? {
            match member.kind {
                ObjectKind::User if member.id == query.user_id => {
                    debug!(pages_fetched = walker.pages_fetched(), "Member found");
                    return Ok(true);
                }
                _ => {}
            }
        }

        debug!(pages_fetched = walker.pages_fetched(), "Not a member");
        Ok(false)
    }

    /// Returns true if `user_id` is a member of `group_id`.
    pub async fn is_member(&self, group_id: &str, user_id: &str) -> DirectoryResult<bool> {
        self.check_membership(&MembershipQuery::new(group_id, user_id))
            .await
    }

    /// Resolves both mail addresses, then checks membership.
    ///
    /// An unknown group or user mail is a `NotFound` error, not `false`.
    #[instrument(skip(self))]
    pub async fn is_member_by_mail(
        &self,
        group_mail: &str,
        user_mail: &str,
    ) -> DirectoryResult<bool> {
        let group = self
            .require_by_mail(ObjectCollection::Groups, group_mail)
            .await?;
        let user = self
            .require_by_mail(ObjectCollection::Users, user_mail)
            .await?;

        let is_member = self.is_member(&group.id, &user.id).await?;
        info!(group_id = %group.id, user_id = %user.id, is_member, "Membership checked");
        Ok(is_member)
    }
}
