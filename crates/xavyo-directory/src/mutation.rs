//! Adding and removing group members by mail address.
//!
//! Both lookups must succeed before anything is written, and exactly one
//! write is issued. Failed writes are reported, never retried here.

use tracing::{info, instrument};

use crate::client::DirectoryClient;
use crate::model::ObjectCollection;
use crate::{Directory, DirectoryResult};

impl<C: DirectoryClient> Directory<C> {
    /// Adds the user with `user_mail` to the group with `group_mail`.
    #[instrument(skip(self))]
    pub async fn add_user_to_group(&self, user_mail: &str, group_mail: &str) -> DirectoryResult<()> {
        let user = self
            .require_by_mail(ObjectCollection::Users, user_mail)
            .await?;
        let group = self
            .require_by_mail(ObjectCollection::Groups, group_mail)
            .await?;

        self.client()
            .add_member_reference(&group.id, &user.id)
            .await?;

        info!(group_id = %group.id, user_id = %user.id, "User added to group");
        Ok(())
    }

    /// Removes the user with `user_mail` from the group with `group_mail`.
    #[instrument(skip(self))]
    pub async fn remove_user_from_group(
        &self,
        user_mail: &str,
        group_mail: &str,
    ) -> DirectoryResult<()> {
        let user = self
            .require_by_mail(ObjectCollection::Users, user_mail)
            .await?;
        let group = self
            .require_by_mail(ObjectCollection::Groups, group_mail)
            .await?;

        self.client()
            .remove_member_reference(&group.id, &user.id)
            .await?;

        info!(group_id = %group.id, user_id = %user.id, "User removed from group");
        Ok(())
    }
}
