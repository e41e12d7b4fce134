//! Directory objects, pages and query descriptions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::filter::ODataFilter;

/// Type tag of a directory object.
///
/// Group member listings mix users, nested groups and service principals.
/// The tag is taken from the `@odata.type` annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A user account.
    User,
    /// A group (possibly nested inside another group).
    Group,
    /// An application identity.
    ServicePrincipal,
    /// Anything else, carrying the raw `@odata.type` value.
    Other(String),
}

impl ObjectKind {
    /// Maps an `@odata.type` annotation such as `#microsoft.graph.user`.
    #[must_use]
    pub fn from_odata_type(odata_type: &str) -> Self {
        match odata_type.trim_start_matches('#') {
            "microsoft.graph.user" => Self::User,
            "microsoft.graph.group" => Self::Group,
            "microsoft.graph.servicePrincipal" => Self::ServicePrincipal,
            _ => Self::Other(odata_type.to_string()),
        }
    }

    /// Returns true for user accounts.
    #[must_use]
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User)
    }
}

/// A user, group or service principal as returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryObject {
    /// Server-assigned object ID.
    pub id: String,
    /// Display name, when selected.
    pub display_name: Option<String>,
    /// Primary mail address, when set.
    pub mail: Option<String>,
    /// Object type.
    pub kind: ObjectKind,
}

impl DirectoryObject {
    /// Creates a user object.
    pub fn user(id: impl Into<String>, mail: Option<&str>) -> Self {
        Self::new(id, mail, ObjectKind::User)
    }

    /// Creates a group object.
    pub fn group(id: impl Into<String>, mail: Option<&str>) -> Self {
        Self::new(id, mail, ObjectKind::Group)
    }

    /// Creates an object of the given kind without a display name.
    pub fn new(id: impl Into<String>, mail: Option<&str>, kind: ObjectKind) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            mail: mail.map(String::from),
            kind,
        }
    }
}

/// Collections the mail resolver can search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectCollection {
    Users,
    Groups,
}

impl fmt::Display for ObjectCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Users => f.write_str("user"),
            Self::Groups => f.write_str("group"),
        }
    }
}

/// A queryable collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection {
    /// All users in the tenant.
    Users,
    /// All groups in the tenant.
    Groups,
    /// Members of one group; `transitive` expands nested groups server-side.
    GroupMembers { group_id: String, transitive: bool },
}

impl Collection {
    /// Member collection of a group.
    pub fn members(group_id: impl Into<String>, transitive: bool) -> Self {
        Self::GroupMembers {
            group_id: group_id.into(),
            transitive,
        }
    }

    /// Kind of every object in the collection, if homogeneous.
    #[must_use]
    pub fn implied_kind(&self) -> Option<ObjectKind> {
        match self {
            Self::Users => Some(ObjectKind::User),
            Self::Groups => Some(ObjectKind::Group),
            Self::GroupMembers { .. } => None,
        }
    }
}

impl From<ObjectCollection> for Collection {
    fn from(collection: ObjectCollection) -> Self {
        match collection {
            ObjectCollection::Users => Self::Users,
            ObjectCollection::Groups => Self::Groups,
        }
    }
}

/// Description of an initial page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub collection: Collection,
    pub filter: Option<ODataFilter>,
    pub select: Vec<String>,
    pub top: Option<u32>,
}

impl PageQuery {
    /// Creates an unfiltered query returning server-default fields.
    #[must_use]
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filter: None,
            select: Vec::new(),
            top: None,
        }
    }

    /// Sets the server-side filter.
    #[must_use]
    pub fn with_filter(mut self, filter: ODataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Restricts the returned properties.
    #[must_use]
    pub fn with_select(mut self, fields: &[&str]) -> Self {
        self.select = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }
}

/// Opaque cursor to the next page of a collection.
///
/// Deliberately not `Clone`: fetching the next page consumes the token, so
/// it cannot be replayed once used.
#[derive(Debug, PartialEq, Eq)]
pub struct ContinuationToken {
    cursor: String,
    collection: Collection,
}

impl ContinuationToken {
    /// Wraps a server-issued cursor for the given collection.
    pub fn new(cursor: impl Into<String>, collection: Collection) -> Self {
        Self {
            cursor: cursor.into(),
            collection,
        }
    }

    /// The raw cursor (for Graph, the `@odata.nextLink` URL).
    #[must_use]
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// The collection this cursor continues.
    #[must_use]
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Splits the token into its parts.
    #[must_use]
    pub fn into_parts(self) -> (String, Collection) {
        (self.cursor, self.collection)
    }
}

/// One page of results.
#[derive(Debug, Default)]
pub struct Page {
    /// Items in server order.
    pub items: Vec<DirectoryObject>,
    /// Present when more results exist.
    pub next: Option<ContinuationToken>,
}

impl Page {
    /// A final page.
    #[must_use]
    pub fn last(items: Vec<DirectoryObject>) -> Self {
        Self { items, next: None }
    }

    /// A page followed by more results.
    #[must_use]
    pub fn with_next(items: Vec<DirectoryObject>, next: ContinuationToken) -> Self {
        Self {
            items,
            next: Some(next),
        }
    }

    /// Returns true if no continuation token is present.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// "Is this user a member of this group", by object ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipQuery {
    pub group_id: String,
    pub user_id: String,
}

impl MembershipQuery {
    pub fn new(group_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Result of a mail lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMatch {
    /// First object in server order.
    pub object: DirectoryObject,
    /// Number of matching objects seen on the first page.
    pub candidates: usize,
}

impl MailMatch {
    /// More than one object carries the mail; `object` is the first only.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_kind_from_odata_type() {
        assert_eq!(
            ObjectKind::from_odata_type("#microsoft.graph.user"),
            ObjectKind::User
        );
        assert_eq!(
            ObjectKind::from_odata_type("#microsoft.graph.group"),
            ObjectKind::Group
        );
        assert_eq!(
            ObjectKind::from_odata_type("#microsoft.graph.servicePrincipal"),
            ObjectKind::ServicePrincipal
        );
        assert_eq!(
            ObjectKind::from_odata_type("#microsoft.graph.device"),
            ObjectKind::Other("#microsoft.graph.device".to_string())
        );
    }

    #[test]
    fn test_implied_kind() {
        assert_eq!(Collection::Users.implied_kind(), Some(ObjectKind::User));
        assert_eq!(Collection::Groups.implied_kind(), Some(ObjectKind::Group));
        assert_eq!(Collection::members("g-1", false).implied_kind(), None);
    }

    #[test]
    fn test_page_is_last() {
        assert!(Page::last(vec![]).is_last());

        let token = ContinuationToken::new("next", Collection::Users);
        assert!(!Page::with_next(vec![], token).is_last());
    }

    #[test]
    fn test_mail_match_ambiguity() {
        let found = MailMatch {
            object: DirectoryObject::user("u-1", Some("a@example.com")),
            candidates: 1,
        };
        assert!(!found.is_ambiguous());

        let ambiguous = MailMatch {
            candidates: 2,
            ..found
        };
        assert!(ambiguous.is_ambiguous());
    }
}
