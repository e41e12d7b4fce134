//! Entry point tying a [`DirectoryClient`] to lookup options.

use crate::client::DirectoryClient;
use crate::config::MAX_PAGE_SIZE;
use crate::{DirectoryConfig, DirectoryCredentials, DirectoryResult, GraphDirectoryClient};

const DEFAULT_PAGE_SIZE: u32 = 100;

/// Mail lookups, membership checks and membership changes against one
/// directory.
///
/// Every call fetches fresh state; nothing is cached between calls.
#[derive(Debug)]
pub struct Directory<C> {
    client: C,
    page_size: u32,
    transitive_members: bool,
}

impl<C: DirectoryClient> Directory<C> {
    /// Wraps a client with default options (100 members per page, direct
    /// membership only).
    pub fn new(client: C) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
            transitive_members: false,
        }
    }

    /// Sets the member page size, clamped to what Graph accepts.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Count members of nested groups as members.
    #[must_use]
    pub fn with_transitive_members(mut self, transitive: bool) -> Self {
        self.transitive_members = transitive;
        self
    }

    /// The underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    pub(crate) fn page_size(&self) -> u32 {
        self.page_size
    }

    pub(crate) fn transitive_members(&self) -> bool {
        self.transitive_members
    }
}

impl Directory<GraphDirectoryClient> {
    /// Connects to Microsoft Graph using the configured tenant and options.
    pub fn connect(
        config: &DirectoryConfig,
        credentials: DirectoryCredentials,
    ) -> DirectoryResult<Self> {
        let client = GraphDirectoryClient::new(config, credentials)?;
        Ok(Self::new(client)
            .with_page_size(config.page_size)
            .with_transitive_members(config.transitive_members))
    }
}
