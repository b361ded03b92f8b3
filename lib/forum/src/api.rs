//! The forum contract.

use async_trait::async_trait;
use forum_bridge_sso::SsoPayload;
use rootcause::Report;
use serde::Deserialize;

use crate::error::ForumError;

/// A forum user as returned by user synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForumUser {
    /// The forum's canonical username, which may differ from the requested one.
    pub username: String,
    /// Every group the user belongs to, managed by the bridge or not.
    #[serde(default)]
    pub groups: Vec<ForumGroup>,
}

impl ForumUser {
    /// Returns the names of the user's groups.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForumGroup {
    pub name: String,
}

/// A group known to the forum, with the id its admin API addresses it by.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupRef {
    pub id: u64,
    pub name: String,
}

/// Outcome of creating a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCreation {
    Created(GroupRef),
    /// Another login created the group first.
    AlreadyExists,
}

/// Access to the forum's users and groups.
#[async_trait]
pub trait ForumApi: Send + Sync {
    /// Creates or updates the forum user described by `payload`.
    async fn sync_user(&self, payload: &SsoPayload) -> Result<ForumUser, Report<ForumError>>;

    /// Lists all groups on the forum.
    async fn list_groups(&self) -> Result<Vec<GroupRef>, Report<ForumError>>;

    /// Creates a group named `name`.
    async fn create_group(&self, name: &str) -> Result<GroupCreation, Report<ForumError>>;

    async fn add_group_member(&self, group_id: u64, username: &str)
    -> Result<(), Report<ForumError>>;

    async fn remove_group_member(
        &self,
        group_id: u64,
        username: &str,
    ) -> Result<(), Report<ForumError>>;
}
