//! Reconciliation of a user's managed forum group memberships.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use forum_bridge_forum::{ForumApi, ForumError, GroupCreation};
use rootcause::Report;
use tracing::{debug, info};

/// Groups to add and remove to turn the current set into the desired set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    pub to_add: BTreeSet<String>,
    pub to_remove: BTreeSet<String>,
}

impl MembershipDiff {
    /// `to_add = desired - current`, `to_remove = current - desired`.
    #[must_use]
    pub fn compute(desired: &BTreeSet<String>, current: &BTreeSet<String>) -> Self {
        Self {
            to_add: desired.difference(current).cloned().collect(),
            to_remove: current.difference(desired).cloned().collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOperation {
    Add,
    Remove,
}

impl fmt::Display for GroupOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// A group whose membership change did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFailure {
    pub group: String,
    pub operation: GroupOperation,
    pub message: String,
}

/// What reconciliation did for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub failures: Vec<GroupFailure>,
}

impl SyncReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives membership changes for one login against the forum.
///
/// Group ids are looked up from a directory of the forum's groups that is
/// loaded on first use and kept for the lifetime of the synchronizer.
pub struct GroupSynchronizer<'a> {
    forum: &'a dyn ForumApi,
    prefix: &'a str,
    directory: Option<HashMap<String, u64>>,
}

impl<'a> GroupSynchronizer<'a> {
    #[must_use]
    pub fn new(forum: &'a dyn ForumApi, prefix: &'a str) -> Self {
        Self {
            forum,
            prefix,
            directory: None,
        }
    }

    /// Keeps only the forum groups under the managed prefix.
    #[must_use]
    pub fn filter_managed<'g>(&self, groups: impl IntoIterator<Item = &'g str>) -> BTreeSet<String> {
        groups
            .into_iter()
            .filter(|group| group.starts_with(self.prefix))
            .map(str::to_string)
            .collect()
    }

    /// Adds `username` to every desired group it is missing from and removes
    /// it from every managed group it should no longer be in.
    ///
    /// A failure on one group does not stop the others; all failures are
    /// returned in the report.
    pub async fn reconcile(
        &mut self,
        username: &str,
        desired: &BTreeSet<String>,
        current: &BTreeSet<String>,
    ) -> SyncReport {
        let diff = MembershipDiff::compute(desired, current);
        let mut report = SyncReport::default();

        if diff.is_empty() {
            debug!(username, "Group memberships already in sync");
            return report;
        }

        for group in diff.to_add {
            match self.add_member(username, &group).await {
                Ok(()) => report.added.push(group),
                Err(e) => report.failures.push(GroupFailure {
                    group,
                    operation: GroupOperation::Add,
                    message: e.current_context().to_string(),
                }),
            }
        }

        for group in diff.to_remove {
            match self.remove_member(username, &group).await {
                Ok(()) => report.removed.push(group),
                Err(e) => report.failures.push(GroupFailure {
                    group,
                    operation: GroupOperation::Remove,
                    message: e.current_context().to_string(),
                }),
            }
        }

        report
    }

    async fn add_member(&mut self, username: &str, group: &str) -> Result<(), Report<ForumError>> {
        info!(username, group, "Adding user to group");
        let id = self.ensure_group(group).await?;
        self.forum.add_group_member(id, username).await
    }

    async fn remove_member(
        &mut self,
        username: &str,
        group: &str,
    ) -> Result<(), Report<ForumError>> {
        info!(username, group, "Removing user from group");
        let id = self
            .group_id(group)
            .await?
            .ok_or_else(|| group_not_found(group))?;
        self.forum.remove_group_member(id, username).await
    }

    /// Resolves the id of `group`, creating the group if the forum lacks it.
    async fn ensure_group(&mut self, group: &str) -> Result<u64, Report<ForumError>> {
        if let Some(id) = self.group_id(group).await? {
            return Ok(id);
        }

        match self.forum.create_group(group).await? {
            GroupCreation::Created(created) => {
                debug!(group, id = created.id, "Created group");
                let id = created.id;
                if let Some(directory) = self.directory.as_mut() {
                    directory.insert(created.name, id);
                }
                Ok(id)
            }
            GroupCreation::AlreadyExists => {
                debug!(group, "Group created concurrently, reloading groups");
                self.directory = None;
                self.group_id(group)
                    .await?
                    .ok_or_else(|| group_not_found(group))
            }
        }
    }

    async fn group_id(&mut self, group: &str) -> Result<Option<u64>, Report<ForumError>> {
        let directory = match self.directory.take() {
            Some(directory) => directory,
            None => self
                .forum
                .list_groups()
                .await?
                .into_iter()
                .map(|g| (g.name, g.id))
                .collect(),
        };
        let id = directory.get(group).copied();
        self.directory = Some(directory);
        Ok(id)
    }
}

fn group_not_found(group: &str) -> Report<ForumError> {
    Report::new(ForumError::GroupNotFound {
        name: group.to_string(),
    })
}
