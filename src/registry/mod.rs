//! Group registry
//!
//! Ordered list of path-resolution groups. Built once while routes are set
//! up, then shared read-only behind an `Arc` by every request.

mod group;

pub use group::{join_normalized, CacheConfig, Group, Resolution};

use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: Vec<Arc<Group>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group. No validation and no deduplication: a later group
    /// with the same prefix is simply never reached.
    pub fn register(&mut self, group: Group) -> Arc<Group> {
        tracing::debug!(prefix = %group.prefix, "registering group");
        let group = Arc::new(group);
        self.groups.push(Arc::clone(&group));
        group
    }

    /// Find the first group whose prefix is a literal prefix of `path`.
    ///
    /// Registration order decides, not prefix length.
    pub fn match_group(&self, path: &str) -> Option<&Arc<Group>> {
        if path.is_empty() {
            return None;
        }
        self.groups.iter().find(|g| path.starts_with(g.prefix.as_str()))
    }

    /// Match and resolve in one step
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let group = self.match_group(path)?;
        group.resolve(group.remainder(path)?)
    }

    /// Drop every registered group
    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Group>> {
        self.groups.iter()
    }
}
