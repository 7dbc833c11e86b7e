//! Dependency network: owner id -> set of member ids.
//!
//! Generators publish their produced job ids as one group under their own id.
//! Ordering between groups is decided by an external scheduler that reads
//! `network()`; this side only writes.

use crate::error::StoreError;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::debug;

mod persistent;

pub use persistent::SledNetwork;

/// Snapshot of every registered group.
pub type NetworkMap = HashMap<String, HashSet<String>>;

pub trait DependencyNetwork: Send + Sync {
    /// Register `members` under `owner`, replacing any earlier group.
    ///
    /// Must appear atomic to concurrent readers of `network()`.
    fn add_group(&self, owner: &str, members: &[String]) -> Result<(), StoreError>;

    /// Snapshot of every group. Persistent backends return an empty map when
    /// the read fails and log the error.
    fn network(&self) -> NetworkMap;

    /// Members of `owner`, sorted. Empty when the owner is unknown.
    fn resolve(&self, owner: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .network()
            .remove(owner)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        members.sort_unstable();
        members
    }
}

/// Process-local network guarded by a single read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryNetwork {
    groups: RwLock<NetworkMap>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

impl DependencyNetwork for InMemoryNetwork {
    fn add_group(&self, owner: &str, members: &[String]) -> Result<(), StoreError> {
        let group: HashSet<String> = members.iter().cloned().collect();
        debug!(owner, members = group.len(), "Registering dependency group");
        self.groups.write().insert(owner.to_string(), group);
        Ok(())
    }

    fn network(&self) -> NetworkMap {
        self.groups.read().clone()
    }

    fn resolve(&self, owner: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .groups
            .read()
            .get(owner)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        members.sort_unstable();
        members
    }
}
