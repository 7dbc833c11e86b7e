//! Durable sled-backed dependency network.
//!
//! One key per owner in the `dependency_groups` tree; the value is the JSON
//! encoded, sorted member list. A group is written by a single `insert`, so a
//! reader sees either the old group or the new one.

use std::path::Path;

use sled::{Db, Tree};
use tracing::{debug, warn};

use super::{DependencyNetwork, NetworkMap};
use crate::error::StoreError;

const TREE_GROUPS: &str = "dependency_groups";

#[derive(Clone)]
pub struct SledNetwork {
    db: Db,
    groups: Tree,
}

impl SledNetwork {
    pub fn new(db: Db) -> Result<Self, StoreError> {
        let groups = db.open_tree(TREE_GROUPS).map_err(to_store_backend)?;
        Ok(Self { db, groups })
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(to_store_backend)?;
        Self::new(db)
    }

    pub fn get_group(&self, owner: &str) -> Result<Option<Vec<String>>, StoreError> {
        let Some(raw) = self.groups.get(owner.as_bytes()).map_err(to_store_backend)? else {
            return Ok(None);
        };
        let members = serde_json::from_slice(&raw).map_err(to_store_data)?;
        Ok(Some(members))
    }

    pub fn remove_group(&self, owner: &str) -> Result<bool, StoreError> {
        let removed = self
            .groups
            .remove(owner.as_bytes())
            .map_err(to_store_backend)?;
        Ok(removed.is_some())
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush().map_err(to_store_backend)?;
        Ok(())
    }

    /// Every stored group. Unlike `network()`, read and decode failures are
    /// returned instead of yielding an empty map.
    pub fn load_all(&self) -> Result<NetworkMap, StoreError> {
        let mut out = NetworkMap::new();
        for result in self.groups.iter() {
            let (key, value) = result.map_err(to_store_backend)?;
            let owner = String::from_utf8(key.to_vec()).map_err(|e| StoreError::Io(e.to_string()))?;
            let members: Vec<String> = serde_json::from_slice(&value).map_err(to_store_data)?;
            out.insert(owner, members.into_iter().collect());
        }
        Ok(out)
    }
}

impl DependencyNetwork for SledNetwork {
    fn add_group(&self, owner: &str, members: &[String]) -> Result<(), StoreError> {
        let mut sorted = members.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let value = serde_json::to_vec(&sorted).map_err(to_store_data)?;
        self.groups
            .insert(owner.as_bytes(), value)
            .map_err(to_store_backend)?;
        debug!(owner, members = sorted.len(), "Persisted dependency group");
        Ok(())
    }

    /// Empty on read failure; use `load_all` to observe the error.
    fn network(&self) -> NetworkMap {
        match self.load_all() {
            Ok(map) => map,
            Err(err) => {
                warn!(error = %err, "Failed to read dependency network");
                NetworkMap::new()
            }
        }
    }

    fn resolve(&self, owner: &str) -> Vec<String> {
        match self.get_group(owner) {
            Ok(members) => members.unwrap_or_default(),
            Err(err) => {
                warn!(owner, error = %err, "Failed to resolve dependency group");
                Vec::new()
            }
        }
    }
}

fn to_store_backend(err: sled::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn to_store_data(err: serde_json::Error) -> StoreError {
    StoreError::Io(err.to_string())
}
