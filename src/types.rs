//! Core value types shared across generators and jobs.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A JSON document as returned by a collection query.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A `(database, collection)` pair identifying a target dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(rename = "db")]
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.database.trim().is_empty() {
            return Err(ApiError::InvalidNamespace(
                "database name cannot be empty".to_string(),
            ));
        }
        if self.collection.trim().is_empty() {
            return Err(ApiError::InvalidNamespace(
                "collection name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Options controlling which records a generator visits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOptions {
    /// Id assigned to the generator; prefix of every derived job id
    #[serde(default)]
    pub job_id: String,

    #[serde(default, rename = "ns")]
    pub namespace: Namespace,

    /// Query filter passed to the collection
    #[serde(default)]
    pub query: Document,

    /// Maximum number of jobs to produce; 0 means unlimited
    #[serde(default)]
    pub limit: usize,
}

impl GeneratorOptions {
    pub fn new(job_id: impl Into<String>, namespace: Namespace) -> Self {
        Self {
            job_id: job_id.into(),
            namespace,
            query: Document::new(),
            limit: 0,
        }
    }

    pub fn with_query(mut self, query: Document) -> Self {
        self.query = query;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether `produced` jobs already satisfy the limit.
    pub fn limit_reached(&self, produced: usize) -> bool {
        self.limit > 0 && produced >= self.limit
    }
}
