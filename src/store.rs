//! Document store contracts consumed by generators.
//!
//! The concrete client lives outside this crate. Generators only need an
//! environment that hands out a dependency network and a session, a session
//! that resolves namespaces to collections, and a streaming cursor.

use crate::error::StoreError;
use crate::network::DependencyNetwork;
use crate::types::{Document, Namespace};
use async_trait::async_trait;
use std::sync::Arc;

/// Shared process environment. Jobs hold it by `Arc` and never own it.
#[async_trait]
pub trait Environment: Send + Sync {
    /// Handle to the process-wide dependency network
    async fn dependency_network(&self) -> Result<Arc<dyn DependencyNetwork>, StoreError>;

    /// Open a session scoped to the caller; dropping it releases the connection
    async fn session(&self) -> Result<Box<dyn Session>, StoreError>;
}

pub trait Session: Send + Sync {
    fn collection(&self, namespace: &Namespace) -> Box<dyn Collection>;
}

#[async_trait]
pub trait Collection: Send + Sync {
    /// Start a query. `limit` is a hint; 0 means unlimited.
    ///
    /// Failures are deferred to the returned iterator's `close`.
    async fn find(&self, filter: &Document, limit: usize) -> Box<dyn RecordIterator>;
}

/// Streaming cursor over query results.
///
/// An empty result set is not an error. `close` must be called on every path
/// and is the authoritative report of query failures.
#[async_trait]
pub trait RecordIterator: Send {
    async fn next(&mut self) -> Option<Document>;

    /// Error accumulated so far, without releasing the cursor
    fn err(&self) -> Option<StoreError>;

    async fn close(&mut self) -> Result<(), StoreError>;
}
