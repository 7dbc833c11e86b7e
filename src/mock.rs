//! In-memory collaborators for tests and dry runs.
//!
//! `MockEnvironment` hands out a shared `InMemoryNetwork` and a `MockSession`
//! whose collections are plain record vectors. Failures can be injected at
//! each stage; injected messages surface verbatim.

use crate::error::StoreError;
use crate::network::{DependencyNetwork, InMemoryNetwork};
use crate::store::{Collection, Environment, RecordIterator, Session};
use crate::types::{Document, Namespace};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct MockEnvironment {
    network: Arc<InMemoryNetwork>,
    session: MockSession,
    network_error: Mutex<Option<String>>,
    session_error: Mutex<Option<String>>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network(&self) -> Arc<InMemoryNetwork> {
        Arc::clone(&self.network)
    }

    pub fn mock_session(&self) -> &MockSession {
        &self.session
    }

    /// Make `dependency_network` fail with `message` (or succeed again with `None`).
    pub fn set_network_error(&self, message: Option<&str>) {
        *self.network_error.lock() = message.map(str::to_string);
    }

    /// Make `session` fail with `message` (or succeed again with `None`).
    pub fn set_session_error(&self, message: Option<&str>) {
        *self.session_error.lock() = message.map(str::to_string);
    }
}

#[async_trait]
impl Environment for MockEnvironment {
    async fn dependency_network(&self) -> Result<Arc<dyn DependencyNetwork>, StoreError> {
        if let Some(message) = self.network_error.lock().clone() {
            return Err(StoreError::Unavailable(message));
        }
        Ok(self.network())
    }

    async fn session(&self) -> Result<Box<dyn Session>, StoreError> {
        if let Some(message) = self.session_error.lock().clone() {
            return Err(StoreError::Unavailable(message));
        }
        Ok(Box::new(self.session.clone()))
    }
}

#[derive(Debug, Clone, Default)]
struct CollectionState {
    records: Vec<Document>,
    query_error: Option<String>,
    stall: bool,
}

/// Session over in-memory collections. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    collections: Arc<Mutex<HashMap<Namespace, CollectionState>>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the records stored under `namespace`.
    pub fn insert(&self, namespace: &Namespace, records: Vec<Document>) {
        self.collections
            .lock()
            .entry(namespace.clone())
            .or_default()
            .records = records;
    }

    /// Make cursors over `namespace` fail on close with `message`. Stored
    /// records are still yielded first.
    pub fn set_query_error(&self, namespace: &Namespace, message: Option<&str>) {
        self.collections
            .lock()
            .entry(namespace.clone())
            .or_default()
            .query_error = message.map(str::to_string);
    }

    /// Make cursors over `namespace` block once their records run out.
    pub fn set_stall(&self, namespace: &Namespace, stall: bool) {
        self.collections
            .lock()
            .entry(namespace.clone())
            .or_default()
            .stall = stall;
    }

    pub fn opened_cursors(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed_cursors(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Session for MockSession {
    fn collection(&self, namespace: &Namespace) -> Box<dyn Collection> {
        Box::new(MockCollection {
            namespace: namespace.clone(),
            session: self.clone(),
        })
    }
}

pub struct MockCollection {
    namespace: Namespace,
    session: MockSession,
}

#[async_trait]
impl Collection for MockCollection {
    /// Returns every stored record matching `filter` by top-level equality.
    /// The limit hint is ignored.
    async fn find(&self, filter: &Document, _limit: usize) -> Box<dyn RecordIterator> {
        let state = self
            .session
            .collections
            .lock()
            .get(&self.namespace)
            .cloned()
            .unwrap_or_default();

        let records = state
            .records
            .into_iter()
            .filter(|record| matches_filter(record, filter))
            .collect();
        let mut iter = match state.query_error {
            Some(message) => MockIterator::new(records).with_error(&message),
            None => MockIterator::new(records),
        };
        iter.stall = state.stall;
        iter.on_close = Some(Arc::clone(&self.session.closed));
        self.session.opened.fetch_add(1, Ordering::SeqCst);
        Box::new(iter)
    }
}

fn matches_filter(record: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, expected)| record.get(field) == Some(expected))
}

/// Cursor over a fixed list of records.
#[derive(Debug, Default)]
pub struct MockIterator {
    records: VecDeque<Document>,
    error: Option<StoreError>,
    stall: bool,
    closed: bool,
    on_close: Option<Arc<AtomicUsize>>,
}

impl MockIterator {
    pub fn new(records: Vec<Document>) -> Self {
        Self {
            records: records.into(),
            ..Self::default()
        }
    }

    /// Yield the records, then fail `close` with `message`.
    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(StoreError::Query(message.to_string()));
        self
    }

    pub fn remaining(&self) -> usize {
        self.records.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl RecordIterator for MockIterator {
    async fn next(&mut self) -> Option<Document> {
        if self.closed {
            return None;
        }
        match self.records.pop_front() {
            Some(record) => Some(record),
            None if self.stall => std::future::pending().await,
            None => None,
        }
    }

    fn err(&self) -> Option<StoreError> {
        self.error.clone()
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        if !self.closed {
            self.closed = true;
            if let Some(counter) = &self.on_close {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
