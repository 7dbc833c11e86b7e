//! Shared fixtures for integration tests

use docmigrate::mock::MockEnvironment;
use docmigrate::{Document, GeneratorOptions, Namespace, SimpleMigrationGenerator};
use serde_json::json;
use std::sync::Arc;

pub fn namespace() -> Namespace {
    Namespace::new("foo", "bar")
}

/// Record with the given `_id`
pub fn record(id: &str) -> Document {
    let mut doc = Document::new();
    doc.insert("_id".to_string(), json!(id));
    doc
}

pub fn records(ids: &[&str]) -> Vec<Document> {
    ids.iter().map(|id| record(id)).collect()
}

pub fn update() -> Document {
    let mut doc = Document::new();
    doc.insert("$set".to_string(), json!({"migrated": true}));
    doc
}

pub fn generator(
    env: &Arc<MockEnvironment>,
    job_id: &str,
    limit: usize,
) -> SimpleMigrationGenerator {
    let options = GeneratorOptions::new(job_id, namespace()).with_limit(limit);
    SimpleMigrationGenerator::new(env.clone(), options, update())
}
