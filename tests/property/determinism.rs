//! Property-based tests for job id derivation and generation order

use docmigrate::generator::derive_job_id;
use docmigrate::mock::{MockEnvironment, MockIterator};
use docmigrate::store::Environment;
use docmigrate::{Document, GeneratorOptions, Namespace, SimpleMigrationGenerator};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn record(id: &str) -> Document {
    let mut doc = Document::new();
    doc.insert("_id".to_string(), json!(id));
    doc
}

fn drain(keys: &[String], limit: usize) -> (Vec<String>, usize) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(async {
        let env: Arc<dyn Environment> = Arc::new(MockEnvironment::new());
        let options = GeneratorOptions::new("gen", Namespace::new("foo", "bar")).with_limit(limit);
        let mut job = SimpleMigrationGenerator::new(Arc::clone(&env), options, Document::new());
        let mut iter = MockIterator::new(keys.iter().map(|k| record(k)).collect());
        let ids = job
            .generate_jobs(&env, &mut iter, &CancellationToken::new())
            .await
            .unwrap()
            .to_vec();
        (ids, job.migrations().count())
    })
}

proptest! {
    /// Same inputs always derive the same id
    #[test]
    fn test_job_id_determinism(id in "[a-z]{1,12}", key in "[a-zA-Z0-9]{1,16}", position in 0usize..10_000) {
        prop_assert_eq!(derive_job_id(&id, &key, position), derive_job_id(&id, &key, position));
        prop_assert_eq!(derive_job_id(&id, &key, position), format!("{}.{}.{}", id, key, position));
    }

    /// Ids follow stream order, stay unique, and never exceed the limit
    #[test]
    fn test_generation_order_and_limit(
        keys in prop::collection::vec("[a-z]{1,6}", 0..30),
        limit in 0usize..40,
    ) {
        let (ids, jobs) = drain(&keys, limit);
        let expected_len = if limit == 0 { keys.len() } else { keys.len().min(limit) };

        prop_assert_eq!(ids.len(), expected_len);
        prop_assert_eq!(jobs, ids.len());
        for (position, id) in ids.iter().enumerate() {
            prop_assert_eq!(id, &derive_job_id("gen", &keys[position], position));
        }
        let unique: HashSet<&String> = ids.iter().collect();
        prop_assert_eq!(unique.len(), ids.len());
    }
}
