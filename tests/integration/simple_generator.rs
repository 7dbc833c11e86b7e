//! Integration tests for the simple migration generator
//!
//! Tests cover:
//! - Construction through the registry and the public constructor
//! - Failure capture at each acquisition stage and on cursor close
//! - Job production, id derivation, and the limit bound
//! - Dependency group registration, including concurrent generators
//! - Cancellation and malformed records

use super::test_utils::{generator, namespace, record, records};
use docmigrate::job::{downcast, job_factory};
use docmigrate::mock::MockEnvironment;
use docmigrate::network::DependencyNetwork;
use docmigrate::{Generator, Job, JobError, SimpleMigrationGenerator};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn blank_generator(env: &Arc<MockEnvironment>) -> Box<SimpleMigrationGenerator> {
    let factory = job_factory(SimpleMigrationGenerator::TYPE_NAME).unwrap();
    let mut job = downcast::<SimpleMigrationGenerator>(factory()).unwrap();
    job.set_environment(env.clone());
    job
}

fn assert_error_contains(job: &dyn Job, needle: &str) {
    assert!(job.status().is_completed());
    assert!(job.has_errors(), "expected errors on {}", job.id());
    let err = job.error().unwrap();
    assert!(
        err.to_string().contains(needle),
        "error {:?} does not contain {:?}",
        err.to_string(),
        needle
    );
}

#[test]
fn test_factory_and_constructor_agree_on_type() {
    let env = Arc::new(MockEnvironment::new());
    let factory = job_factory("simple-migration-generator").unwrap();
    let blank = factory();
    assert_eq!(blank.job_type().name, "simple-migration-generator");

    let built = generator(&env, "simple", 0);
    assert_eq!(built.job_type().name, "simple-migration-generator");
    assert_eq!(built.id(), "simple");
    assert_ne!(blank.id(), built.id());
    assert!(built.generated_ids().is_empty());
    assert_eq!(built.migrations().count(), 0);
}

#[tokio::test]
async fn test_network_error_is_captured() {
    let env = Arc::new(MockEnvironment::new());
    env.set_network_error(Some("injected network error"));
    let mut job = blank_generator(&env);

    job.run(&CancellationToken::new()).await;

    assert_error_contains(&*job, "injected network error");
    assert!(matches!(
        job.error(),
        Some(JobError::DependencyNetworkUnavailable { .. })
    ));
    assert!(job.generated_ids().is_empty());
    assert_eq!(env.mock_session().opened_cursors(), 0);
}

#[tokio::test]
async fn test_session_error_is_captured() {
    let env = Arc::new(MockEnvironment::new());
    env.set_session_error(Some("injected session error"));
    let mut job = blank_generator(&env);

    job.run(&CancellationToken::new()).await;

    assert_error_contains(&*job, "injected session error");
    assert!(matches!(
        job.error(),
        Some(JobError::SessionAcquisitionFailed { .. })
    ));
    assert!(job.generated_ids().is_empty());
    assert!(env.network().is_empty());
}

#[tokio::test]
async fn test_blank_namespace_is_rejected_before_query() {
    let env = Arc::new(MockEnvironment::new());
    let mut job = blank_generator(&env);

    job.run(&CancellationToken::new()).await;

    assert_error_contains(&*job, "database name cannot be empty");
    assert!(matches!(
        job.error(),
        Some(JobError::InvalidNamespace { .. })
    ));
    assert!(job.generated_ids().is_empty());
    assert_eq!(env.mock_session().opened_cursors(), 0);
    assert!(env.network().is_empty());
}

#[tokio::test]
async fn test_close_error_is_captured() {
    let env = Arc::new(MockEnvironment::new());
    env.mock_session().set_query_error(&namespace(), Some("query error"));
    let mut job = generator(&env, "simple", 0);

    job.run(&CancellationToken::new()).await;

    assert_error_contains(&job, "query error");
    assert!(matches!(
        job.error(),
        Some(JobError::QueryIterationFailed { .. })
    ));
    assert_eq!(env.mock_session().opened_cursors(), 1);
    assert_eq!(env.mock_session().closed_cursors(), 1);
}

#[tokio::test]
async fn test_limit_bounds_generated_jobs() {
    let env = Arc::new(MockEnvironment::new());
    env.mock_session()
        .insert(&namespace(), records(&["one", "two", "three", "four"]));
    let mut job = generator(&env, "simple", 3);

    job.run(&CancellationToken::new()).await;

    assert!(job.status().is_completed());
    assert!(!job.has_errors());
    assert_eq!(
        job.generated_ids(),
        ["simple.one.0", "simple.two.1", "simple.three.2"]
    );
    assert_eq!(job.migrations().count(), 3);

    let network = env.network().network();
    assert_eq!(network["simple"].len(), 3);
    for id in job.generated_ids() {
        assert!(network["simple"].contains(id));
    }
    assert_eq!(env.mock_session().closed_cursors(), 1);
}

#[tokio::test]
async fn test_unlimited_run_produces_one_job_per_record() {
    let env = Arc::new(MockEnvironment::new());
    env.mock_session()
        .insert(&namespace(), records(&["a", "b", "c", "d", "e"]));
    let mut job = generator(&env, "all", 0);

    job.run(&CancellationToken::new()).await;

    assert_eq!(job.generated_ids().len(), 5);
    for (idx, id) in job.generated_ids().iter().enumerate() {
        assert!(id.starts_with("all."));
        assert!(id.ends_with(&format!(".{}", idx)));
    }
}

#[tokio::test]
async fn test_jobs_view_is_restartable() {
    let env = Arc::new(MockEnvironment::new());
    env.mock_session()
        .insert(&namespace(), records(&["one", "two", "three"]));
    let mut job = generator(&env, "simple", 0);

    assert_eq!(Generator::jobs(&job).count(), 0);
    job.run(&CancellationToken::new()).await;

    let first: Vec<String> = Generator::jobs(&job).map(|j| j.id().to_string()).collect();
    let second: Vec<String> = Generator::jobs(&job).map(|j| j.id().to_string()).collect();
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(first, job.generated_ids());

    for migration in job.migrations() {
        assert_eq!(migration.job_type().name, "simple-migration");
        assert_eq!(migration.definition().migration, "simple");
        assert_eq!(migration.definition().namespace, namespace());
        assert!(migration.environment().is_some());
    }
}

#[tokio::test]
async fn test_empty_collection_registers_nothing() {
    let env = Arc::new(MockEnvironment::new());
    let mut job = generator(&env, "empty", 0);

    job.run(&CancellationToken::new()).await;

    assert!(job.status().is_completed());
    assert!(!job.has_errors());
    assert!(job.generated_ids().is_empty());
    assert!(env.network().network().get("empty").is_none());
}

#[tokio::test]
async fn test_close_failure_keeps_partial_jobs() {
    let env = Arc::new(MockEnvironment::new());
    env.mock_session().insert(&namespace(), records(&["one", "two"]));
    env.mock_session().set_query_error(&namespace(), Some("cursor killed"));
    let mut job = generator(&env, "partial", 0);

    job.run(&CancellationToken::new()).await;

    assert_error_contains(&job, "cursor killed");
    assert_eq!(job.generated_ids(), ["partial.one.0", "partial.two.1"]);
    assert_eq!(job.migrations().count(), 2);
    assert_eq!(
        env.network().resolve("partial"),
        vec!["partial.one.0".to_string(), "partial.two.1".to_string()]
    );
}

#[tokio::test]
async fn test_malformed_record_stops_generation() {
    let env = Arc::new(MockEnvironment::new());
    let mut bad = record("ignored");
    bad.remove("_id");
    env.mock_session()
        .insert(&namespace(), vec![record("one"), bad, record("three")]);
    let mut job = generator(&env, "malformed", 0);

    job.run(&CancellationToken::new()).await;

    assert!(matches!(
        job.error(),
        Some(JobError::MalformedRecord { position: 1, .. })
    ));
    assert_eq!(job.generated_ids(), ["malformed.one.0"]);
    assert_eq!(env.mock_session().closed_cursors(), 1);
    assert_eq!(env.network().resolve("malformed").len(), 1);
}

#[tokio::test]
async fn test_cancelled_before_run() {
    let env = Arc::new(MockEnvironment::new());
    env.mock_session().insert(&namespace(), records(&["one"]));
    let mut job = generator(&env, "cancelled", 0);
    let cancel = CancellationToken::new();
    cancel.cancel();

    job.run(&cancel).await;

    assert!(job.status().is_completed());
    assert!(matches!(job.error(), Some(JobError::Cancelled { .. })));
    assert!(job.generated_ids().is_empty());
    assert_eq!(env.mock_session().opened_cursors(), 0);
}

#[tokio::test]
async fn test_cancelled_mid_iteration_closes_cursor() {
    let env = Arc::new(MockEnvironment::new());
    env.mock_session().insert(&namespace(), records(&["one", "two"]));
    env.mock_session().set_stall(&namespace(), true);
    let mut job = generator(&env, "stalled", 0);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    job.run(&cancel).await;

    assert_eq!(
        job.error(),
        Some(JobError::Cancelled {
            stage: "iteration".to_string()
        })
    );
    assert_eq!(job.generated_ids().len(), 2);
    assert_eq!(env.mock_session().closed_cursors(), 1);
    assert_eq!(env.network().resolve("stalled").len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_generators_register_complete_groups() {
    let env = Arc::new(MockEnvironment::new());
    env.mock_session().insert(
        &namespace(),
        (0..40).map(|i| record(&format!("doc{}", i))).collect(),
    );

    let handles: Vec<_> = (0..8)
        .map(|g| {
            let mut job = generator(&env, &format!("gen{}", g), 10 + g);
            tokio::spawn(async move {
                job.run(&CancellationToken::new()).await;
                job
            })
        })
        .collect();

    let mut jobs = Vec::new();
    for handle in handles {
        jobs.push(handle.await.unwrap());
    }

    let network = env.network().network();
    assert_eq!(network.len(), 8);
    for job in &jobs {
        assert!(!job.has_errors());
        let group = &network[job.id()];
        assert_eq!(group.len(), job.generated_ids().len());
        assert!(job.generated_ids().iter().all(|id| group.contains(id)));
    }
}

#[tokio::test]
async fn test_completed_generator_round_trips_through_json() {
    let env = Arc::new(MockEnvironment::new());
    env.mock_session().insert(&namespace(), records(&["one", "two"]));
    let mut job = generator(&env, "persisted", 0);
    job.run(&CancellationToken::new()).await;

    let encoded = serde_json::to_string(&job).unwrap();
    let mut decoded: SimpleMigrationGenerator = serde_json::from_str(&encoded).unwrap();

    assert_eq!(decoded.id(), "persisted");
    assert_eq!(decoded.generated_ids(), job.generated_ids());
    assert!(decoded.status().is_completed());
    assert!(decoded.migrations().all(|m| m.environment().is_none()));

    decoded.set_environment(env.clone());
    assert!(decoded.migrations().all(|m| m.environment().is_some()));
}
