//! Integration tests for the job type registry

use docmigrate::error::ApiError;
use docmigrate::job::registry::{global, JobRegistry};
use docmigrate::job::{downcast, Job};
use docmigrate::migration::SimpleMigrationJob;
use docmigrate::SimpleMigrationGenerator;

#[derive(Default)]
struct NoopJob {
    id: String,
    status: docmigrate::status::Status,
}

impl Job for NoopJob {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn job_type(&self) -> docmigrate::job::JobType {
        docmigrate::job::JobType {
            name: "noop",
            version: 1,
        }
    }

    fn status(&self) -> &docmigrate::status::Status {
        &self.status
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
        self
    }
}

fn noop_factory() -> Box<dyn Job> {
    Box::new(NoopJob::default())
}

#[test]
fn test_global_registry_holds_builtin_types() {
    let registry = global().read();
    assert!(registry.contains(SimpleMigrationGenerator::TYPE_NAME));
    assert!(registry.contains(SimpleMigrationJob::TYPE_NAME));
}

#[test]
fn test_custom_job_type_registration() {
    let mut registry = JobRegistry::with_builtin_jobs();
    registry.register("noop", noop_factory).unwrap();

    let job = registry.factory("noop").unwrap()();
    assert_eq!(job.job_type().name, "noop");
    assert!(job.as_any().is::<NoopJob>());
    assert!(downcast::<NoopJob>(job).is_some());

    assert!(matches!(
        registry.register("noop", noop_factory),
        Err(ApiError::DuplicateJobType(_))
    ));
}

#[test]
fn test_factories_never_share_state() {
    let registry = JobRegistry::with_builtin_jobs();
    let factory = registry.factory(SimpleMigrationJob::TYPE_NAME).unwrap();

    let mut first = factory();
    let second = factory();
    first.set_id("first".to_string());

    assert_eq!(first.id(), "first");
    assert_eq!(second.id(), "");
}
