//! Job type registry: stable type name -> blank constructor.
//!
//! Populated by explicit `register` calls. The process-wide instance starts
//! with the built-in job types and is created on first access.

use crate::error::ApiError;
use crate::generator::SimpleMigrationGenerator;
use crate::job::Job;
use crate::migration::SimpleMigrationJob;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Builds a blank job with no environment attached.
pub type JobFactory = fn() -> Box<dyn Job>;

#[derive(Debug, Default)]
pub struct JobRegistry {
    factories: HashMap<&'static str, JobFactory>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every job type this crate defines
    pub fn with_builtin_jobs() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(
            SimpleMigrationGenerator::TYPE_NAME,
            SimpleMigrationGenerator::factory,
        );
        registry
            .factories
            .insert(SimpleMigrationJob::TYPE_NAME, SimpleMigrationJob::factory);
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: JobFactory) -> Result<(), ApiError> {
        if self.factories.contains_key(name) {
            return Err(ApiError::DuplicateJobType(name.to_string()));
        }
        debug!(job_type = name, "Registered job type");
        self.factories.insert(name, factory);
        Ok(())
    }

    pub fn factory(&self, name: &str) -> Result<JobFactory, ApiError> {
        self.factories
            .get(name)
            .copied()
            .ok_or_else(|| ApiError::UnknownJobType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

static GLOBAL: OnceLock<RwLock<JobRegistry>> = OnceLock::new();

/// Process-wide registry
pub fn global() -> &'static RwLock<JobRegistry> {
    GLOBAL.get_or_init(|| RwLock::new(JobRegistry::with_builtin_jobs()))
}

/// Look up a factory in the process-wide registry.
pub fn job_factory(name: &str) -> Result<JobFactory, ApiError> {
    global().read().factory(name)
}
