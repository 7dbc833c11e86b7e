//! Migration job generators.
//!
//! A generator scans a namespace, produces one job per matching record, and
//! publishes the ids of those jobs as a single group in the dependency
//! network under its own id.

use crate::job::Job;
use crate::store::Environment;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod id;
mod simple;

pub use id::derive_job_id;
pub use simple::SimpleMigrationGenerator;

#[async_trait]
pub trait Generator: Job {
    /// Run the generation pipeline once.
    ///
    /// Never fails at the call boundary: the outcome is recorded in the status
    /// and read back through `has_errors` / `error`.
    async fn run(&mut self, cancel: &CancellationToken);

    fn generated_ids(&self) -> &[String];

    /// Produced jobs in stream order. Restartable; empty before `run`.
    fn jobs(&self) -> Box<dyn Iterator<Item = &dyn Job> + '_>;

    fn set_environment(&mut self, env: Arc<dyn Environment>);
}
