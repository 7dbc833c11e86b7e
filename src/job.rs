//! Job abstraction shared by generators and per-record migrations.

use crate::error::JobError;
use crate::status::Status;
use serde::Serialize;
use std::any::Any;

pub mod registry;

pub use registry::{job_factory, JobFactory, JobRegistry};

/// Stable identity of a job implementation, used for dispatch by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct JobType {
    pub name: &'static str,
    pub version: u32,
}

pub trait Job: Any + Send + Sync {
    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn job_type(&self) -> JobType;

    fn status(&self) -> &Status;

    fn has_errors(&self) -> bool {
        self.status().has_errors()
    }

    fn error(&self) -> Option<JobError> {
        self.status().error()
    }

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Recover the concrete type of a job built by a registry factory.
pub fn downcast<T: Job>(job: Box<dyn Job>) -> Option<Box<T>> {
    job.into_any().downcast::<T>().ok()
}
