//! docmigrate: migration job generation for document stores
//!
//! Scans a collection, produces one schedulable migration job per matching
//! record with a deterministic id, and publishes the batch as a named group
//! in a shared dependency network for an external scheduler to order.

pub mod config;
pub mod error;
pub mod generator;
pub mod job;
pub mod logging;
pub mod migration;
pub mod mock;
pub mod network;
pub mod status;
pub mod store;
pub mod types;

pub use error::{ApiError, JobError, StoreError};
pub use generator::{Generator, SimpleMigrationGenerator};
pub use job::Job;
pub use types::{Document, GeneratorOptions, Namespace};
