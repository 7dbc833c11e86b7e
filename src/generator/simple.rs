//! Generator producing one `SimpleMigrationJob` per matching record.

use crate::error::JobError;
use crate::generator::{derive_job_id, Generator};
use crate::job::{Job, JobType};
use crate::migration::{natural_key, SimpleMigration, SimpleMigrationJob};
use crate::network::DependencyNetwork;
use crate::status::Status;
use crate::store::{Environment, RecordIterator};
use crate::types::{Document, GeneratorOptions, Namespace};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const STAGE_NETWORK: &str = "dependency network acquisition";
const STAGE_SESSION: &str = "session acquisition";
const STAGE_QUERY: &str = "query";
const STAGE_ITERATION: &str = "iteration";

#[derive(Default, Serialize, Deserialize)]
pub struct SimpleMigrationGenerator {
    id: String,
    options: GeneratorOptions,
    /// Update document applied by every produced migration
    #[serde(default)]
    update: Document,
    #[serde(default)]
    ids: Vec<String>,
    #[serde(default)]
    migrations: Vec<SimpleMigrationJob>,
    #[serde(default)]
    status: Status,
    #[serde(skip)]
    env: Option<Arc<dyn Environment>>,
}

impl SimpleMigrationGenerator {
    pub const TYPE_NAME: &'static str = "simple-migration-generator";

    /// Build a generator bound to `env`; its id is `options.job_id`.
    pub fn new(env: Arc<dyn Environment>, options: GeneratorOptions, update: Document) -> Self {
        Self {
            id: options.job_id.clone(),
            options,
            update,
            ids: Vec::new(),
            migrations: Vec::new(),
            status: Status::new(),
            env: Some(env),
        }
    }

    pub(crate) fn factory() -> Box<dyn Job> {
        Box::new(Self::default())
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn namespace(&self) -> &Namespace {
        &self.options.namespace
    }

    pub fn migrations(&self) -> std::slice::Iter<'_, SimpleMigrationJob> {
        self.migrations.iter()
    }

    /// Drain `iter` into jobs, appending to this generator's lists.
    ///
    /// Stops at the end of the stream or once the limit is reached. Jobs built
    /// before a failure stay in place. The caller still owns `iter` and must
    /// close it.
    pub async fn generate_jobs(
        &mut self,
        env: &Arc<dyn Environment>,
        iter: &mut dyn RecordIterator,
        cancel: &CancellationToken,
    ) -> Result<&[String], JobError> {
        let start = self.ids.len();
        let mut position = start;

        while !self.options.limit_reached(self.ids.len()) {
            let Some(record) = until_cancelled(cancel, STAGE_ITERATION, iter.next()).await? else {
                break;
            };

            let key = natural_key(&record, position)?;
            let definition = SimpleMigration::from_record(
                &record,
                position,
                &self.id,
                &self.options.namespace,
                &self.update,
            )?;
            let id = derive_job_id(&self.id, &key, position);
            let mut job = SimpleMigrationJob::new(Arc::clone(env), definition);
            job.set_id(id.clone());

            self.ids.push(id);
            self.migrations.push(job);
            position += 1;
        }

        if let Some(err) = iter.err() {
            debug!(job_id = %self.id, error = %err, "Iterator reported an error before close");
        }
        debug!(
            job_id = %self.id,
            generated = self.ids.len() - start,
            "Drained query iterator"
        );
        Ok(&self.ids[start..])
    }

    async fn generate(&mut self, cancel: &CancellationToken) -> Result<(), JobError> {
        let env = self.env.clone().ok_or_else(|| JobError::EnvironmentMissing {
            job_id: self.id.clone(),
        })?;

        let network = until_cancelled(cancel, STAGE_NETWORK, env.dependency_network())
            .await?
            .map_err(|e| JobError::DependencyNetworkUnavailable {
                message: e.to_string(),
            })?;
        debug!(job_id = %self.id, "Acquired dependency network");

        let session = until_cancelled(cancel, STAGE_SESSION, env.session())
            .await?
            .map_err(|e| JobError::SessionAcquisitionFailed {
                message: e.to_string(),
            })?;
        debug!(job_id = %self.id, "Acquired session");

        self.options
            .namespace
            .validate()
            .map_err(|e| JobError::InvalidNamespace {
                namespace: self.options.namespace.to_string(),
                message: e.to_string(),
            })?;

        let collection = session.collection(&self.options.namespace);
        let mut iter = until_cancelled(
            cancel,
            STAGE_QUERY,
            collection.find(&self.options.query, self.options.limit),
        )
        .await?;

        let drained = self
            .generate_jobs(&env, iter.as_mut(), cancel)
            .await
            .map(|ids| ids.len());
        let closed = iter.close().await;
        drop(iter);
        drop(collection);
        drop(session);

        if let Err(err) = drained {
            self.capture(err);
        }
        if let Err(err) = closed {
            self.capture(JobError::QueryIterationFailed {
                namespace: self.options.namespace.to_string(),
                message: err.to_string(),
            });
        }

        self.register(network.as_ref())
    }

    fn register(&self, network: &dyn DependencyNetwork) -> Result<(), JobError> {
        if self.ids.is_empty() {
            return Ok(());
        }
        network
            .add_group(&self.id, &self.ids)
            .map_err(|e| JobError::RegistrationFailed {
                owner: self.id.clone(),
                message: e.to_string(),
            })?;
        debug!(job_id = %self.id, members = self.ids.len(), "Registered dependency group");
        Ok(())
    }

    fn capture(&mut self, err: JobError) {
        warn!(job_id = %self.id, error = %err, "Migration job generation error");
        self.status.add_error(err);
    }
}

/// Await `fut` unless `cancel` fires first.
async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    stage: &str,
    fut: F,
) -> Result<F::Output, JobError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(JobError::Cancelled { stage: stage.to_string() }),
        out = fut => Ok(out),
    }
}

impl fmt::Debug for SimpleMigrationGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleMigrationGenerator")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("generated", &self.ids.len())
            .field("status", &self.status)
            .field("has_env", &self.env.is_some())
            .finish()
    }
}

impl Job for SimpleMigrationGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn job_type(&self) -> JobType {
        JobType {
            name: Self::TYPE_NAME,
            version: 0,
        }
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[async_trait]
impl Generator for SimpleMigrationGenerator {
    async fn run(&mut self, cancel: &CancellationToken) {
        if self.status.is_completed() {
            warn!(job_id = %self.id, "Generator already completed, ignoring run");
            return;
        }

        info!(
            job_id = %self.id,
            namespace = %self.options.namespace,
            limit = self.options.limit,
            "Generating migration jobs"
        );

        if let Err(err) = self.generate(cancel).await {
            self.capture(err);
        }
        self.status.mark_completed();

        info!(
            job_id = %self.id,
            generated = self.ids.len(),
            errors = self.status.errors().len(),
            "Migration job generation finished"
        );
    }

    fn generated_ids(&self) -> &[String] {
        &self.ids
    }

    fn jobs(&self) -> Box<dyn Iterator<Item = &dyn Job> + '_> {
        Box::new(self.migrations.iter().map(|job| job as &dyn Job))
    }

    fn set_environment(&mut self, env: Arc<dyn Environment>) {
        for job in &mut self.migrations {
            job.set_environment(Arc::clone(&env));
        }
        self.env = Some(env);
    }
}
