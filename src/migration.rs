//! Per-record migration jobs.
//!
//! A `SimpleMigrationJob` pairs one record's migration definition with the
//! shared environment. Building one never touches the dataset; executing it
//! is left to the worker pool that later picks it up.

use crate::error::JobError;
use crate::job::{Job, JobType};
use crate::status::Status;
use crate::store::Environment;
use crate::types::{Document, Namespace};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Field holding a record's identity.
pub const RECORD_ID_FIELD: &str = "_id";

/// Migration definition scoped to a single record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleMigration {
    /// Id of the record to update
    pub id: Value,
    /// Name of the migration (the generator id) this record belongs to
    pub migration: String,
    #[serde(rename = "ns")]
    pub namespace: Namespace,
    /// Update document applied to the record
    pub update: Document,
}

impl SimpleMigration {
    /// Build the definition for `record`, the record at `position` in the stream.
    ///
    /// Fails only when the record carries no usable id.
    pub fn from_record(
        record: &Document,
        position: usize,
        migration: &str,
        namespace: &Namespace,
        update: &Document,
    ) -> Result<Self, JobError> {
        let id = record
            .get(RECORD_ID_FIELD)
            .cloned()
            .ok_or_else(|| JobError::MalformedRecord {
                position,
                message: format!("record has no '{}' field", RECORD_ID_FIELD),
            })?;
        Ok(Self {
            id,
            migration: migration.to_string(),
            namespace: namespace.clone(),
            update: update.clone(),
        })
    }
}

/// Render a record's `_id` as the natural key used in job ids.
///
/// Strings are used verbatim, numbers and booleans by their JSON text, and
/// extended-JSON object ids (`{"$oid": "..."}`) by their hex string.
pub fn natural_key(record: &Document, position: usize) -> Result<String, JobError> {
    let malformed = |message: String| JobError::MalformedRecord { position, message };
    match record.get(RECORD_ID_FIELD) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Object(obj)) => match obj.get("$oid") {
            Some(Value::String(oid)) if !oid.is_empty() => Ok(oid.clone()),
            _ => Err(malformed(format!(
                "unsupported '{}' document: {}",
                RECORD_ID_FIELD,
                Value::Object(obj.clone())
            ))),
        },
        Some(other) => Err(malformed(format!(
            "unsupported '{}' value: {}",
            RECORD_ID_FIELD, other
        ))),
        None => Err(malformed(format!("record has no '{}' field", RECORD_ID_FIELD))),
    }
}

#[derive(Default, Serialize, Deserialize)]
pub struct SimpleMigrationJob {
    id: String,
    definition: SimpleMigration,
    #[serde(default)]
    status: Status,
    #[serde(skip)]
    env: Option<Arc<dyn Environment>>,
}

impl SimpleMigrationJob {
    pub const TYPE_NAME: &'static str = "simple-migration";

    pub fn new(env: Arc<dyn Environment>, definition: SimpleMigration) -> Self {
        let id = format!(
            "{}.{}.{}",
            Self::TYPE_NAME,
            definition.migration,
            display_id(&definition.id)
        );
        Self {
            id,
            definition,
            status: Status::new(),
            env: Some(env),
        }
    }

    pub(crate) fn factory() -> Box<dyn Job> {
        Box::new(Self::default())
    }

    pub fn definition(&self) -> &SimpleMigration {
        &self.definition
    }

    pub fn environment(&self) -> Option<&Arc<dyn Environment>> {
        self.env.as_ref()
    }

    pub fn set_environment(&mut self, env: Arc<dyn Environment>) {
        self.env = Some(env);
    }
}

fn display_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Debug for SimpleMigrationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleMigrationJob")
            .field("id", &self.id)
            .field("definition", &self.definition)
            .field("status", &self.status)
            .field("has_env", &self.env.is_some())
            .finish()
    }
}

impl Job for SimpleMigrationJob {
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
