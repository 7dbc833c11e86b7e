//! Completion and error tracking shared by every job type.
//!
//! Jobs hold a `Status` field and forward to it. The only transition is
//! `Running -> Completed`, and completion says nothing about success: check
//! `has_errors` for that.

use crate::error::JobError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    errors: Vec<JobError>,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Monotonic; calling it again is a no-op.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub fn add_error(&mut self, error: JobError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[JobError] {
        &self.errors
    }

    /// The captured failure, if any.
    ///
    /// With several errors the result is an `Aggregate` whose message starts
    /// with the first cause, in capture order.
    pub fn error(&self) -> Option<JobError> {
        match self.errors.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            many => Some(JobError::Aggregate {
                count: many.len(),
                messages: many
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            }),
        }
    }
}
