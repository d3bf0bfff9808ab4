//! Asynchronous job handles returned by batched mutations.

use serde::{Deserialize, Serialize};

use super::id::JobId;

/// Completion token for a platform-side background job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: JobId,
    pub done: bool,
}
