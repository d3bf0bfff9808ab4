//! Bounded polling of asynchronous job handles.

use std::time::Duration;

use tokio::time::{self, Instant};

use outlet_sync_core::{JobHandle, JobId};

use crate::gateway::CatalogGateway;

/// What happened to each handle after a wait.
#[derive(Debug, Default)]
pub struct JobWaitReport {
    pub completed: Vec<JobId>,
    /// Handles still pending when the wait budget ran out. Not an error:
    /// the platform keeps running them, the engine just stops watching.
    pub timed_out: Vec<JobId>,
}

/// Polls job handles at a fixed interval until they finish or the wait
/// budget is spent.
#[derive(Debug, Clone)]
pub struct AsyncJobPoller {
    interval: Duration,
    max_wait: Duration,
}

impl Default for AsyncJobPoller {
    fn default() -> Self {
        Self { interval: Duration::from_secs(2), max_wait: Duration::from_secs(60) }
    }
}

impl AsyncJobPoller {
    #[must_use]
    pub const fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    /// Await a set of handles. A failed poll drops its handle so one broken
    /// job cannot stall the loop.
    pub async fn wait<G: CatalogGateway>(
        &self,
        gateway: &G,
        handles: Vec<JobHandle>,
    ) -> JobWaitReport {
        let mut report = JobWaitReport::default();
        let mut pending: Vec<JobId> = Vec::new();
        for handle in handles {
            if handle.done {
                report.completed.push(handle.id);
            } else {
                pending.push(handle.id);
            }
        }

        let started = Instant::now();
        while !pending.is_empty() && started.elapsed() < self.max_wait {
            time::sleep(self.interval).await;
            let mut still_pending = Vec::with_capacity(pending.len());
            for id in pending {
                match gateway.job_status(&id).await {
                    Ok(Some(job)) if job.done => {
                        tracing::debug!(job_id = %id, "job completed");
                        report.completed.push(id);
                    }
                    Ok(_) => still_pending.push(id),
                    Err(err) => {
                        tracing::warn!(job_id = %id, error = %err, "job poll failed, dropping handle");
                    }
                }
            }
            pending = still_pending;
        }

        if !pending.is_empty() {
            tracing::warn!(pending = pending.len(), "jobs still pending after the wait budget");
        }
        report.timed_out = pending;
        report
    }
}
