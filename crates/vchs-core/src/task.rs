// ── Task tracking ──
//
// Polls a remote task on a fixed interval until it is `success` or `error`.
// Each call site passes its own `PollPolicy`: bounded waits give up after
// `max_attempts` fetches, unbounded waits only stop on a terminal status or
// on cancellation.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use vchs_api::VcloudClient;
use vchs_api::types::{Task, TaskStatus};

use crate::error::{CoreError, TaskFailure};

/// Anything that can hand out fresh task snapshots.
pub trait TaskSource {
    fn fetch_task(&self, href: &str) -> impl Future<Output = Result<Task, CoreError>> + Send;
}

impl TaskSource for VcloudClient {
    async fn fetch_task(&self, href: &str) -> Result<Task, CoreError> {
        Ok(self.get_task(href).await?)
    }
}

/// How long to keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between two fetches.
    pub interval: Duration,
    /// `None` polls until the task is terminal.
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }
}

/// Waits for tasks against one source under one policy.
pub struct TaskTracker<'s, S> {
    source: &'s S,
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl<'s, S: TaskSource + Sync> TaskTracker<'s, S> {
    pub fn new(source: &'s S, policy: PollPolicy, cancel: CancellationToken) -> Self {
        Self {
            source,
            policy,
            cancel,
        }
    }

    /// Poll `task` until it is terminal and return the final snapshot.
    ///
    /// `Error` status becomes [`CoreError::TaskFailed`]; running out of
    /// attempts becomes [`CoreError::PolicyExhausted`]; cancellation during
    /// the sleep becomes [`CoreError::Interrupted`].
    pub async fn await_completion(&self, mut task: Task) -> Result<Task, CoreError> {
        let mut polls: u32 = 0;

        while !task.is_terminal() {
            if let Some(max) = self.policy.max_attempts {
                if polls >= max {
                    let failure = TaskFailure::from(&task);
                    error!(
                        href = %failure.href,
                        operation = ?failure.operation,
                        description = ?failure.description,
                        message = ?failure.message,
                        code = ?failure.code,
                        stack_trace = ?failure.stack_trace,
                        "task still running after {polls} polls"
                    );
                    return Err(CoreError::PolicyExhausted {
                        attempts: polls,
                        failure: Box::new(failure),
                    });
                }
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    return Err(CoreError::Interrupted { href: task.href });
                }
                () = tokio::time::sleep(self.policy.interval) => {}
            }

            task = self.source.fetch_task(&task.href).await?;
            polls += 1;
            debug!(
                href = %task.href,
                status = task.status.as_deref().unwrap_or("<none>"),
                polls,
                "polled task"
            );
        }

        match task.task_status() {
            Some(TaskStatus::Error) => {
                let failure = TaskFailure::from(&task);
                error!(
                    href = %failure.href,
                    operation = ?failure.operation,
                    description = ?failure.description,
                    details = ?failure.details,
                    message = ?failure.message,
                    code = ?failure.code,
                    stack_trace = ?failure.stack_trace,
                    "task failed"
                );
                Err(CoreError::TaskFailed(Box::new(failure)))
            }
            _ => Ok(task),
        }
    }

    /// Wait for each task in turn. The first failure is returned at once and
    /// later tasks are not polled.
    pub async fn await_all(&self, tasks: Vec<Task>) -> Result<Vec<Task>, CoreError> {
        let mut done = Vec::with_capacity(tasks.len());
        for task in tasks {
            done.push(self.await_completion(task).await?);
        }
        Ok(done)
    }
}
