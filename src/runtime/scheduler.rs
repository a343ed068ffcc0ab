//! Cooperative M:N scheduler built on tokio.
//!
//! # Responsibilities
//! - Build the runtime the configuration asks for (worker pool or
//!   current thread), with I/O and timer drivers enabled
//! - Spawn named, state-tracked tasks
//! - Expose the timer facility
//!
//! # Design Decisions
//! - Tasks only yield at `.await` points: socket readiness and timers.
//!   Nothing spawned here may block a worker thread
//! - Completion order follows event arrival, not spawn order

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::{JoinError, JoinHandle};

use crate::config::{RuntimeConfig, RuntimeFlavor};
use crate::runtime::task::{TaskCell, TaskId, TaskState, Tracked};

/// Why awaiting a task did not yield its output.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task '{0}' was cancelled")]
    Cancelled(String),

    #[error("task '{0}' panicked")]
    Panicked(String),
}

/// Owns the runtime that drives every task.
#[derive(Debug)]
pub struct Scheduler {
    runtime: Runtime,
}

impl Scheduler {
    /// Build a runtime from configuration.
    pub fn new(config: &RuntimeConfig) -> std::io::Result<Self> {
        let mut builder = match config.flavor {
            RuntimeFlavor::CurrentThread => Builder::new_current_thread(),
            RuntimeFlavor::MultiThread => {
                let mut builder = Builder::new_multi_thread();
                if let Some(workers) = config.worker_threads {
                    builder.worker_threads(workers);
                }
                builder
            }
        };
        let runtime = builder
            .enable_all()
            .thread_name(config.thread_name.clone())
            .build()?;

        tracing::debug!(
            flavor = ?config.flavor,
            worker_threads = ?config.worker_threads,
            "Scheduler runtime built"
        );
        Ok(Self { runtime })
    }

    /// Drive `future` to completion on the calling thread.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: self.runtime.handle().clone(),
        }
    }

    /// Stop the runtime, giving tasks `grace` to finish before they are
    /// dropped.
    pub fn shutdown(self, grace: Duration) {
        self.runtime.shutdown_timeout(grace);
    }
}

/// Cloneable spawner bound to a specific runtime.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    inner: Handle,
}

impl SchedulerHandle {
    /// Handle of the runtime the caller is running on, if any.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(|inner| Self { inner })
    }

    pub fn spawn<F>(&self, name: &str, future: F) -> TaskHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let cell = TaskCell::new(name);
        let join = self.inner.spawn(Tracked::new(future, Arc::clone(&cell)));
        tracing::trace!(task_id = %cell.id(), task = name, "Task spawned");
        TaskHandle { join, cell }
    }
}

/// Spawn a named task on the current runtime.
///
/// # Panics
///
/// Panics when called outside a runtime, like `tokio::spawn`.
pub fn spawn<F>(name: &str, future: F) -> TaskHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let cell = TaskCell::new(name);
    let join = tokio::spawn(Tracked::new(future, Arc::clone(&cell)));
    tracing::trace!(task_id = %cell.id(), task = name, "Task spawned");
    TaskHandle { join, cell }
}

/// Suspend the current task for `duration`.
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await
}

/// Owned handle to a spawned task. Awaiting it yields the task's output.
///
/// Dropping the handle detaches the task; it keeps running.
#[derive(Debug)]
pub struct TaskHandle<T> {
    join: JoinHandle<T>,
    cell: Arc<TaskCell>,
}

impl<T> TaskHandle<T> {
    pub fn id(&self) -> TaskId {
        self.cell.id()
    }

    pub fn name(&self) -> &str {
        self.cell.name()
    }

    pub fn state(&self) -> TaskState {
        self.cell.state()
    }

    /// Number of times the scheduler has polled the task.
    pub fn polls(&self) -> u64 {
        self.cell.polls()
    }

    /// Cancel the task at its next suspension point.
    pub fn abort(&self) {
        self.join.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    fn map_join_error(&self, err: JoinError) -> TaskError {
        if err.is_panic() {
            TaskError::Panicked(self.cell.name().to_string())
        } else {
            TaskError::Cancelled(self.cell.name().to_string())
        }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.join).poll(cx) {
            Poll::Ready(Ok(output)) => Poll::Ready(Ok(output)),
            Poll::Ready(Err(err)) => Poll::Ready(Err(self.map_join_error(err))),
            Poll::Pending => Poll::Pending,
        }
    }
}
