//! Task identity and lifecycle state.
//!
//! Every spawned future is wrapped in [`Tracked`], which records its state
//! around each poll and intercepts wake-ups:
//!
//! ```text
//! Created ──poll──▶ Runnable ──Pending──▶ Suspended
//!                      ▲                      │
//!                      └────────wake──────────┘
//! Runnable ──Ready──▶ Completed
//! any ──dropped before Ready──▶ Cancelled
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::task::{waker, ArcWake};

static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a spawned task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        Self(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Where a task is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    /// Spawned, not yet polled.
    Created = 0,
    /// Being polled, or woken and waiting in the ready queue.
    Runnable = 1,
    /// Waiting on an external event (I/O readiness, timer).
    Suspended = 2,
    /// Ran to completion.
    Completed = 3,
    /// Dropped before completion: aborted, panicked or runtime shut down.
    Cancelled = 4,
}

impl TaskState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => TaskState::Created,
            1 => TaskState::Runnable,
            2 => TaskState::Suspended,
            3 => TaskState::Completed,
            _ => TaskState::Cancelled,
        }
    }

    /// Completed or cancelled.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Cancelled)
    }
}

/// State shared between a running task and its handle.
#[derive(Debug)]
pub(crate) struct TaskCell {
    id: TaskId,
    name: String,
    state: AtomicU8,
    /// Set by a wake that arrives while the task is being polled.
    notified: AtomicBool,
    polls: AtomicU64,
}

impl TaskCell {
    pub(crate) fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            id: TaskId::next(),
            name: name.to_string(),
            state: AtomicU8::new(TaskState::Created as u8),
            notified: AtomicBool::new(false),
            polls: AtomicU64::new(0),
        })
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn polls(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    fn set(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn transition(&self, from: TaskState, to: TaskState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Wraps the runtime's waker so a wake marks the task runnable first.
struct StateWaker {
    cell: Arc<TaskCell>,
    inner: std::task::Waker,
}

impl ArcWake for StateWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.cell.notified.store(true, Ordering::Release);
        arc_self
            .cell
            .transition(TaskState::Suspended, TaskState::Runnable);
        arc_self.inner.wake_by_ref();
    }
}

/// Future adapter that keeps a [`TaskCell`] up to date.
pub(crate) struct Tracked<F> {
    inner: Pin<Box<F>>,
    cell: Arc<TaskCell>,
    finished: bool,
}

impl<F: Future> Tracked<F> {
    pub(crate) fn new(future: F, cell: Arc<TaskCell>) -> Self {
        Self {
            inner: Box::pin(future),
            cell,
            finished: false,
        }
    }
}

impl<F: Future> Future for Tracked<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<F::Output> {
        let this = self.get_mut();
        let cell = &this.cell;
        cell.notified.store(false, Ordering::Release);
        cell.set(TaskState::Runnable);
        cell.polls.fetch_add(1, Ordering::Relaxed);

        let waker = waker(Arc::new(StateWaker {
            cell: Arc::clone(cell),
            inner: cx.waker().clone(),
        }));
        let mut tracked_cx = Context::from_waker(&waker);

        match this.inner.as_mut().poll(&mut tracked_cx) {
            Poll::Ready(output) => {
                this.finished = true;
                cell.set(TaskState::Completed);
                Poll::Ready(output)
            }
            Poll::Pending => {
                cell.transition(TaskState::Runnable, TaskState::Suspended);
                // A wake that raced with this poll leaves the task queued
                if cell.notified.swap(false, Ordering::AcqRel) {
                    cell.transition(TaskState::Suspended, TaskState::Runnable);
                }
                Poll::Pending
            }
        }
    }
}

impl<F> Drop for Tracked<F> {
    fn drop(&mut self) {
        if !self.finished {
            self.cell.set(TaskState::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn ids_are_unique() {
        assert_ne!(TaskCell::new("a").id(), TaskCell::new("b").id());
    }

    #[test]
    fn dropped_before_poll_is_cancelled() {
        let cell = TaskCell::new("never-polled");
        let tracked = Tracked::new(async {}, Arc::clone(&cell));
        assert_eq!(cell.state(), TaskState::Created);
        drop(tracked);
        assert_eq!(cell.state(), TaskState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn walks_through_suspension() {
        let cell = TaskCell::new("sleeper");
        let mut tracked = Tracked::new(
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                42
            },
            Arc::clone(&cell),
        );

        let first = futures_util::poll!(&mut tracked);
        assert!(first.is_pending());
        assert_eq!(cell.state(), TaskState::Suspended);

        assert_eq!((&mut tracked).await, 42);
        assert_eq!(cell.state(), TaskState::Completed);
        assert!(cell.polls() >= 2);
        assert!(cell.state().is_terminal());
    }
}
