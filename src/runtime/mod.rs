//! Task scheduling subsystem.
//!
//! # Data Flow
//! ```text
//! spawn(name, future)
//!     → task.rs (TaskCell + Tracked wrapper: Created)
//!     → scheduler.rs (tokio ready queue; I/O and timer drivers wake tasks)
//!     → TaskHandle (state, abort, await output)
//!
//! blocking.rs: the same jobs run back to back on one thread
//! ```
//!
//! # Design Decisions
//! - Suspension only at `.await` (socket readiness, timer expiry)
//! - No preemption: a task runs until it suspends or completes
//! - Cancellation drops the future; its state becomes `Cancelled`

pub mod blocking;
pub mod scheduler;
pub mod task;

pub use blocking::{BlockingScheduler, Finished};
pub use scheduler::{sleep, spawn, Scheduler, SchedulerHandle, TaskError, TaskHandle};
pub use task::{TaskId, TaskState};
