//! Strictly blocking execution model, for comparison with the scheduler.
//!
//! Each job runs to completion on the calling thread before the next one
//! starts, the way a blocking call occupies its OS thread. Completion order
//! is therefore always start order, whatever each job waits on.

use std::time::{Duration, Instant};

/// Outcome of one blocking job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished<T> {
    pub name: String,
    pub output: T,
    pub elapsed: Duration,
}

type Job<T> = Box<dyn FnOnce() -> T + Send>;

/// Runs queued jobs one after another.
pub struct BlockingScheduler<T> {
    jobs: Vec<(String, Job<T>)>,
}

impl<T> BlockingScheduler<T> {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Queue a job. Nothing runs until [`run`](Self::run).
    pub fn spawn<F>(&mut self, name: &str, job: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.jobs.push((name.to_string(), Box::new(job)));
    }

    /// Run every job in spawn order, returning them in completion order.
    pub fn run(self) -> Vec<Finished<T>> {
        self.jobs
            .into_iter()
            .map(|(name, job)| {
                let started = Instant::now();
                let output = job();
                let elapsed = started.elapsed();
                tracing::debug!(task = %name, elapsed = ?elapsed, "Blocking job finished");
                Finished {
                    name,
                    output,
                    elapsed,
                }
            })
            .collect()
    }
}

impl<T> Default for BlockingScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_in_spawn_order() {
        let mut scheduler = BlockingScheduler::new();
        scheduler.spawn("a", || 1);
        scheduler.spawn("b", || 2);
        let done = scheduler.run();
        let names: Vec<_> = done.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(done[1].output, 2);
    }

    #[test]
    fn empty_scheduler_finishes_nothing() {
        assert!(BlockingScheduler::<()>::default().run().is_empty());
    }
}
