//! Cooperative scheduling: completion order follows readiness, not spawn order.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use netcore::runtime::{self, BlockingScheduler, TaskError};

#[tokio::test(start_paused = true)]
async fn shorter_sleep_finishes_first() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let started = tokio::time::Instant::now();

    let handles: Vec<_> = [("five", 5), ("three", 3)]
        .into_iter()
        .map(|(name, secs)| {
            let order = Arc::clone(&order);
            runtime::spawn(name, async move {
                runtime::sleep(Duration::from_secs(secs)).await;
                order.lock().unwrap().push(name);
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*order.lock().unwrap(), vec!["three", "five"]);
    // Both ran concurrently: total is the longest sleep, not the sum.
    assert!(started.elapsed() < Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn aborted_task_is_cancelled() {
    let handle = runtime::spawn("forever", runtime::sleep(Duration::from_secs(3600)));
    tokio::task::yield_now().await;
    handle.abort();
    assert!(matches!(handle.await, Err(TaskError::Cancelled(_))));
}

#[test]
fn blocking_scheduler_keeps_spawn_order() {
    let mut scheduler = BlockingScheduler::new();
    scheduler.spawn("long", || {
        std::thread::sleep(Duration::from_millis(50));
        "long"
    });
    scheduler.spawn("short", || {
        std::thread::sleep(Duration::from_millis(30));
        "short"
    });

    let finished = scheduler.run();
    let names: Vec<_> = finished.iter().map(|f| f.output).collect();
    assert_eq!(names, vec!["long", "short"]);
    assert!(finished[0].elapsed >= Duration::from_millis(50));
}
