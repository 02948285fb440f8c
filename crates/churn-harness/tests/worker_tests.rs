mod support;

use churn_harness::engine::signal::StopSignal;
use churn_harness::engine::worker::WorkerTask;
use churn_harness::{BoxError, CapabilityPair, Connector, StressMetrics};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use support::{bind_failed, close_failed, injected, refused, Injected};

fn target() -> SocketAddr {
    "127.0.0.1:6666".parse().unwrap()
}

/// Connector that replays a fixed list of connect results, then keeps opening.
fn scripted(
    script: Vec<Result<u64, BoxError>>,
    close_ok: bool,
) -> (Arc<impl Connector<Handle = u64>>, Arc<AtomicU64>) {
    let queue = Arc::new(Mutex::new(VecDeque::from(script)));
    let closed = Arc::new(AtomicU64::new(0));
    let closed_in = Arc::clone(&closed);

    let connector = CapabilityPair::new(
        move |_addr: &SocketAddr| queue.lock().unwrap().pop_front().unwrap_or(Ok(0)),
        move |_handle: u64| {
            closed_in.fetch_add(1, Ordering::SeqCst);
            if close_ok {
                Ok(())
            } else {
                Err(close_failed())
            }
        },
    );
    (Arc::new(connector), closed)
}

fn task<C: Connector>(
    connector: Arc<C>,
    max_iterations: Option<u64>,
) -> (WorkerTask<C>, Arc<StressMetrics>, Arc<StopSignal>) {
    let metrics = Arc::new(StressMetrics::new());
    let signal = Arc::new(StopSignal::new());
    let task = WorkerTask {
        id: 0,
        target: target(),
        pacing: None,
        max_iterations,
        connector,
        metrics: Arc::clone(&metrics),
        signal: Arc::clone(&signal),
    };
    (task, metrics, signal)
}

#[test]
fn mixed_outcomes_are_accounted_once_each() {
    let (connector, closed) = scripted(
        vec![Ok(1), Err(refused()), Err(bind_failed()), Ok(2), Err(injected(5))],
        true,
    );
    let (task, metrics, signal) = task(connector, Some(100));

    let summary = task.run();

    // The fatal attempt stops the loop.
    assert_eq!(summary.attempts, 5);
    assert!(signal.is_set());

    let snap = metrics.snapshot();
    assert_eq!(snap.successful_opens, 2);
    assert_eq!(snap.requests.count, 2);
    assert_eq!(snap.failed_opens, 3);
    assert_eq!(snap.connections_refused.count, 1);
    assert_eq!(snap.bind_failures.count, 1);
    assert_eq!(snap.successful_closes, 5);
    assert_eq!(snap.failed_closes, 0);

    // Only the two opened handles reached the close capability.
    assert_eq!(closed.load(Ordering::SeqCst), 2);

    let cause = signal.fatal_cause().unwrap();
    let root = churn_harness::root_cause(&*cause);
    assert_eq!(root.downcast_ref::<Injected>(), Some(&Injected { attempt: 5 }));
}

#[test]
fn close_failures_are_counted_not_escalated() {
    let (connector, closed) = scripted(vec![Ok(1), Err(refused()), Ok(2)], false);
    let (task, metrics, signal) = task(connector, Some(6));

    let summary = task.run();

    assert_eq!(summary.attempts, 6);
    assert!(!signal.is_set());
    assert!(signal.fatal_cause().is_none());

    let snap = metrics.snapshot();
    assert_eq!(snap.successful_opens, 5);
    assert_eq!(snap.failed_opens, 1);
    assert_eq!(snap.failed_closes, 5);
    // The refused attempt had nothing to close.
    assert_eq!(snap.successful_closes, 1);
    assert_eq!(closed.load(Ordering::SeqCst), 5);
}

#[test]
fn refusals_never_stop_the_worker() {
    let script = (0..50).map(|_| Err(refused())).collect();
    let (connector, _) = scripted(script, true);
    let (task, metrics, signal) = task(connector, Some(50));

    let summary = task.run();

    assert_eq!(summary.attempts, 50);
    assert!(!signal.is_set());
    let snap = metrics.snapshot();
    assert_eq!(snap.connections_refused.count, 50);
    assert_eq!(snap.failed_opens, 50);
    assert_eq!(snap.successful_opens, 0);
    assert_eq!(snap.requests.count, 0);
    assert_eq!(snap.successful_closes, 50);
}

#[test]
fn worker_does_not_start_once_signal_is_set() {
    let (connector, closed) = scripted(Vec::new(), true);
    let (task, metrics, signal) = task(connector, None);
    signal.halt();

    let summary = task.run();

    assert_eq!(summary.attempts, 0);
    assert_eq!(metrics.snapshot().successful_opens, 0);
    assert_eq!(closed.load(Ordering::SeqCst), 0);
}

#[test]
fn pacing_delays_every_attempt() {
    let (connector, _) = scripted(Vec::new(), true);
    let (mut task, _, _) = task(connector, Some(3));
    task.pacing = Some(std::time::Duration::from_millis(15));

    let started = std::time::Instant::now();
    let summary = task.run();

    assert_eq!(summary.attempts, 3);
    assert!(started.elapsed() >= std::time::Duration::from_millis(45));
}
