//! Behavioural tests for every execution strategy through the public API

use anyhow::bail;
use crossbeam::channel;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use indexing_executor::TaskExecutor;
use indexing_executor::error::{AggregateError, Cancelled};
use indexing_executor::parallel::{BUFFER_SIZE, CancellationToken, ExecutionConfig, Scheduler};
use indexing_executor::repeat::{
    FailureReporter, ManualTimerFactory, RepeatableAction, RepeatingActionScheduler,
};

/// Records invocation order and flags any overlap between invocations
#[derive(Default)]
struct Probe {
    active: AtomicBool,
    overlapped: AtomicBool,
    order: Mutex<Vec<usize>>,
}

impl Probe {
    fn record(&self, value: usize) {
        if self.active.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.order.lock().push(value);
        thread::yield_now();
        self.active.store(false, Ordering::SeqCst);
    }

    fn order(&self) -> Vec<usize> {
        self.order.lock().clone()
    }

    fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

fn items(n: usize) -> Vec<usize> {
    (0..n).collect()
}

#[test]
fn test_sequential_mode_runs_in_order_without_overlap() {
    let executor = TaskExecutor::default();
    let config = ExecutionConfig::sequential();
    let source = items(20);
    let caller = thread::current().id();

    let probe = Probe::default();
    let mapped = executor
        .apply(&config, source.iter().copied(), |item| {
            assert_eq!(thread::current().id(), caller);
            probe.record(item);
            Ok(Some(item))
        })
        .unwrap();
    assert_eq!(mapped, source);
    assert_eq!(probe.order(), source);
    assert!(!probe.overlapped());

    let probe = Probe::default();
    executor
        .execute_all(&config, &source, |&item, index| {
            assert_eq!(item, index);
            assert_eq!(thread::current().id(), caller);
            probe.record(item);
            Ok(())
        })
        .unwrap();
    assert_eq!(probe.order(), source);
    assert!(!probe.overlapped());

    let probe = Probe::default();
    executor
        .execute_all_interleaved(&config, &source, |&item| {
            assert_eq!(thread::current().id(), caller);
            probe.record(item);
            Ok(())
        })
        .unwrap();
    assert_eq!(probe.order(), source);
    assert!(!probe.overlapped());

    let probe = Probe::default();
    let cursors = AtomicUsize::new(0);
    executor
        .execute_all_buffered(&config, &source, |cursor| {
            cursors.fetch_add(1, Ordering::SeqCst);
            for &item in cursor {
                probe.record(item);
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(cursors.load(Ordering::SeqCst), 1);
    assert_eq!(probe.order(), source);
    assert!(!probe.overlapped());
}

#[test]
fn test_parallel_map_filter_matches_sequential_set() {
    let executor = TaskExecutor::default();
    let source = items(500);
    let keep_multiples_of_three =
        |item: usize| -> anyhow::Result<Option<usize>> { Ok((item % 3 == 0).then_some(item)) };

    let sequential: BTreeSet<usize> = executor
        .apply(&ExecutionConfig::sequential(), source.iter().copied(), keep_multiples_of_three)
        .unwrap()
        .into_iter()
        .collect();
    let parallel: Vec<usize> = executor
        .apply(&ExecutionConfig::new(8).unwrap(), source.iter().copied(), keep_multiples_of_three)
        .unwrap();

    assert_eq!(parallel.len(), sequential.len());
    assert_eq!(parallel.into_iter().collect::<BTreeSet<_>>(), sequential);
}

#[test]
fn test_indexed_executor_delivers_every_index_once() {
    let executor = TaskExecutor::default();
    let config = ExecutionConfig::new(3).unwrap();
    let source: Vec<String> = (0..10).map(|i| format!("index-{i}")).collect();
    let seen = Mutex::new(HashMap::new());

    executor
        .execute_all(&config, &source, |item, index| {
            let previous = seen.lock().insert(index, item.clone());
            assert!(previous.is_none(), "index {index} delivered twice");
            Ok(())
        })
        .unwrap();

    let seen = seen.into_inner();
    assert_eq!(seen.len(), 10);
    for (index, item) in seen {
        assert_eq!(item, source[index]);
    }
}

#[test]
fn test_indexed_executor_stops_between_partitions_on_cancel() {
    let executor = TaskExecutor::default();
    let cancellation = CancellationToken::new();
    let config = ExecutionConfig::new(2)
        .unwrap()
        .with_cancellation(cancellation.clone());
    let calls = AtomicUsize::new(0);

    let err = executor
        .execute_all(&config, &items(10), |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            cancellation.cancel();
            Ok(())
        })
        .unwrap_err();

    assert!(err.is::<Cancelled>());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_interleaved_executor_bounds_in_flight_items() {
    let executor = TaskExecutor::default();
    let config = ExecutionConfig::new(2)
        .unwrap()
        .with_scheduler(Scheduler::new(4).unwrap());
    let source = items(10);

    let (release_tx, release_rx) = channel::unbounded::<()>();
    let in_flight = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let completed = Mutex::new(Vec::new());

    let releaser = thread::spawn(move || {
        for _ in 0..10 {
            thread::sleep(Duration::from_millis(5));
            if release_tx.send(()).is_err() {
                break;
            }
        }
    });

    executor
        .execute_all_interleaved(&config, &source, |&item| {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(current, Ordering::SeqCst);
            release_rx.recv().unwrap();
            in_flight.fetch_sub(1, Ordering::SeqCst);
            completed.lock().push(item);
            Ok(())
        })
        .unwrap();
    releaser.join().unwrap();

    assert!(peak.load(Ordering::SeqCst) <= 2);
    let mut completed = completed.into_inner();
    completed.sort_unstable();
    assert_eq!(completed, source);
}

#[test]
fn test_interleaved_executor_collects_every_failure() {
    let executor = TaskExecutor::default();
    let config = ExecutionConfig::new(3).unwrap();
    let calls = AtomicUsize::new(0);

    let err = executor
        .execute_all_interleaved(&config, &items(12), |&item| {
            calls.fetch_add(1, Ordering::SeqCst);
            if item % 4 == 0 {
                bail!("item {item} failed");
            }
            Ok(())
        })
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 12);
    let aggregate = err.downcast_ref::<AggregateError>().unwrap();
    assert_eq!(aggregate.errors().len(), 3);
}

#[test]
fn test_buffered_executor_cursor_layout() {
    let executor = TaskExecutor::default();
    let config = ExecutionConfig::new(4).unwrap();
    let source = items(1000);

    let cursors = AtomicUsize::new(0);
    let covered = Mutex::new(Vec::new());
    executor
        .execute_all_buffered(&config, &source, |cursor| {
            cursors.fetch_add(1, Ordering::SeqCst);
            let chunk: Vec<usize> = cursor.copied().collect();
            assert!(chunk.len() <= BUFFER_SIZE);
            covered.lock().extend(chunk);
            Ok(())
        })
        .unwrap();

    assert_eq!(cursors.load(Ordering::SeqCst), 250);
    let mut covered = covered.into_inner();
    covered.sort_unstable();
    assert_eq!(covered, source);
}

struct Counter {
    interval: Duration,
    valid: AtomicBool,
    fail: bool,
    executed: AtomicUsize,
}

impl Counter {
    fn new(interval: Duration, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            interval,
            valid: AtomicBool::new(true),
            fail,
            executed: AtomicUsize::new(0),
        })
    }

    fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

impl RepeatableAction for Counter {
    fn repeat_interval(&self) -> Duration {
        self.interval
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn execute(&self) -> anyhow::Result<()> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("flush failed");
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Collector(Arc<Mutex<Vec<String>>>);

impl FailureReporter for Collector {
    fn report(&self, message: &str, error: &anyhow::Error) {
        self.0.lock().push(format!("{message}: {error}"));
    }
}

#[test]
fn test_recurring_actions_share_a_timer_until_all_invalid() {
    let timers = ManualTimerFactory::new();
    let executor = TaskExecutor::new(RepeatingActionScheduler::new(timers.clone()));
    let interval = Duration::from_secs(5);
    let first = Counter::new(interval, false);
    let second = Counter::new(interval, false);

    executor.repeat(&first).unwrap();
    executor.repeat(&second).unwrap();
    assert_eq!(timers.started(), 1);
    assert_eq!(executor.repeating().member_count(interval), 2);

    timers.fire(interval);
    assert_eq!((first.executed(), second.executed()), (1, 1));

    first.valid.store(false, Ordering::SeqCst);
    timers.fire(interval);
    assert_eq!((first.executed(), second.executed()), (1, 2));

    second.valid.store(false, Ordering::SeqCst);
    timers.fire(interval);
    assert_eq!((first.executed(), second.executed()), (1, 2));
    assert_eq!(executor.repeating().group_count(), 0);
    assert_eq!(timers.active(), 0);

    timers.fire(interval);
    assert_eq!((first.executed(), second.executed()), (1, 2));
}

#[test]
fn test_failing_recurring_action_does_not_stop_sibling() {
    let timers = ManualTimerFactory::new();
    let reporter = Collector::default();
    let scheduler = RepeatingActionScheduler::with_reporter(timers.clone(), reporter.clone());
    let interval = Duration::from_millis(250);
    let failing = Counter::new(interval, true);
    let healthy = Counter::new(interval, false);

    scheduler.repeat(&failing).unwrap();
    scheduler.repeat(&healthy).unwrap();
    timers.fire(interval);
    timers.fire(interval);

    assert_eq!(failing.executed(), 2);
    assert_eq!(healthy.executed(), 2);
    assert_eq!(reporter.0.lock().len(), 2);
}
