//! Recurring timers behind an injectable factory
//!
//! [`ThreadTimerFactory`] drives each timer from its own thread and is what
//! production code uses. [`ManualTimerFactory`] never fires by itself: tests
//! call [`ManualTimerFactory::fire`] to tick deterministically and inspect
//! which timers were started and released.

use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, Sender, TryRecvError, bounded, select, tick};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Callback invoked on every tick.
pub type TickFn = Arc<dyn Fn() + Send + Sync>;

/// Creates recurring timers
pub trait TimerFactory: Send + Sync {
    /// Start a timer whose first tick comes after `interval` and which then
    /// keeps ticking every `interval` until stopped.
    fn start(&self, interval: Duration, on_tick: TickFn) -> Result<Box<dyn TimerHandle>>;
}

/// Owned handle of a running timer
pub trait TimerHandle: Send {
    /// Stop the timer. It may be called from inside the timer's own tick, so
    /// implementations must not wait for an in-progress tick to finish.
    fn stop(self: Box<Self>);
}

/// One thread per timer, paced by `crossbeam::channel::tick`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadTimerFactory;

struct ThreadTimer {
    stop_tx: Sender<()>,
}

impl TimerFactory for ThreadTimerFactory {
    fn start(&self, interval: Duration, on_tick: TickFn) -> Result<Box<dyn TimerHandle>> {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let ticker = tick(interval);

        thread::Builder::new()
            .name(format!("repeat-{}ms", interval.as_millis()))
            .spawn(move || {
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            // A stop racing a tick must win
                            if is_disconnected(&stop_rx) {
                                break;
                            }
                            on_tick();
                        }
                    }
                }
                tracing::trace!(?interval, "timer thread exiting");
            })
            .with_context(|| format!("Failed to spawn timer thread for {interval:?}"))?;

        Ok(Box::new(ThreadTimer { stop_tx }))
    }
}

fn is_disconnected(rx: &Receiver<()>) -> bool {
    matches!(rx.try_recv(), Err(TryRecvError::Disconnected))
}

impl TimerHandle for ThreadTimer {
    fn stop(self: Box<Self>) {
        // Dropping the only sender disconnects the channel the thread selects on
        drop(self.stop_tx);
    }
}

/// Deterministic timer fake
///
/// Clones share state, so a test keeps one clone and hands another to the
/// scheduler.
#[derive(Clone, Default)]
pub struct ManualTimerFactory {
    timers: Arc<Mutex<Vec<ManualTimer>>>,
}

struct ManualTimer {
    interval: Duration,
    on_tick: TickFn,
    stopped: Arc<AtomicBool>,
}

struct ManualTimerHandle {
    stopped: Arc<AtomicBool>,
}

impl ManualTimerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick every live timer with this interval once. Returns how many fired.
    pub fn fire(&self, interval: Duration) -> usize {
        let callbacks: Vec<TickFn> = self
            .timers
            .lock()
            .iter()
            .filter(|timer| timer.interval == interval && !timer.stopped.load(Ordering::Acquire))
            .map(|timer| timer.on_tick.clone())
            .collect();

        for on_tick in &callbacks {
            on_tick();
        }
        callbacks.len()
    }

    /// Timers started so far, released or not.
    pub fn started(&self) -> usize {
        self.timers.lock().len()
    }

    /// Timers started and not yet released.
    pub fn active(&self) -> usize {
        self.timers
            .lock()
            .iter()
            .filter(|timer| !timer.stopped.load(Ordering::Acquire))
            .count()
    }
}

impl TimerFactory for ManualTimerFactory {
    fn start(&self, interval: Duration, on_tick: TickFn) -> Result<Box<dyn TimerHandle>> {
        let stopped = Arc::new(AtomicBool::new(false));
        self.timers.lock().push(ManualTimer {
            interval,
            on_tick,
            stopped: stopped.clone(),
        });
        Ok(Box::new(ManualTimerHandle { stopped }))
    }
}

impl TimerHandle for ManualTimerHandle {
    fn stop(self: Box<Self>) {
        self.stopped.store(true, Ordering::Release);
    }
}
