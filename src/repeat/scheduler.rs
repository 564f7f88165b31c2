use anyhow::{Result, ensure};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::Duration;

use super::action::{FailureReporter, RepeatableAction, TracingFailureReporter};
use super::timer::{ThreadTimerFactory, TickFn, TimerFactory, TimerHandle};
use crate::error::caught_panic;

/// Runs recurring actions, one shared timer per distinct interval
///
/// Actions registered with the same interval form a timer group. The group's
/// timer is started when its first action is registered and released as soon
/// as a tick leaves the group without members, so idle intervals never keep a
/// timer alive.
///
/// The scheduler only keeps weak references: an action whose last `Arc` is
/// dropped is treated like one that reports itself invalid.
///
/// Clones share the same registry. Timers are stopped on [`shutdown`] or when
/// the last clone is dropped.
///
/// [`shutdown`]: RepeatingActionScheduler::shutdown
#[derive(Clone)]
pub struct RepeatingActionScheduler {
    registry: Arc<Registry>,
}

struct Registry {
    groups: Mutex<HashMap<Duration, Arc<TimerGroup>>>,
    timers: Box<dyn TimerFactory>,
    reporter: Box<dyn FailureReporter>,
}

struct TimerGroup {
    interval: Duration,
    members: Mutex<Vec<Weak<dyn RepeatableAction>>>,
    timer: Mutex<Option<Box<dyn TimerHandle>>>,
}

impl Default for RepeatingActionScheduler {
    fn default() -> Self {
        Self::new(ThreadTimerFactory)
    }
}

impl RepeatingActionScheduler {
    /// Scheduler reporting failures through `tracing`
    pub fn new(timers: impl TimerFactory + 'static) -> Self {
        Self::with_reporter(timers, TracingFailureReporter)
    }

    pub fn with_reporter(
        timers: impl TimerFactory + 'static,
        reporter: impl FailureReporter + 'static,
    ) -> Self {
        Self {
            registry: Arc::new(Registry {
                groups: Mutex::new(HashMap::new()),
                timers: Box::new(timers),
                reporter: Box::new(reporter),
            }),
        }
    }

    /// Register `action` with the timer group for its interval
    ///
    /// Creates the group, and starts its timer, if the interval is not in use.
    /// Registering the same action again only ensures membership.
    pub fn repeat<A>(&self, action: &Arc<A>) -> Result<()>
    where
        A: RepeatableAction + 'static,
    {
        let interval = action.repeat_interval();
        ensure!(!interval.is_zero(), "repeat interval of '{}' must be positive", action.name());

        let member: Weak<A> = Arc::downgrade(action);
        let member: Weak<dyn RepeatableAction> = member;

        // Held across create-or-join so a concurrent tick cannot tear the group down meanwhile
        let mut groups = self.registry.groups.lock();
        let group = match groups.get(&interval) {
            Some(group) => group.clone(),
            None => {
                let group = self.registry.start_group(interval)?;
                groups.insert(interval, group.clone());
                group
            }
        };
        group.add(member);
        Ok(())
    }

    /// Number of live timer groups, which is also the number of running timers.
    pub fn group_count(&self) -> usize {
        self.registry.groups.lock().len()
    }

    /// Registered members for `interval`, including ones not yet found invalid.
    pub fn member_count(&self, interval: Duration) -> usize {
        self.registry
            .groups
            .lock()
            .get(&interval)
            .map_or(0, |group| group.members.lock().len())
    }

    /// Stop every timer and forget every registration.
    pub fn shutdown(&self) {
        let groups: Vec<_> = self.registry.groups.lock().drain().collect();
        for (interval, group) in groups {
            group.stop_timer();
            tracing::debug!(?interval, "stopped timer group on shutdown");
        }
    }
}

impl Registry {
    fn start_group(self: &Arc<Self>, interval: Duration) -> Result<Arc<TimerGroup>> {
        let group = Arc::new(TimerGroup {
            interval,
            members: Mutex::new(Vec::new()),
            timer: Mutex::new(None),
        });

        let on_tick: TickFn = {
            let registry = Arc::downgrade(self);
            let group = Arc::downgrade(&group);
            Arc::new(move || {
                if let (Some(registry), Some(group)) = (registry.upgrade(), group.upgrade()) {
                    registry.tick(&group);
                }
            })
        };

        let handle = self.timers.start(interval, on_tick)?;
        *group.timer.lock() = Some(handle);
        tracing::debug!(?interval, "started timer group");
        Ok(group)
    }

    fn tick(&self, group: &Arc<TimerGroup>) {
        for member in group.snapshot() {
            match member.upgrade() {
                Some(action) if action.is_valid() => self.run(&*action),
                _ => group.remove(&member),
            }
        }

        let mut groups = self.groups.lock();
        let registered = groups
            .get(&group.interval)
            .is_some_and(|current| Arc::ptr_eq(current, group));

        if registered && group.is_empty() {
            groups.remove(&group.interval);
            group.stop_timer();
            tracing::debug!(interval = ?group.interval, "released idle timer group");
        }
    }

    fn run(&self, action: &dyn RepeatableAction) {
        let error = match panic::catch_unwind(AssertUnwindSafe(|| action.execute())) {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err,
            Err(payload) => caught_panic(payload),
        };

        self.reporter.report(
            &format!("Could not execute repeated task '{}'", action.name()),
            &error,
        );
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        for group in self.groups.get_mut().values() {
            group.stop_timer();
        }
    }
}

impl TimerGroup {
    fn snapshot(&self) -> Vec<Weak<dyn RepeatableAction>> {
        self.members.lock().clone()
    }

    fn add(&self, member: Weak<dyn RepeatableAction>) {
        let mut members = self.members.lock();
        if !members.iter().any(|existing| same_action(existing, &member)) {
            members.push(member);
        }
    }

    fn remove(&self, member: &Weak<dyn RepeatableAction>) {
        self.members.lock().retain(|existing| !same_action(existing, member));
    }

    fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }

    fn stop_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.stop();
        }
    }
}

/// Identity comparison; vtable pointers are ignored.
fn same_action(a: &Weak<dyn RepeatableAction>, b: &Weak<dyn RepeatableAction>) -> bool {
    std::ptr::addr_eq(a.as_ptr(), b.as_ptr())
}
