use anyhow::Result;
use crossbeam::channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fixed-size worker pool used by the fan-out/fan-in strategies
///
/// A producer thread feeds work items through a bounded channel to exactly
/// `workers` scoped threads; results come back through a second channel and
/// are collected on the calling thread. The first failing item wins: it is
/// recorded, every worker stops pulling new items and the call returns that
/// failure once all threads have been joined.
pub(crate) struct WorkerPool {
    workers: usize,
    buffer_size: usize,
}

/// Context for worker threads to avoid too many function parameters
struct WorkerContext<'a, T, R, F> {
    worker_id: usize,
    work_rx: Receiver<T>,
    result_tx: Sender<R>,
    processor: &'a F,
    aborted: &'a AtomicBool,
    failure: &'a Mutex<Option<anyhow::Error>>,
}

impl WorkerPool {
    pub(crate) fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            buffer_size: workers * 2,
        }
    }

    /// Run `processor` over every work item. `Ok(None)` results are dropped;
    /// the order of the returned results is unspecified.
    pub(crate) fn execute<I, T, R, F>(&self, work_items: I, processor: F) -> Result<Vec<R>>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send,
        T: Send,
        R: Send,
        F: Fn(T) -> Result<Option<R>> + Sync,
    {
        let work_items = work_items.into_iter();
        let (work_tx, work_rx): (Sender<T>, Receiver<T>) = bounded(self.buffer_size);
        let (result_tx, result_rx): (Sender<R>, Receiver<R>) = bounded(self.buffer_size);

        let aborted = AtomicBool::new(false);
        let failure = Mutex::new(None);

        let results = crossbeam::thread::scope(|s| {
            for worker_id in 0..self.workers {
                let ctx = WorkerContext {
                    worker_id,
                    work_rx: work_rx.clone(),
                    result_tx: result_tx.clone(),
                    processor: &processor,
                    aborted: &aborted,
                    failure: &failure,
                };

                s.spawn(move |_| ctx.run());
            }

            // Producer thread: send work to workers
            let aborted = &aborted;
            s.spawn(move |_| {
                for work_item in work_items {
                    if aborted.load(Ordering::Acquire) || work_tx.send(work_item).is_err() {
                        break;
                    }
                }
            });

            // Drop our ends so the channels close once workers are done
            drop(work_rx);
            drop(result_tx);

            result_rx.iter().collect::<Vec<R>>()
        })
        .map_err(|_| anyhow::anyhow!("Thread panic occurred during parallel execution"))?;

        match failure.into_inner() {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }
}

impl<T, R, F> WorkerContext<'_, T, R, F>
where
    F: Fn(T) -> Result<Option<R>>,
{
    fn run(self) {
        while let Ok(work_item) = self.work_rx.recv() {
            if self.aborted.load(Ordering::Acquire) {
                break;
            }

            match (self.processor)(work_item) {
                Ok(Some(result)) => {
                    if self.result_tx.send(result).is_err() {
                        break; // Collector dropped
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::trace!(worker_id = self.worker_id, "work item failed, stopping fan-out");
                    self.aborted.store(true, Ordering::Release);
                    self.failure.lock().get_or_insert(err);
                    break;
                }
            }
        }
    }
}
