use crossbeam::channel::{Receiver, Sender, bounded};

/// Counting admission gate
///
/// Each held permit occupies one slot of a bounded channel, so at most
/// `permits` can be outstanding; [`AdmissionGate::acquire`] blocks while the
/// gate is full. A permit frees its slot when dropped, including when the
/// work holding it fails or unwinds.
#[derive(Debug)]
pub struct AdmissionGate {
    permits: usize,
    occupied_tx: Sender<()>,
    occupied_rx: Receiver<()>,
}

/// One admission through an [`AdmissionGate`], released on drop
#[derive(Debug)]
#[must_use = "the permit is released as soon as it is dropped"]
pub struct Permit<'a> {
    gate: &'a AdmissionGate,
}

impl AdmissionGate {
    pub fn new(permits: usize) -> Self {
        let permits = permits.max(1);
        let (occupied_tx, occupied_rx) = bounded(permits);
        Self {
            permits,
            occupied_tx,
            occupied_rx,
        }
    }

    /// Block until a permit is available and take it.
    pub fn acquire(&self) -> Permit<'_> {
        // Both channel ends live in the gate, so the send can block but never disconnect.
        let _ = self.occupied_tx.send(());
        Permit { gate: self }
    }

    /// Like [`acquire`](Self::acquire), but a rayon worker thread keeps
    /// running queued pool jobs while it waits. The permits it waits for may
    /// be held by exactly those jobs.
    pub fn acquire_cooperative(&self) -> Permit<'_> {
        if rayon::current_thread_index().is_none() {
            return self.acquire();
        }

        loop {
            if let Some(permit) = self.try_acquire() {
                return permit;
            }
            if !matches!(rayon::yield_now(), Some(rayon::Yield::Executed)) {
                std::thread::yield_now();
            }
        }
    }

    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        self.occupied_tx.try_send(()).ok().map(|()| Permit { gate: self })
    }

    pub fn permits(&self) -> usize {
        self.permits
    }

    pub fn available(&self) -> usize {
        self.permits - self.occupied_rx.len()
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let _ = self.gate.occupied_rx.try_recv();
    }
}
