//! Host-idle gate
//!
//! The first tick of every animation leg is deferred until the host reports
//! that pending user interactions have finished, so starting an animation
//! never janks input handling. Embedders plug their platform's notion of
//! "idle" in through [`InteractionGate`]; headless use and tests rely on the
//! provided implementations.

use std::sync::Mutex;

/// Deferred-execution seam toward the host environment
///
/// `run_after_interactions` schedules a closure to run once the host has no
/// pending interactions. This is a one-time scheduling hop, not a suspension:
/// the closure runs exactly once and returns nothing to the caller.
pub trait InteractionGate: Send + Sync {
    fn run_after_interactions(&self, f: Box<dyn FnOnce() + Send>);
}

/// Gate for hosts without an interaction queue: runs the closure inline
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateGate;

impl InteractionGate for ImmediateGate {
    fn run_after_interactions(&self, f: Box<dyn FnOnce() + Send>) {
        f();
    }
}

/// Gate that parks closures until the embedder drains them
///
/// Embedders whose event loop batches idle work call [`QueuedGate::flush`]
/// at the point they consider interactions finished. Also the way tests
/// observe that the first tick of a leg really is deferred.
#[derive(Default)]
pub struct QueuedGate {
    queue: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl QueuedGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of closures waiting for idle
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Run and drain all queued closures, returning how many ran
    pub fn flush(&self) -> usize {
        let drained: Vec<_> = std::mem::take(&mut *self.queue.lock().unwrap());
        let count = drained.len();
        for f in drained {
            f();
        }
        count
    }
}

impl InteractionGate for QueuedGate {
    fn run_after_interactions(&self, f: Box<dyn FnOnce() + Send>) {
        self.queue.lock().unwrap().push(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_immediate_gate_runs_inline() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_inner = Arc::clone(&ran);

        ImmediateGate.run_after_interactions(Box::new(move || {
            ran_inner.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_queued_gate_defers_until_flush() {
        let gate = QueuedGate::new();
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let ran_inner = Arc::clone(&ran);
            gate.run_after_interactions(Box::new(move || {
                ran_inner.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(gate.pending(), 2);

        assert_eq!(gate.flush(), 2);
        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert_eq!(gate.pending(), 0);
    }
}
