//! Timer scheduler
//!
//! One-shot, cancellable timers for driving animation ticks. `schedule()`
//! returns a [`TimerId`] cancel handle; re-arming a repeating tick means
//! cancel-then-create. The clock is advanced either manually through
//! [`TimerScheduler::advance`] (tests, embedders with their own frame loop)
//! or by a background thread started with
//! [`TimerScheduler::start_background`].

use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

new_key_type! {
    /// Cancel handle for a pending timer
    pub struct TimerId;
}

/// Callback invoked when a timer fires
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

struct TimerEntry {
    /// Milliseconds left until the timer fires
    remaining_ms: f64,
    /// Arming order, used to fire same-deadline timers deterministically
    seq: u64,
    callback: TimerCallback,
}

/// Internal state of the timer scheduler
struct SchedulerInner {
    timers: SlotMap<TimerId, TimerEntry>,
    next_seq: u64,
}

/// The timer scheduler that owns all pending timers
///
/// Typically one scheduler is shared by all widgets of an application and
/// distributed via [`SchedulerHandle`]. Dropping the scheduler stops the
/// background thread and turns every outstanding handle into a no-op.
pub struct TimerScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
    /// Stop signal for the background thread
    stop_flag: Arc<AtomicBool>,
    /// Background thread handle (if running)
    thread_handle: Option<JoinHandle<()>>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                timers: SlotMap::with_key(),
                next_seq: 0,
            })),
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Get a handle to this scheduler for passing to widgets
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Advance the clock by `dt_ms` milliseconds and fire every timer that
    /// became due
    ///
    /// Due callbacks are removed from the scheduler first and invoked after
    /// the internal lock is released, so a callback may schedule or cancel
    /// timers through a [`SchedulerHandle`] without deadlocking. A timer
    /// armed from inside a callback is not decremented by the `advance`
    /// call that fired its creator.
    ///
    /// Returns the number of callbacks fired.
    pub fn advance(&self, dt_ms: f64) -> usize {
        advance_inner(&self.inner, dt_ms)
    }

    /// Start driving the clock from a background thread
    ///
    /// The thread advances the scheduler off `Instant` deltas at roughly
    /// millisecond resolution, so timers fire close to their nominal delay
    /// even when the embedding event loop is busy.
    pub fn start_background(&mut self) {
        if self.thread_handle.is_some() {
            return; // Already running
        }

        let inner = Arc::clone(&self.inner);
        let stop_flag = Arc::clone(&self.stop_flag);

        tracing::debug!("timer scheduler: background thread starting");
        self.thread_handle = Some(thread::spawn(move || {
            let resolution = Duration::from_millis(1);
            let mut last = Instant::now();

            while !stop_flag.load(Ordering::Relaxed) {
                thread::sleep(resolution);

                let now = Instant::now();
                let dt_ms = (now - last).as_secs_f64() * 1000.0;
                last = now;

                advance_inner(&inner, dt_ms);
            }
        }));
    }

    /// Stop the background thread
    pub fn stop_background(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
            tracing::debug!("timer scheduler: background thread stopped");
        }
        self.stop_flag.store(false, Ordering::Relaxed);
    }

    /// Check if the background thread is running
    pub fn is_background_running(&self) -> bool {
        self.thread_handle.is_some()
    }

    /// Number of pending timers
    pub fn pending_count(&self) -> usize {
        self.inner.lock().unwrap().timers.len()
    }

    /// Check if any timers are pending
    pub fn has_pending(&self) -> bool {
        self.pending_count() > 0
    }
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        // Stop background thread when scheduler is dropped
        self.stop_background();
    }
}

/// Decrement deadlines by `dt_ms`, then remove and invoke every due timer
///
/// Callbacks run with the lock released so they can schedule or cancel
/// through a handle. Same-advance timers fire in arming order.
fn advance_inner(inner: &Arc<Mutex<SchedulerInner>>, dt_ms: f64) -> usize {
    let due = {
        let mut guard = inner.lock().unwrap();

        let mut due_ids = Vec::new();
        for (id, entry) in guard.timers.iter_mut() {
            entry.remaining_ms -= dt_ms;
            if entry.remaining_ms <= 0.0 {
                due_ids.push((entry.seq, id));
            }
        }
        due_ids.sort_by_key(|&(seq, _)| seq);

        due_ids
            .into_iter()
            .filter_map(|(_, id)| guard.timers.remove(id))
            .collect::<Vec<_>>()
    };

    let fired = due.len();
    for entry in due {
        tracing::trace!(seq = entry.seq, "timer fired");
        (entry.callback)();
    }
    fired
}

/// A weak handle to the timer scheduler
///
/// This is passed to widgets that need to arm timers. It won't prevent the
/// scheduler from being dropped; once it is, every operation is a no-op.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Arm a one-shot timer and return its cancel handle
    ///
    /// Returns `None` if the scheduler has been dropped.
    pub fn schedule(&self, delay_ms: f64, callback: TimerCallback) -> Option<TimerId> {
        self.inner.upgrade().map(|inner| {
            let mut guard = inner.lock().unwrap();
            let seq = guard.next_seq;
            guard.next_seq += 1;
            guard.timers.insert(TimerEntry {
                remaining_ms: delay_ms,
                seq,
                callback,
            })
        })
    }

    /// Cancel a pending timer
    ///
    /// Cancelling a timer that already fired or was already cancelled is a
    /// no-op.
    pub fn cancel(&self, id: TimerId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.lock().unwrap().timers.remove(id);
        }
    }

    /// Check whether a timer is still pending
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.lock().unwrap().timers.contains_key(id))
            .unwrap_or(false)
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
