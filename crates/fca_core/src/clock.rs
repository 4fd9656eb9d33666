//! Tick pacing
//!
//! The loop asks a `Clock` for elapsed time and sleeps through it between
//! ticks. `SystemClock` follows the wall clock; `ManualClock` advances
//! instantly when slept on, so full runs replay without waiting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Cancels a running loop from another thread.
///
/// Cloning shares the same flag. A stop wakes any pacing sleep at once.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    inner: Arc<StopInner>,
}

#[derive(Debug, Default)]
struct StopInner {
    stopped: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        let _guard = self.inner.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.inner.wake.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Block for up to `timeout`; returns early (with `true`) on stop.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.lock.lock().unwrap_or_else(|e| e.into_inner());
        while !self.is_stopped() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            guard = match self.inner.wake.wait_timeout(guard, deadline - now) {
                Ok((g, _)) => g,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        self.is_stopped()
    }
}

/// Time source for the tick loop
pub trait Clock {
    /// Time since the clock was created.
    fn now(&self) -> Duration;

    /// Sleep for `duration` unless `stop` fires first.
    fn sleep(&mut self, duration: Duration, stop: &StopHandle);
}

/// Monotonic wall clock
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration, stop: &StopHandle) {
        if duration.is_zero() {
            return;
        }
        stop.wait_timeout(duration);
    }
}

/// Virtual clock: sleeping just moves time forward.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration, stop: &StopHandle) {
        if !stop.is_stopped() {
            self.now += duration;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_manual_clock_advances_on_sleep() {
        let mut clock = ManualClock::new();
        let stop = StopHandle::new();
        clock.sleep(Duration::from_millis(250), &stop);
        clock.sleep(Duration::from_millis(250), &stop);
        assert_eq!(clock.now(), Duration::from_millis(500));
    }

    #[test]
    fn test_manual_clock_ignores_sleep_after_stop() {
        let mut clock = ManualClock::new();
        let stop = StopHandle::new();
        stop.stop();
        clock.sleep(Duration::from_secs(1), &stop);
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_system_clock_sleep_wakes_on_stop() {
        let stop = StopHandle::new();
        let remote = stop.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.stop();
        });

        let mut clock = SystemClock::new();
        let started = Instant::now();
        clock.sleep(Duration::from_secs(30), &stop);
        handle.join().unwrap();

        assert!(stop.is_stopped());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_wait_timeout_without_stop() {
        let stop = StopHandle::new();
        let started = Instant::now();
        assert!(!stop.wait_timeout(Duration::from_millis(10)));
        assert!(started.elapsed() >= Duration::from_millis(10));
    }
}
