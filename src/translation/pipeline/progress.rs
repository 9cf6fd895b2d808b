/*!
 * Progress reporting for pipeline runs.
 *
 * Sinks are fire-and-forget: `report` returns nothing and a sink that cannot
 * deliver simply drops the update.
 */

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};

use log::debug;
use parking_lot::Mutex;

/// Receiver of `(message, percent)` progress updates
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str, percent: u8);
}

/// Sink that discards every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _message: &str, _percent: u8) {}
}

/// Sink that keeps every update, for inspection in tests and summaries
#[derive(Debug, Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<(String, u8)>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<(String, u8)> {
        self.updates.lock().clone()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.updates.lock().iter().map(|(_, p)| *p).collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, message: &str, percent: u8) {
        self.updates.lock().push((message.to_string(), percent));
    }
}

impl ProgressSink for indicatif::ProgressBar {
    fn report(&self, message: &str, percent: u8) {
        self.set_position(u64::from(percent));
        self.set_message(message.to_string());
    }
}

/// Wrapper that never lets the reported percentage go backwards.
///
/// A panicking sink never takes the pipeline down with it.
pub struct MonotonicProgress<'a> {
    inner: &'a dyn ProgressSink,
    last: AtomicU8,
}

impl<'a> MonotonicProgress<'a> {
    pub fn new(inner: &'a dyn ProgressSink) -> Self {
        Self { inner, last: AtomicU8::new(0) }
    }

    /// Highest percentage reported so far
    pub fn current(&self) -> u8 {
        self.last.load(Ordering::Relaxed)
    }
}

impl ProgressSink for MonotonicProgress<'_> {
    fn report(&self, message: &str, percent: u8) {
        let clamped = percent.min(100);
        let previous = self.last.fetch_max(clamped, Ordering::Relaxed);
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
            self.inner.report(message, clamped.max(previous));
        }));
        if delivered.is_err() {
            debug!("Progress sink panicked on '{}', update dropped", message);
        }
    }
}
