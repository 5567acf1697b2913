use std::time::Duration;

/// Coalescing timer: every `push` resets the quiescence deadline and replaces
/// the pending value, so only the last value of a burst is delivered.
///
/// Time is supplied by the caller as a monotonic reading (time since the
/// session started), which keeps the primitive usable from WASM and
/// deterministic under test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Debouncer<T> {
    pending: Option<T>,
    last_event_at: Option<Duration>,
    window: Duration,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            pending: None,
            last_event_at: None,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Change the quiescence window. A pending value stays pending and is
    /// measured against the new window.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn push(&mut self, value: T, now: Duration) {
        self.pending = Some(value);
        self.last_event_at = Some(now);
    }

    /// Time left until the pending value becomes due, if any is pending.
    pub fn next_timeout(&self, now: Duration) -> Option<Duration> {
        self.pending.as_ref()?;
        let due = self.last_event_at? + self.window;
        Some(due.saturating_sub(now))
    }

    pub fn take_if_due(&mut self, now: Duration) -> Option<T> {
        let timeout = self.next_timeout(now)?;
        if timeout.is_zero() {
            self.flush()
        } else {
            None
        }
    }

    /// Deliver the pending value immediately, ignoring the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.last_event_at = None;
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
        self.last_event_at = None;
    }
}
