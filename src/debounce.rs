//! Cancellable delayed callbacks.
//!
//! Each `schedule` aborts the previously scheduled task before spawning a new
//! one, so only the callback registered after the last change can ever run.

use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs a callback once `delay` has passed without another `schedule` call.
#[derive(Debug)]
pub struct Debouncer {
  delay: Duration,
  pending: Option<JoinHandle<()>>,
}

impl Debouncer {
  pub fn new(delay: Duration) -> Self {
    Self { delay, pending: None }
  }

  /// Cancel any pending callback and schedule `callback` to run after the delay.
  ///
  /// Must be called from within a tokio runtime.
  pub fn schedule<F>(&mut self, callback: F)
  where
    F: FnOnce() + Send + 'static,
  {
    self.cancel();
    let delay = self.delay;
    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      callback();
    }));
  }

  /// Drop the pending callback without running it.
  pub fn cancel(&mut self) {
    if let Some(handle) = self.pending.take() {
      handle.abort();
    }
  }

  /// True while a scheduled callback has not fired yet.
  pub fn is_pending(&self) -> bool {
    self.pending.as_ref().is_some_and(|h| !h.is_finished())
  }
}

impl Drop for Debouncer {
  fn drop(&mut self) {
    self.cancel();
  }
}

/// Watches a value and debounces a callback on every change to it.
///
/// Re-submitting the value that was last observed does not restart the timer.
#[derive(Debug)]
pub struct DebouncedValue<T> {
  last: Option<T>,
  debouncer: Debouncer,
}

impl<T> DebouncedValue<T>
where
  T: PartialEq + Clone + Send + 'static,
{
  pub fn new(delay: Duration) -> Self {
    Self { last: None, debouncer: Debouncer::new(delay) }
  }

  /// Observe `value`. When it differs from the last observed value, the pending
  /// callback is cancelled and `callback(value)` is scheduled instead.
  /// Returns whether a new callback was scheduled.
  pub fn update<F>(&mut self, value: T, callback: F) -> bool
  where
    F: FnOnce(T) + Send + 'static,
  {
    if self.last.as_ref() == Some(&value) {
      return false;
    }
    self.last = Some(value.clone());
    self.debouncer.schedule(move || callback(value));
    true
  }

  /// Cancel the pending callback and forget the last observed value.
  pub fn reset(&mut self) {
    self.debouncer.cancel();
    self.last = None;
  }

  pub fn is_pending(&self) -> bool {
    self.debouncer.is_pending()
  }
}
