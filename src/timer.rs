//! Periodic timer ownership
//!
//! A [`Ticker`] owns the native timer of the window. It must be stopped
//! before the window is destroyed, otherwise the native side may still fire
//! a tick at a drawing surface that no longer exists. Stopping is idempotent
//! and also happens on drop.

use std::time::Duration;

use crate::error::DropperResult;

/// Native periodic timer (Win32 `SetTimer`, AppKit `NSTimer`)
pub trait TimerBackend {
    fn start(&mut self, interval: Duration) -> DropperResult<()>;
    fn stop(&mut self);
}

pub struct Ticker<B: TimerBackend> {
    backend: B,
    interval: Duration,
    running: bool,
}

impl<B: TimerBackend> Ticker<B> {
    pub fn new(backend: B, interval: Duration) -> Self {
        Self { backend, interval, running: false }
    }

    pub fn start(&mut self) -> DropperResult<()> {
        if self.running {
            return Ok(());
        }
        self.backend.start(self.interval)?;
        self.running = true;
        tracing::debug!(interval_ms = self.interval.as_millis() as u64, "timer started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.backend.stop();
        self.running = false;
        tracing::debug!("timer stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<B: TimerBackend> Drop for Ticker<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records start/stop calls; shared so tests can inspect it after drop.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingTimer {
        pub(crate) log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl TimerBackend for RecordingTimer {
        fn start(&mut self, _interval: Duration) -> DropperResult<()> {
            self.log.borrow_mut().push("start");
            Ok(())
        }

        fn stop(&mut self) {
            self.log.borrow_mut().push("stop");
        }
    }

    #[test]
    fn stop_is_idempotent() {
        let backend = RecordingTimer::default();
        let log = backend.log.clone();
        let mut ticker = Ticker::new(backend, Duration::from_millis(10));
        ticker.start().unwrap();
        ticker.start().unwrap();
        ticker.stop();
        ticker.stop();
        drop(ticker);
        assert_eq!(*log.borrow(), vec!["start", "stop"]);
    }

    #[test]
    fn drop_stops_a_running_timer() {
        let backend = RecordingTimer::default();
        let log = backend.log.clone();
        {
            let mut ticker = Ticker::new(backend, Duration::from_millis(10));
            ticker.start().unwrap();
            assert!(ticker.is_running());
        }
        assert_eq!(*log.borrow(), vec!["start", "stop"]);
    }

    #[test]
    fn never_started_is_never_stopped() {
        let backend = RecordingTimer::default();
        let log = backend.log.clone();
        drop(Ticker::new(backend, Duration::from_millis(10)));
        assert!(log.borrow().is_empty());
    }
}
