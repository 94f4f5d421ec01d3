//! Cancellable periodic background task

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Shared stop flag handed to every tick
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Runs a callback every `interval` on its own thread until cancelled or dropped.
///
/// Cancelling never waits for the worker. A tick already running keeps going
/// in the background, so long ticks should check the [`CancelFlag`] before
/// publishing anything.
pub struct RefreshTimer {
    cancel_tx: Option<Sender<()>>,
    flag: CancelFlag,
}

impl RefreshTimer {
    pub fn start<F>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut(&CancelFlag) + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = channel::<()>();
        let flag = CancelFlag::default();
        let worker_flag = flag.clone();
        thread::spawn(move || loop {
            match cancel_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) if !worker_flag.is_cancelled() => tick(&worker_flag),
                _ => break,
            }
        });

        Self {
            cancel_tx: Some(cancel_tx),
            flag,
        }
    }

    /// Stop ticking and return at once. Safe to call twice.
    pub fn cancel(&mut self) {
        self.flag.cancel();
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel_tx.is_some()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[test]
    fn test_ticks_until_cancelled() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let mut timer = RefreshTimer::start(Duration::from_millis(10), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(100));
        timer.cancel();
        assert!(!timer.is_running());

        // Give a tick that was mid-flight time to land
        thread::sleep(Duration::from_millis(30));
        let after_cancel = ticks.load(Ordering::SeqCst);
        assert!(after_cancel >= 1);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), after_cancel);
    }

    #[test]
    fn test_drop_cancels_before_first_tick() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let timer = RefreshTimer::start(Duration::from_secs(60), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(timer);
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_does_not_wait_for_slow_tick() {
        let published = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(AtomicUsize::new(0));
        let (published_in, started_in) = (Arc::clone(&published), Arc::clone(&started));
        let mut timer = RefreshTimer::start(Duration::from_millis(10), move |flag| {
            started_in.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(600));
            if !flag.is_cancelled() {
                published_in.fetch_add(1, Ordering::SeqCst);
            }
        });

        thread::sleep(Duration::from_millis(100));
        assert_eq!(started.load(Ordering::SeqCst), 1);

        let begin = Instant::now();
        timer.cancel();
        assert!(begin.elapsed() < Duration::from_millis(200));

        // The running tick sees the flag and drops its result
        thread::sleep(Duration::from_millis(800));
        assert_eq!(published.load(Ordering::SeqCst), 0);
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }
}
