//! Periodic refresh trigger.
//!
//! `RefreshScheduler::start` spawns a background thread that runs a job once
//! per interval and returns a `RefreshHandle`. Stopping through the handle
//! guarantees no further firings; a job that is already running is not
//! interrupted. Ticks missed while a job runs are dropped rather than queued,
//! so a slow job never causes a burst of back-to-back runs.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, bounded, select, tick};
use log::{error, info};

/// Default refresh interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Starts periodic jobs.
pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Run `job` every `interval` on a background thread, first one interval from now.
    pub fn start<F>(interval: Duration, mut job: F) -> RefreshHandle
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let stopped = Arc::new(AtomicBool::new(false));
        let stopped_flag = Arc::clone(&stopped);
        let ticker = tick(interval);

        let thread = thread::spawn(move || {
            info!("Refresh scheduler started, interval {:?}", interval);
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => {
                        if stopped_flag.load(Ordering::SeqCst) {
                            break;
                        }
                        job();
                        // Ticks that fell due while the job ran are skipped.
                        while ticker.try_recv().is_ok() {}
                    }
                }
            }
            info!("Refresh scheduler stopped");
        });

        RefreshHandle {
            stop_tx,
            stopped,
            thread: Some(thread),
        }
    }
}

/// Handle of a running scheduler. Dropping it stops the scheduler.
pub struct RefreshHandle {
    stop_tx: Sender<()>,
    stopped: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Prevent any further firing. Does not wait for a running job.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.stop_tx.try_send(());
    }

    /// Stop and wait for a running job to finish.
    pub fn join(mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Refresh scheduler thread panicked");
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn fires_repeatedly_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = RefreshScheduler::start(Duration::from_millis(20), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(150));
        handle.stop();
        thread::sleep(Duration::from_millis(30));
        let after_stop = count.load(Ordering::SeqCst);
        assert!(after_stop >= 2, "fired {} times", after_stop);

        thread::sleep(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
        handle.join();
    }

    #[test]
    fn stop_lets_the_running_job_finish_and_prevents_the_next() {
        let (started_tx, started_rx) = bounded::<()>(4);
        let finished = Arc::new(AtomicUsize::new(0));
        let finished_count = Arc::clone(&finished);
        let handle = RefreshScheduler::start(Duration::from_millis(10), move || {
            let _ = started_tx.send(());
            thread::sleep(Duration::from_millis(80));
            finished_count.fetch_add(1, Ordering::SeqCst);
        });

        started_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        handle.stop();
        handle.join();

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(started_rx.try_recv().is_err());
    }

    #[test]
    fn slow_job_is_not_followed_by_a_catch_up_run() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = RefreshScheduler::start(Duration::from_millis(100), move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                thread::sleep(Duration::from_millis(300));
            }
        });

        // First run ends around 400ms, the next one is due around 500ms.
        thread::sleep(Duration::from_millis(450));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        handle.join();
    }

    #[test]
    fn dropping_the_handle_stops_firing() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = RefreshScheduler::start(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(handle);

        thread::sleep(Duration::from_millis(60));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
