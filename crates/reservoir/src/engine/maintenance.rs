//! # Maintenance Worker
//!
//! A single background thread that runs [`Shared::maintain`] on a fixed
//! period. It waits on a crossbeam channel with `recv_timeout`, so a stop
//! signal (or the sender being dropped) wakes it immediately.
//!
//! The worker only holds a `Weak` reference to the engine state: it never
//! keeps a destroyed engine alive.

use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use super::Shared;

pub(crate) struct MaintenanceWorker {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl MaintenanceWorker {
    pub(crate) fn spawn(shared: Weak<Shared>, interval: Duration) -> std::io::Result<Self> {
        let (stop, stop_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("reservoir-maintenance".to_string())
            .spawn(move || run(&shared, &stop_rx, interval))?;
        tracing::debug!("maintenance thread started ({:?} period)", interval);
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signals the thread and waits for the current cycle to finish.
    pub(crate) fn stop(&mut self) {
        // Full channel means a stop is already pending.
        let _ = self.stop.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("maintenance thread panicked");
            }
        }
    }
}

impl Drop for MaintenanceWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(shared: &Weak<Shared>, stop: &Receiver<()>, interval: Duration) {
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if shared.is_shutting_down() {
            break;
        }
        let report = shared.maintain();
        if report.recycled + report.disposed > 0 || !report.optimization.pools.is_empty() {
            tracing::debug!(
                "maintenance: {} recycled, {} disposed, {} pools optimized",
                report.recycled,
                report.disposed,
                report.optimization.pools.len()
            );
        }
    }
    tracing::debug!("maintenance thread stopped");
}
