/// Drive monitor — the long-lived poll loop.
///
/// A dedicated background thread ticks the [`DriveTracker`] at a fixed
/// interval and hands every event to the [`Dispatcher`]. The thread owns the
/// tracker outright, so the known-volume snapshot needs no lock.
///
/// # Usage
///
/// ```ignore
/// let signal = StopSignal::new();
/// let handle = start_monitor(tracker, dispatcher, Duration::from_secs(1), signal.clone())?;
/// // ... later, e.g. from a Ctrl-C handler:
/// signal.stop();
/// handle.join();
/// ```
///
/// # Cancellation
///
/// [`StopSignal::stop`] sets the cancel flag and wakes the thread out of
/// its inter-tick wait. The loop finishes the tick in progress and exits.
/// A signal stopped before the monitor starts makes it exit without ticking.
/// Session threads spawned for arrivals are left running.
pub mod tracker;

pub use tracker::{diff, DriveTracker, Tick};

use crate::browse::ListingBrowser;
use crate::config::Config;
use crate::dispatch::{BoundedProber, ConsoleNotifier, Dispatcher, ThreadSpawner};
use crate::error::FatalStartupError;
use crate::logging::{LogLevel, LogSink};
use crate::model::VolumeSnapshot;
use crate::platform::{SystemEnumerator, SystemProber, VolumeEnumerator};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

/// Name of the poll thread.
pub const MONITOR_THREAD_NAME: &str = "drivewatch-monitor";

/// Cloneable stop request for a monitor. Safe to call from a signal handler
/// thread, and may be created (and fired) before the monitor is started.
#[derive(Clone)]
pub struct StopSignal {
    cancel: Arc<AtomicBool>,
    wake: Sender<()>,
    woken: Receiver<()>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (wake, woken) = crossbeam_channel::bounded(1);
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            wake,
            woken,
        }
    }

    /// Request shutdown. Non-blocking and idempotent.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
        let _ = self.wake.try_send(());
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

/// Handle to the running poll thread.
///
/// Dropping the handle (and every [`StopSignal`] cloned from it) also stops
/// the loop, since nothing could wake it any more.
pub struct MonitorHandle {
    signal: StopSignal,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Signal the poll thread to stop. Non-blocking.
    pub fn stop(&self) {
        self.signal.stop();
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.signal.clone()
    }

    /// Wait for the poll thread to exit. Returns `false` if it panicked.
    pub fn join(mut self) -> bool {
        match self.thread.take() {
            Some(thread) => thread.join().is_ok(),
            None => true,
        }
    }
}

/// Start polling on a background thread.
///
/// The first tick runs immediately (seeding the tracker if it was built
/// unseeded); after that the thread waits `interval` between ticks.
pub fn start_monitor<E>(
    tracker: DriveTracker<E>,
    dispatcher: Dispatcher,
    interval: Duration,
    signal: StopSignal,
) -> Result<MonitorHandle, FatalStartupError>
where
    E: VolumeEnumerator + 'static,
{
    let cancel = Arc::clone(&signal.cancel);
    let woken = signal.woken.clone();

    let thread = std::thread::Builder::new()
        .name(MONITOR_THREAD_NAME.to_owned())
        .spawn(move || {
            run_monitor(tracker, dispatcher, interval, cancel, woken);
        })
        .map_err(|source| FatalStartupError::Spawn {
            what: "monitor",
            source,
        })?;

    Ok(MonitorHandle {
        signal,
        thread: Some(thread),
    })
}

/// Wire the host enumerator, prober, browser and notifier together and start
/// polling.
///
/// Enumerates once up front: a host that cannot list its volumes at all is a
/// startup failure rather than an endless stream of skipped ticks. That
/// enumeration seeds the tracker.
pub fn launch(
    config: &Config,
    sink: Arc<dyn LogSink>,
    signal: StopSignal,
) -> Result<MonitorHandle, FatalStartupError> {
    config.validate()?;

    let enumerator = SystemEnumerator::new(config.mount_roots.clone());
    let initial = enumerator.enumerate()?;
    log_connected(sink.as_ref(), &initial);

    let prober = BoundedProber::new(
        Arc::new(SystemProber),
        config.probe_timeout(),
        config.max_inflight_probes,
    );
    let dispatcher = Dispatcher::new(
        Arc::new(prober),
        Arc::new(ListingBrowser),
        Arc::new(ConsoleNotifier),
        sink,
        Arc::new(ThreadSpawner),
    );

    start_monitor(
        DriveTracker::seeded(enumerator, initial),
        dispatcher,
        config.poll_interval(),
        signal,
    )
}

fn log_connected(sink: &dyn LogSink, snapshot: &VolumeSnapshot) {
    sink.log(
        LogLevel::Info,
        &format!("Currently connected drives: {}", snapshot.describe()),
    );
}

// ─── Background thread ──────────────────────────────────────────────────────

fn run_monitor<E: VolumeEnumerator>(
    mut tracker: DriveTracker<E>,
    dispatcher: Dispatcher,
    interval: Duration,
    cancel: Arc<AtomicBool>,
    wake: Receiver<()>,
) {
    debug!("Monitor: polling every {:?}", interval);
    let sink = Arc::clone(dispatcher.sink());

    while !cancel.load(Ordering::Relaxed) {
        match tracker.tick() {
            Tick::Seeded(snapshot) => log_connected(sink.as_ref(), &snapshot),
            Tick::Changed(events) => {
                for event in events {
                    dispatcher.dispatch(event);
                }
            }
            Tick::Skipped(e) => {
                let state = if tracker.is_seeded() {
                    "keeping previous drive list"
                } else {
                    "no drive list yet"
                };
                sink.log(LogLevel::Warning, &format!("{e}; {state}"));
            }
        }

        if cancel.load(Ordering::Relaxed) {
            break;
        }
        match wake.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if !cancel.load(Ordering::Relaxed) {
                    debug!("Monitor: every stop handle dropped");
                }
                break;
            }
        }
    }

    debug!("Monitor: stopped");
}
