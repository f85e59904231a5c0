/// Event dispatcher — fans tracker events out to the log, the browse
/// session, the removal notice and any subscribers.
///
/// Runs on the poll thread but never blocks it: everything slow for an
/// arrival (size probe, browse session) happens inside a spawned task.
pub mod notify;
pub mod probe;
pub mod spawner;

use crate::browse::{BrowseSession, Browser};
use crate::logging::{LogLevel, LogSink};
use crate::model::{DriveEvent, VolumeId};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;

pub use notify::{ConsoleNotifier, Notifier};
pub use probe::BoundedProber;
pub use spawner::{InlineSpawner, Spawner, Task, ThreadSpawner};

/// Name given to each per-arrival session thread.
pub const SESSION_THREAD_NAME: &str = "drivewatch-session";

pub struct Dispatcher {
    prober: Arc<BoundedProber>,
    browser: Arc<dyn Browser>,
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn LogSink>,
    spawner: Arc<dyn Spawner>,
    subscribers: Vec<Sender<DriveEvent>>,
}

impl Dispatcher {
    pub fn new(
        prober: Arc<BoundedProber>,
        browser: Arc<dyn Browser>,
        notifier: Arc<dyn Notifier>,
        sink: Arc<dyn LogSink>,
        spawner: Arc<dyn Spawner>,
    ) -> Self {
        Self {
            prober,
            browser,
            notifier,
            sink,
            spawner,
            subscribers: Vec::new(),
        }
    }

    /// Receive every published event. `Connected` events are published from
    /// the session task once the size probe has answered, so they carry
    /// `size_info` when it was available.
    pub fn subscribe(&mut self) -> Receiver<DriveEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    pub fn dispatch(&self, event: DriveEvent) {
        match event {
            DriveEvent::Connected { .. } => self.on_connected(event),
            DriveEvent::Disconnected { .. } => self.on_disconnected(event),
        }
    }

    fn on_disconnected(&self, event: DriveEvent) {
        self.sink.log(
            LogLevel::Disconnect,
            &format!("USB drive removed: {}", event.id()),
        );
        self.notifier.notify_removed(event.id());
        publish(&self.subscribers, event);
    }

    fn on_connected(&self, event: DriveEvent) {
        let id = event.id().clone();
        self.sink
            .log(LogLevel::Connect, &format!("USB drive connected: {id}"));

        let prober = Arc::clone(&self.prober);
        let browser = Arc::clone(&self.browser);
        let sink = Arc::clone(&self.sink);
        let subscribers = self.subscribers.clone();
        let pending = event.clone();
        let task: Task = Box::new(move || {
            run_session(id, pending, &prober, browser, sink, &subscribers);
        });

        if let Err(e) = self.spawner.spawn(SESSION_THREAD_NAME, task) {
            self.sink.log(
                LogLevel::Error,
                &format!("Failed to start session for {}: {e}", event.id()),
            );
            publish(&self.subscribers, event);
        }
    }
}

/// Per-arrival work: probe, publish, then browse.
fn run_session(
    id: VolumeId,
    event: DriveEvent,
    prober: &BoundedProber,
    browser: Arc<dyn Browser>,
    sink: Arc<dyn LogSink>,
    subscribers: &[Sender<DriveEvent>],
) {
    let size_info = match prober.probe(&id) {
        Ok(info) => {
            sink.log(LogLevel::Info, &format!("Drive {id} - {}", info.describe()));
            Some(info)
        }
        Err(e) => {
            sink.log(
                LogLevel::Warning,
                &format!("Could not get disk information for {id}: {e}"),
            );
            None
        }
    };
    publish(subscribers, event.with_size(size_info));

    let session = BrowseSession::new(id.as_path(), Arc::clone(&sink));
    if let Err(e) = browser.open(session) {
        sink.log(LogLevel::Error, &format!("Error reading drive {id}: {e}"));
    }
}

/// Subscribers that went away are skipped; sending never blocks.
fn publish(subscribers: &[Sender<DriveEvent>], event: DriveEvent) {
    for tx in subscribers {
        let _ = tx.send(event.clone());
    }
}
