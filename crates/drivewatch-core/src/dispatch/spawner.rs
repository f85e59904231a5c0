/// Task spawning for per-arrival work.
///
/// The poll loop never waits on what it spawns. Production code runs each
/// task on a detached, named thread; tests can run tasks inline to keep
/// ordering deterministic.
use std::io;

/// A unit of fire-and-forget work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Spawner: Send + Sync {
    /// Start `task`. Returns once the task is scheduled, not when it ends.
    fn spawn(&self, name: &str, task: Task) -> io::Result<()>;
}

/// One detached OS thread per task.
///
/// The join handle is dropped, so nothing ever waits for the thread and a
/// panic inside it only ends that thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(&self, name: &str, task: Task) -> io::Result<()> {
        std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(task)
            .map(drop)
    }
}

/// Runs the task on the caller's thread before returning.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineSpawner;

impl Spawner for InlineSpawner {
    fn spawn(&self, _name: &str, task: Task) -> io::Result<()> {
        task();
        Ok(())
    }
}
