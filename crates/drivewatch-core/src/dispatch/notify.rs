/// Removal notices.
use crate::model::VolumeId;
use std::io::Write;

/// Tells the user a volume went away.
pub trait Notifier: Send + Sync {
    fn notify_removed(&self, id: &VolumeId);
}

/// Prints `Drive X disconnected.` on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

/// Text of the removal notice.
pub fn removal_notice(id: &VolumeId) -> String {
    format!("Drive {id} disconnected.")
}

impl Notifier for ConsoleNotifier {
    fn notify_removed(&self, id: &VolumeId) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", removal_notice(id));
    }
}
