/// Drive-state tracker — the set-difference state machine.
///
/// Holds the last successfully enumerated snapshot and turns each fresh
/// snapshot into `Connected`/`Disconnected` events. The snapshot is only
/// reachable through [`DriveTracker::tick`].
use crate::error::EnumerationError;
use crate::model::{DriveEvent, VolumeSnapshot};
use crate::platform::VolumeEnumerator;

/// Outcome of one tick.
#[derive(Debug)]
pub enum Tick {
    /// First successful enumeration of a tracker built with
    /// [`DriveTracker::new`]. Nothing is reported as arrived; the snapshot is
    /// what was already mounted.
    Seeded(VolumeSnapshot),
    /// Events computed against the previous snapshot. Empty when nothing
    /// changed.
    Changed(Vec<DriveEvent>),
    /// Enumeration failed. State is untouched and no events were produced.
    Skipped(EnumerationError),
}

impl Tick {
    /// Events produced by this tick (none for `Seeded` and `Skipped`).
    pub fn events(&self) -> &[DriveEvent] {
        match self {
            Self::Changed(events) => events,
            Self::Seeded(_) | Self::Skipped(_) => &[],
        }
    }
}

/// Events that take `previous` to `next`: one `Connected` per id in
/// `next − previous`, then one `Disconnected` per id in `previous − next`.
///
/// Order within each group follows set iteration and is unspecified.
pub fn diff(previous: &VolumeSnapshot, next: &VolumeSnapshot) -> Vec<DriveEvent> {
    let arrived = next
        .difference(previous)
        .cloned()
        .map(DriveEvent::connected);
    let removed = previous
        .difference(next)
        .cloned()
        .map(DriveEvent::disconnected);
    arrived.chain(removed).collect()
}

/// Owns the enumerator and the currently known snapshot.
pub struct DriveTracker<E> {
    enumerator: E,
    /// `None` until the first successful enumeration.
    state: Option<VolumeSnapshot>,
}

impl<E: VolumeEnumerator> DriveTracker<E> {
    pub fn new(enumerator: E) -> Self {
        Self {
            enumerator,
            state: None,
        }
    }

    /// Tracker whose state is the startup enumeration. Its first tick already
    /// diffs, so a volume attached after `snapshot` was taken is reported even
    /// if the next enumeration fails.
    pub fn seeded(enumerator: E, snapshot: VolumeSnapshot) -> Self {
        Self {
            enumerator,
            state: Some(snapshot),
        }
    }

    /// Whether a snapshot has been captured yet.
    pub fn is_seeded(&self) -> bool {
        self.state.is_some()
    }

    /// Enumerate, diff against the stored snapshot and replace it.
    pub fn tick(&mut self) -> Tick {
        let next = match self.enumerator.enumerate() {
            Ok(snapshot) => snapshot,
            Err(e) => return Tick::Skipped(e),
        };

        let tick = match &self.state {
            None => Tick::Seeded(next.clone()),
            Some(previous) => Tick::Changed(diff(previous, &next)),
        };
        self.state = Some(next);
        tick
    }

    #[cfg(test)]
    fn state(&self) -> Option<&VolumeSnapshot> {
        self.state.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VolumeId;
    use parking_lot::Mutex;
    use std::collections::{HashSet, VecDeque};

    /// Replays a fixed script of enumeration results, one per call.
    struct Scripted(Mutex<VecDeque<Result<VolumeSnapshot, EnumerationError>>>);

    impl Scripted {
        fn new(steps: Vec<Result<VolumeSnapshot, EnumerationError>>) -> Self {
            Self(Mutex::new(steps.into()))
        }
    }

    impl VolumeEnumerator for Scripted {
        fn enumerate(&self) -> Result<VolumeSnapshot, EnumerationError> {
            self.0
                .lock()
                .pop_front()
                .expect("enumeration script exhausted")
        }
    }

    fn snap(ids: &[&str]) -> VolumeSnapshot {
        ids.iter().copied().map(VolumeId::from).collect()
    }

    fn fail() -> Result<VolumeSnapshot, EnumerationError> {
        Err(EnumerationError::Os(std::io::Error::new(
            std::io::ErrorKind::Other,
            "transient",
        )))
    }

    fn ids_of(events: &[DriveEvent], connected: bool) -> HashSet<String> {
        events
            .iter()
            .filter(|e| e.is_connected() == connected)
            .map(|e| e.id().to_string())
            .collect()
    }

    #[test]
    fn test_diff_partitions_snapshot_pair() {
        let cases = [
            (snap(&[]), snap(&[])),
            (snap(&["A"]), snap(&[])),
            (snap(&[]), snap(&["A", "B"])),
            (snap(&["A", "B", "C"]), snap(&["B", "C", "D"])),
            (snap(&["A", "B"]), snap(&["C", "D"])),
            (snap(&["A", "B"]), snap(&["A", "B"])),
        ];

        for (p, n) in cases {
            let events = diff(&p, &n);
            let arrived = ids_of(&events, true);
            let removed = ids_of(&events, false);

            assert!(arrived.is_disjoint(&removed));
            assert_eq!(arrived.len() + removed.len(), events.len(), "duplicate event");

            // N = (P − removed) ∪ arrived
            let rebuilt: HashSet<String> = p
                .iter()
                .map(|id| id.to_string())
                .filter(|id| !removed.contains(id))
                .chain(arrived.iter().cloned())
                .collect();
            let expected: HashSet<String> = n.iter().map(|id| id.to_string()).collect();
            assert_eq!(rebuilt, expected);
        }
    }

    #[test]
    fn test_first_tick_seeds_without_events() {
        let mut t = DriveTracker::new(Scripted::new(vec![Ok(snap(&["A", "B"]))]));
        assert!(!t.is_seeded());

        let tick = t.tick();
        assert!(matches!(tick, Tick::Seeded(ref s) if *s == snap(&["A", "B"])));
        assert!(tick.events().is_empty());
        assert_eq!(t.state(), Some(&snap(&["A", "B"])));
    }

    #[test]
    fn test_same_snapshot_twice_is_idempotent() {
        let mut t = DriveTracker::new(Scripted::new(vec![
            Ok(snap(&[])),
            Ok(snap(&["A"])),
            Ok(snap(&["A"])),
        ]));
        t.tick();
        assert_eq!(t.tick().events().len(), 1);
        assert!(t.tick().events().is_empty());
    }

    #[test]
    fn test_arrival_then_removal() {
        let mut t = DriveTracker::new(Scripted::new(vec![
            Ok(snap(&[])),
            Ok(snap(&["A"])),
            Ok(snap(&[])),
        ]));
        t.tick();

        assert_eq!(t.tick().events(), &[DriveEvent::connected("A".into())]);
        assert_eq!(t.tick().events(), &[DriveEvent::disconnected("A".into())]);
        assert_eq!(t.state(), Some(&snap(&[])));
    }

    #[test]
    fn test_enumeration_failure_keeps_state() {
        let mut t = DriveTracker::new(Scripted::new(vec![
            Ok(snap(&["A"])),
            fail(),
            Ok(snap(&["A"])),
        ]));
        t.tick();

        let tick = t.tick();
        assert!(matches!(tick, Tick::Skipped(_)));
        assert!(tick.events().is_empty());
        assert_eq!(t.state(), Some(&snap(&["A"])));

        // Recovery must not report A as newly connected.
        assert!(t.tick().events().is_empty());
    }

    #[test]
    fn test_failure_before_seed_leaves_tracker_unseeded() {
        let mut t = DriveTracker::new(Scripted::new(vec![fail(), Ok(snap(&["A"]))]));
        assert!(matches!(t.tick(), Tick::Skipped(_)));
        assert!(!t.is_seeded());
        assert!(matches!(t.tick(), Tick::Seeded(_)));
    }

    #[test]
    fn test_seeded_tracker_reports_arrival_after_failed_tick() {
        let mut t = DriveTracker::seeded(
            Scripted::new(vec![fail(), Ok(snap(&["A"]))]),
            snap(&[]),
        );
        assert!(t.is_seeded());

        assert!(matches!(t.tick(), Tick::Skipped(_)));
        let tick = t.tick();
        assert!(matches!(tick, Tick::Changed(_)));
        assert_eq!(tick.events(), &[DriveEvent::connected("A".into())]);
    }

    #[test]
    fn test_seeded_tracker_never_emits_seeded() {
        let mut t = DriveTracker::seeded(Scripted::new(vec![Ok(snap(&["A"]))]), snap(&["A"]));
        let tick = t.tick();
        assert!(matches!(tick, Tick::Changed(ref events) if events.is_empty()));
    }

    #[test]
    fn test_concurrent_arrivals_each_reported_once() {
        let mut t = DriveTracker::new(Scripted::new(vec![
            Ok(snap(&[])),
            Ok(snap(&["A", "B", "C"])),
        ]));
        t.tick();

        let tick = t.tick();
        let events = tick.events();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(DriveEvent::is_connected));
        let expected: HashSet<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ids_of(events, true), expected);
    }

    #[test]
    fn test_flapping_volume_reported_on_separate_ticks() {
        let mut t = DriveTracker::new(Scripted::new(vec![
            Ok(snap(&["A"])),
            Ok(snap(&[])),
            Ok(snap(&["A"])),
        ]));
        t.tick();
        assert_eq!(t.tick().events(), &[DriveEvent::disconnected("A".into())]);
        assert_eq!(t.tick().events(), &[DriveEvent::connected("A".into())]);
    }

    #[test]
    fn test_mixed_add_and_remove_in_one_tick() {
        let mut t = DriveTracker::new(Scripted::new(vec![
            Ok(snap(&["A", "B"])),
            Ok(snap(&["B", "C"])),
        ]));
        t.tick();

        let tick = t.tick();
        let events = tick.events();
        assert_eq!(events.len(), 2);
        assert!(events.contains(&DriveEvent::connected("C".into())));
        assert!(events.contains(&DriveEvent::disconnected("A".into())));
        assert_eq!(t.state(), Some(&snap(&["B", "C"])));
    }
}
