/// Time-bounded disk-usage probing.
///
/// A freshly attached volume may still be initialising and the OS call can
/// hang. Each probe runs on its own thread and holds one of `max_inflight`
/// slots until the OS call returns. A caller waits for a free slot and then
/// for the answer, both within one `timeout` budget, so a burst of arrivals
/// queues behind healthy probes while stuck ones cannot pile up threads.
use crate::error::ProbeError;
use crate::model::{SizeInfo, VolumeId};
use crate::platform::UsageProber;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct BoundedProber {
    inner: Arc<dyn UsageProber>,
    timeout: Duration,
    max_inflight: usize,
    /// One token per free slot.
    free: Receiver<()>,
    release: Sender<()>,
}

/// Hands its slot back when the probe thread finishes.
struct SlotGuard(Sender<()>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let _ = self.0.try_send(());
    }
}

impl BoundedProber {
    pub fn new(inner: Arc<dyn UsageProber>, timeout: Duration, max_inflight: usize) -> Self {
        let max_inflight = max_inflight.max(1);
        let (release, free) = crossbeam_channel::bounded(max_inflight);
        for _ in 0..max_inflight {
            let _ = release.try_send(());
        }
        Self {
            inner,
            timeout,
            max_inflight,
            free,
            release,
        }
    }

    /// Probe threads that have not returned yet.
    pub fn inflight(&self) -> usize {
        self.max_inflight - self.free.len()
    }

    pub fn probe(&self, id: &VolumeId) -> Result<SizeInfo, ProbeError> {
        let deadline = Instant::now() + self.timeout;
        let slot = self.acquire_slot(id, deadline)?;

        let (tx, rx) = crossbeam_channel::bounded(1);
        let inner = Arc::clone(&self.inner);
        let volume = id.clone();
        std::thread::Builder::new()
            .name("drivewatch-probe".to_owned())
            .spawn(move || {
                let _slot = slot;
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(inner.probe(&volume));
            })
            .map_err(|e| ProbeError::Worker {
                volume: id.to_string(),
                reason: e.to_string(),
            })?;

        match rx.recv_deadline(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                debug!("Probe: {} still running after {:?}", id, self.timeout);
                Err(ProbeError::TimedOut {
                    volume: id.to_string(),
                    timeout_ms: self.timeout_ms(),
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(ProbeError::Worker {
                volume: id.to_string(),
                reason: "probe thread exited without a result".into(),
            }),
        }
    }

    /// Wait until `deadline` for a slot. Only probes still stuck in the OS
    /// for the whole wait make this fail.
    fn acquire_slot(&self, id: &VolumeId, deadline: Instant) -> Result<SlotGuard, ProbeError> {
        match self.free.recv_deadline(deadline) {
            Ok(()) => Ok(SlotGuard(self.release.clone())),
            Err(_) => {
                debug!("Probe: no free slot for {} within {:?}", id, self.timeout);
                Err(ProbeError::Saturated {
                    volume: id.to_string(),
                    inflight: self.max_inflight,
                })
            }
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    struct FixedProber(SizeInfo);

    impl UsageProber for FixedProber {
        fn probe(&self, _id: &VolumeId) -> Result<SizeInfo, ProbeError> {
            Ok(self.0)
        }
    }

    /// Answers after a fixed delay, like a slow but healthy drive.
    struct SlowProber(Duration);

    impl UsageProber for SlowProber {
        fn probe(&self, _id: &VolumeId) -> Result<SizeInfo, ProbeError> {
            std::thread::sleep(self.0);
            Ok(SizeInfo {
                total_bytes: 10,
                free_bytes: 5,
            })
        }
    }

    /// Blocks every probe until the gate is opened (sender dropped).
    struct GatedProber {
        gate: Receiver<()>,
    }

    impl UsageProber for GatedProber {
        fn probe(&self, id: &VolumeId) -> Result<SizeInfo, ProbeError> {
            let _ = self.gate.recv();
            Err(ProbeError::Worker {
                volume: id.to_string(),
                reason: "gate opened".into(),
            })
        }
    }

    fn gated() -> (Sender<()>, Arc<dyn UsageProber>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let inner: Arc<dyn UsageProber> = Arc::new(GatedProber { gate: rx });
        (tx, inner)
    }

    fn wait_until_idle(prober: &BoundedProber) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while prober.inflight() > 0 {
            assert!(Instant::now() < deadline, "probe threads never finished");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_probe_passes_result_through() {
        let info = SizeInfo {
            total_bytes: 100,
            free_bytes: 40,
        };
        let prober = BoundedProber::new(Arc::new(FixedProber(info)), Duration::from_secs(5), 2);
        assert_eq!(prober.probe(&"E:\\".into()).unwrap(), info);
        wait_until_idle(&prober);
    }

    #[test]
    fn test_hung_probe_times_out() {
        let (gate, inner) = gated();
        let prober = BoundedProber::new(inner, Duration::from_millis(50), 4);

        let started = Instant::now();
        let err = prober.probe(&"E:\\".into()).unwrap_err();
        assert!(matches!(err, ProbeError::TimedOut { timeout_ms: 50, .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(prober.inflight(), 1);

        drop(gate);
        wait_until_idle(&prober);
    }

    #[test]
    fn test_stuck_probes_saturate_then_recover() {
        let (gate, inner) = gated();
        let prober = BoundedProber::new(inner, Duration::from_millis(100), 1);

        assert!(matches!(
            prober.probe(&"E:\\".into()),
            Err(ProbeError::TimedOut { .. })
        ));
        assert!(matches!(
            prober.probe(&"F:\\".into()),
            Err(ProbeError::Saturated { inflight: 1, .. })
        ));
        // A refused attempt must not leak its slot.
        assert_eq!(prober.inflight(), 1);

        drop(gate);
        wait_until_idle(&prober);
        assert!(matches!(
            prober.probe(&"G:\\".into()),
            Err(ProbeError::Worker { .. })
        ));
    }

    #[test]
    fn test_burst_beyond_cap_waits_for_healthy_probes() {
        let prober = Arc::new(BoundedProber::new(
            Arc::new(SlowProber(Duration::from_millis(100))),
            Duration::from_millis(2500),
            4,
        ));
        let barrier = Arc::new(Barrier::new(5));

        let workers: Vec<_> = ["D:\\", "E:\\", "F:\\", "G:\\", "H:\\"]
            .into_iter()
            .map(|letter| {
                let prober = Arc::clone(&prober);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    prober.probe(&letter.into())
                })
            })
            .collect();

        for worker in workers {
            let result = worker.join().unwrap();
            assert!(result.is_ok(), "probe refused during a healthy burst: {result:?}");
        }
        wait_until_idle(&prober);
    }
}
