use crate::device::CaptureDevice;
use crate::frame::Frame;
use crate::slot::{LatestFrame, Outcome};
use crate::stats::CaptureStats;
use std::io;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

/// Published frames between two status lines.
const STATUS_INTERVAL: u64 = 30;

/// Background producer keeping [`LatestFrame`] as fresh as the device allows.
///
/// The slot lock is taken only around `retrieve` and the swap that publishes
/// its result. `grab` and the failure backoff run unlocked, so a stalled
/// device never stalls readers.
pub(crate) struct AcquisitionLoop<D> {
    pub device: Arc<D>,
    pub slot: Arc<LatestFrame>,
    pub stats: Arc<CaptureStats>,
    pub shutdown: Arc<AtomicBool>,
    pub backoff: Duration,
    pub device_id: u32,
}

impl<D: CaptureDevice> AcquisitionLoop<D> {
    /// Start the loop on its own thread and detach it.
    pub fn spawn(self) -> io::Result<()> {
        thread::Builder::new()
            .name(format!("acquisition-{}", self.device_id))
            .spawn(move || self.run())
            .map(drop)
    }

    pub fn run(self) {
        let span = tracing::info_span!("acquisition", device_id = self.device_id);
        let _enter = span.enter();

        if !self.device.is_opened() {
            tracing::error!("Could not open camera, no frames will be published");
            self.slot.mark(Outcome::DeviceNotOpen);
            return;
        }

        tracing::info!("Acquisition started (retry backoff {:?})", self.backoff);

        let mut scratch = Frame::default();
        let mut failure_streak = 0u64;

        while !self.shutdown.load(Ordering::Relaxed) {
            if !self.device.grab() {
                self.slot.mark(Outcome::AcquireFailed);
                self.stats.record_acquire_failure();
                failure_streak += 1;
                thread::sleep(self.backoff);
                tracing::warn!(
                    "Error while grabbing new frame ({} consecutive failures)",
                    failure_streak
                );
                continue;
            }

            if failure_streak > 0 {
                tracing::info!("Camera recovered after {} failed grabs", failure_streak);
                failure_streak = 0;
            }

            let device = &self.device;
            if self
                .slot
                .publish_with(&mut scratch, |frame| device.retrieve(frame))
            {
                let published = self.stats.record_published();
                if published.is_multiple_of(STATUS_INTERVAL) {
                    let snapshot = self.stats.snapshot();
                    tracing::debug!(
                        "Status: [Frames: {}] [Acquire failures: {}] [Decode failures: {}]",
                        snapshot.published,
                        snapshot.acquire_failures,
                        snapshot.decode_failures
                    );
                }
            } else {
                let failures = self.stats.record_decode_failure();
                tracing::warn!("Error while decoding frame (total decode failures: {})", failures);
            }
        }

        let snapshot = self.stats.snapshot();
        tracing::info!(
            "Acquisition stopped: {} frames published, {} dropped",
            snapshot.published,
            snapshot.dropped()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsSnapshot;
    use std::sync::atomic::AtomicUsize;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[derive(Clone, Default)]
    struct LevelCounter {
        debug: Arc<AtomicUsize>,
        info: Arc<AtomicUsize>,
        warn: Arc<AtomicUsize>,
        error: Arc<AtomicUsize>,
    }

    impl<S: Subscriber> Layer<S> for LevelCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let counter = match *event.metadata().level() {
                Level::ERROR => &self.error,
                Level::WARN => &self.warn,
                Level::INFO => &self.info,
                _ => &self.debug,
            };
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Fails every grab and raises the stop flag after `fail_limit` attempts.
    struct FailingDevice {
        opened: bool,
        fail_limit: usize,
        grabs: AtomicUsize,
        open_checks: AtomicUsize,
        shutdown: Arc<AtomicBool>,
    }

    impl CaptureDevice for FailingDevice {
        fn is_opened(&self) -> bool {
            self.open_checks.fetch_add(1, Ordering::SeqCst);
            self.opened
        }

        fn grab(&self) -> bool {
            if self.grabs.fetch_add(1, Ordering::SeqCst) + 1 >= self.fail_limit {
                self.shutdown.store(true, Ordering::SeqCst);
            }
            false
        }

        fn retrieve(&self, _frame: &mut Frame) -> bool {
            unreachable!("retrieve after a failed grab")
        }

        fn set(&self, _property_id: u32, _value: f64) -> bool {
            false
        }
    }

    type Finished = (
        Arc<FailingDevice>,
        Arc<LatestFrame>,
        Arc<CaptureStats>,
        LevelCounter,
    );

    /// Run the loop to completion on this thread with a counting subscriber.
    fn run_logged(opened: bool, fail_limit: usize, backoff: Duration) -> Finished {
        let shutdown = Arc::new(AtomicBool::new(false));
        let device = Arc::new(FailingDevice {
            opened,
            fail_limit,
            grabs: AtomicUsize::new(0),
            open_checks: AtomicUsize::new(0),
            shutdown: Arc::clone(&shutdown),
        });
        let slot = Arc::new(LatestFrame::new());
        let stats = Arc::new(CaptureStats::default());
        let counter = LevelCounter::default();

        let acquisition = AcquisitionLoop {
            device: Arc::clone(&device),
            slot: Arc::clone(&slot),
            stats: Arc::clone(&stats),
            shutdown,
            backoff,
            device_id: 0,
        };

        let subscriber = tracing_subscriber::registry().with(counter.clone());
        tracing::subscriber::with_default(subscriber, || acquisition.run());

        (device, slot, stats, counter)
    }

    #[test]
    fn test_closed_device_exits_after_one_check() {
        let (device, slot, stats, counter) = run_logged(false, usize::MAX, Duration::ZERO);

        assert_eq!(device.open_checks.load(Ordering::SeqCst), 1);
        assert_eq!(device.grabs.load(Ordering::SeqCst), 0);
        assert_eq!(slot.outcome(), Outcome::DeviceNotOpen);
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
        assert_eq!(counter.error.load(Ordering::SeqCst), 1, "Open failure logged once");
    }

    #[test]
    fn test_one_warning_and_one_backoff_per_failed_grab() {
        let backoff = Duration::from_millis(20);
        let start = std::time::Instant::now();
        let (device, slot, stats, counter) = run_logged(true, 5, backoff);

        assert_eq!(device.grabs.load(Ordering::SeqCst), 5);
        assert!(start.elapsed() >= backoff * 5);
        assert_eq!(counter.warn.load(Ordering::SeqCst), 5);
        assert_eq!(stats.snapshot().acquire_failures, 5);
        assert_eq!(slot.outcome(), Outcome::AcquireFailed);
    }

    #[test]
    fn test_failed_grab_produces_no_other_events() {
        let (_, _, _, counter) = run_logged(true, 3, Duration::ZERO);

        assert_eq!(counter.warn.load(Ordering::SeqCst), 3);
        assert_eq!(counter.debug.load(Ordering::SeqCst), 0);
        assert_eq!(counter.error.load(Ordering::SeqCst), 0);
        // Start and stop lines only.
        assert_eq!(counter.info.load(Ordering::SeqCst), 2);
    }
}
