use crate::acquisition::AcquisitionLoop;
use crate::config::{CaptureConfig, SourceKind};
use crate::device::{CaptureDevice, PatternDevice};
use crate::frame::Frame;
use crate::slot::{LatestFrame, Outcome};
use crate::stats::{CaptureStats, StatsSnapshot};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

fn open_device(config: &CaptureConfig) -> Box<dyn CaptureDevice> {
    let pattern = || -> Box<dyn CaptureDevice> {
        Box::new(PatternDevice::new(
            config.pattern.width,
            config.pattern.height,
            config.pattern.fps,
        ))
    };

    match config.source {
        #[cfg(feature = "v4l2")]
        SourceKind::V4l2 => Box::new(crate::device::V4l2Device::open(config.device_id)),
        #[cfg(not(feature = "v4l2"))]
        SourceKind::V4l2 => {
            tracing::warn!("Built without V4L2 support, using the pattern source instead");
            pattern()
        }
        SourceKind::Pattern => pattern(),
    }
}

/// Latest-frame camera reader.
///
/// Construction opens the device and starts a detached acquisition thread
/// that keeps overwriting a single shared frame. [`read`](Self::read) copies
/// that frame out without ever waiting on the device, so callers may poll at
/// any rate.
///
/// Dropping the capture asks the acquisition thread to stop. The thread is
/// not joined: it exits once its current `grab` returns.
pub struct CameraCapture<D: CaptureDevice = Box<dyn CaptureDevice>> {
    device: Arc<D>,
    slot: Arc<LatestFrame>,
    stats: Arc<CaptureStats>,
    shutdown: Arc<AtomicBool>,
    config: CaptureConfig,
}

impl CameraCapture {
    /// Open camera `device_id` with the default backend and settings.
    pub fn new(device_id: u32) -> Self {
        Self::open(CaptureConfig::default().with_device_id(device_id))
    }

    /// Open the backend selected by `config.source`.
    pub fn open(config: CaptureConfig) -> Self {
        let device = open_device(&config);
        Self::with_device(device, config)
    }
}

impl<D: CaptureDevice> CameraCapture<D> {
    pub fn with_device(device: D, config: CaptureConfig) -> Self {
        let device = Arc::new(device);
        let slot = Arc::new(LatestFrame::new());
        let stats = Arc::new(CaptureStats::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let acquisition = AcquisitionLoop {
            device: Arc::clone(&device),
            slot: Arc::clone(&slot),
            stats: Arc::clone(&stats),
            shutdown: Arc::clone(&shutdown),
            backoff: config.retry_backoff,
            device_id: config.device_id,
        };

        if let Err(e) = acquisition.spawn() {
            tracing::error!("Failed to start acquisition thread: {}", e);
        }

        Self {
            device,
            slot,
            stats,
            shutdown,
            config,
        }
    }

    /// Copy the latest frame into `image`.
    ///
    /// Returns `true` only if that frame came from a successful decode and no
    /// acquisition attempt has failed since. Before the first frame, `image`
    /// is overwritten with the empty frame.
    pub fn read(&self, image: &mut Frame) -> bool {
        self.read_outcome(image).is_ok()
    }

    /// Like [`read`](Self::read), returning the detailed outcome.
    pub fn read_outcome(&self, image: &mut Frame) -> Outcome {
        self.slot.read_into(image)
    }

    pub fn outcome(&self) -> Outcome {
        self.slot.outcome()
    }

    pub fn is_opened(&self) -> bool {
        self.device.is_opened()
    }

    /// Set a device property (see [`crate::device::props`]).
    pub fn set(&self, property_id: u32, value: f64) -> bool {
        self.device.set(property_id, value)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: CaptureDevice> Drop for CameraCapture<D> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl<D: CaptureDevice> std::fmt::Debug for CameraCapture<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("device_id", &self.config.device_id)
            .field("opened", &self.is_opened())
            .field("outcome", &self.outcome())
            .field("stats", &self.stats())
            .finish()
    }
}
