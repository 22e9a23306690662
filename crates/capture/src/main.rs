use anyhow::Context;
use camera_capture::{CameraCapture, CaptureConfig, Frame};
use common::setup_logging;
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    flag,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Interval between two stats lines.
const STATS_PERIOD: Duration = Duration::from_secs(5);

fn main() -> anyhow::Result<()> {
    let config = CaptureConfig::from_env().context("Invalid capture configuration")?;
    setup_logging(config.environment);

    let shutdown = Arc::new(AtomicBool::new(false));
    flag::register(SIGTERM, Arc::clone(&shutdown))?;
    flag::register(SIGINT, Arc::clone(&shutdown))?;

    tracing::info!("Signal handlers registered (SIGTERM, SIGINT)");

    let read_fps = config.read_fps;
    let read_period = config.read_period();

    let capture = CameraCapture::open(config);
    if !capture.is_opened() {
        anyhow::bail!(
            "Camera {} could not be opened - check device availability",
            capture.config().device_id
        );
    }

    tracing::info!("Reading latest frame at {:.1} Hz", read_fps);

    let mut frame = Frame::default();
    let mut reads = 0u64;
    let mut fresh = 0u64;
    let mut last_stats = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        let start = Instant::now();

        let outcome = capture.read_outcome(&mut frame);
        reads += 1;
        if outcome.is_ok() {
            fresh += 1;
            tracing::trace!(
                "Frame {}x{}x{} ({} bytes)",
                frame.width(),
                frame.height(),
                frame.channels(),
                frame.len()
            );
        } else {
            tracing::debug!("No fresh frame: {:?}", outcome);
        }

        if last_stats.elapsed() >= STATS_PERIOD {
            let stats = capture.stats();
            tracing::info!(
                "Status: [Reads: {}] [Fresh: {}] [Published: {}] [Dropped: {}] [Last: {}x{}]",
                reads,
                fresh,
                stats.published,
                stats.dropped(),
                frame.width(),
                frame.height()
            );
            last_stats = Instant::now();
        }

        let elapsed = start.elapsed();
        if elapsed < read_period {
            std::thread::sleep(read_period - elapsed);
        }
    }

    tracing::info!("Shutdown: {} reads, {} with a fresh frame", reads, fresh);
    Ok(())
}
