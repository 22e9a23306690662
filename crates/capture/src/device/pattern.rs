use super::CaptureDevice;
use super::props::{PROP_BRIGHTNESS, PROP_FPS};
use crate::config::frame_period;
use crate::frame::Frame;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

const CHANNELS: u8 = 3;
const DEFAULT_FPS: f64 = 30.0;

#[derive(Debug)]
struct Pacing {
    next_deadline: Instant,
    tick: u64,
}

/// Synthetic camera producing a scrolling RGB gradient at a fixed frame rate.
///
/// `grab` sleeps until the next frame is due, which makes it behave like a
/// real blocking device. Useful on machines without a camera.
#[derive(Debug)]
pub struct PatternDevice {
    width: u32,
    height: u32,
    fps_bits: AtomicU64,
    brightness: AtomicI64,
    pacing: Mutex<Pacing>,
    grabbed: AtomicU64,
}

impl PatternDevice {
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        let fps = if frame_period(fps).is_some() {
            fps
        } else {
            tracing::warn!("Pattern fps {} is not usable, using {}", fps, DEFAULT_FPS);
            DEFAULT_FPS
        };
        Self {
            width,
            height,
            fps_bits: AtomicU64::new(fps.to_bits()),
            brightness: AtomicI64::new(0),
            pacing: Mutex::new(Pacing {
                next_deadline: Instant::now(),
                tick: 0,
            }),
            grabbed: AtomicU64::new(0),
        }
    }

    pub fn fps(&self) -> f64 {
        f64::from_bits(self.fps_bits.load(Ordering::Relaxed))
    }

    /// Only rates accepted by [`frame_period`] are ever stored.
    fn frame_duration(&self) -> Duration {
        frame_period(self.fps()).unwrap_or(Duration::ZERO)
    }
}

impl CaptureDevice for PatternDevice {
    fn is_opened(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    fn grab(&self) -> bool {
        let mut pacing = self.pacing.lock().unwrap_or_else(PoisonError::into_inner);

        let now = Instant::now();
        if pacing.next_deadline > now {
            std::thread::sleep(pacing.next_deadline - now);
        }
        // Late consumers do not get a burst of catch-up frames.
        pacing.next_deadline = Instant::now().max(pacing.next_deadline) + self.frame_duration();
        pacing.tick += 1;
        self.grabbed.store(pacing.tick, Ordering::Release);
        true
    }

    fn retrieve(&self, frame: &mut Frame) -> bool {
        let tick = self.grabbed.load(Ordering::Acquire);
        if tick == 0 || !self.is_opened() {
            return false;
        }

        let _s = common::span_debug!("render_pattern");
        let (width, height) = (self.width, self.height);
        let brightness = self.brightness.load(Ordering::Relaxed);
        let shift = (tick % width as u64) as u32;
        let pixels = frame.reshape(width, height, CHANNELS);

        for (y, row) in pixels
            .chunks_exact_mut(width as usize * CHANNELS as usize)
            .enumerate()
        {
            let g = ((y as u32 * 255) / height) as i64;
            for (x, px) in row.chunks_exact_mut(CHANNELS as usize).enumerate() {
                let sx = (x as u32 + shift) % width;
                let r = ((sx * 255) / width) as i64;
                let b = (((sx + y as u32) * 127) / (width + height)) as i64;
                px[0] = (r + brightness).clamp(0, 255) as u8;
                px[1] = (g + brightness).clamp(0, 255) as u8;
                px[2] = (b + brightness).clamp(0, 255) as u8;
            }
        }
        true
    }

    fn set(&self, property_id: u32, value: f64) -> bool {
        match property_id {
            PROP_FPS if frame_period(value).is_some() => {
                self.fps_bits.store(value.to_bits(), Ordering::Relaxed);
                true
            }
            PROP_BRIGHTNESS if value.is_finite() => {
                self.brightness
                    .store(value.clamp(-255.0, 255.0) as i64, Ordering::Relaxed);
                true
            }
            _ => {
                tracing::debug!("Pattern source ignores property {} = {}", property_id, value);
                false
            }
        }
    }
}
