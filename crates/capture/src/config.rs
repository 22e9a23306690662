use crate::error::CaptureError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub use common::Environment;

/// Sleep after a failed grab before trying again.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Poll interval of the demo consumer when `READ_FPS` is unusable.
pub const DEFAULT_READ_PERIOD: Duration = Duration::from_millis(100);

/// Interval between two frames at `fps`.
///
/// `None` for rates that are not finite, not positive, or whose period does
/// not fit in a [`Duration`].
pub fn frame_period(fps: f64) -> Option<Duration> {
    if !fps.is_finite() || fps <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(fps.recip()).ok()
}

/// Which [`crate::CaptureDevice`] backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    V4l2,
    Pattern,
}

impl Default for SourceKind {
    fn default() -> Self {
        if cfg!(feature = "v4l2") {
            SourceKind::V4l2
        } else {
            SourceKind::Pattern
        }
    }
}

impl FromStr for SourceKind {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v4l2" | "camera" => Ok(SourceKind::V4l2),
            "pattern" | "synthetic" => Ok(SourceKind::Pattern),
            other => Err(CaptureError::Config(format!(
                "unknown CAPTURE_SOURCE '{}' (expected v4l2 or pattern)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatternConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub environment: Environment,
    pub device_id: u32,
    pub source: SourceKind,
    pub retry_backoff: Duration,
    /// Rate at which the demo consumer polls `read`.
    pub read_fps: f64,
    pub pattern: PatternConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            device_id: 0,
            source: SourceKind::default(),
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            read_fps: 10.0,
            pattern: PatternConfig::default(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl CaptureConfig {
    pub fn from_env() -> Result<Self, CaptureError> {
        let defaults = Self::default();

        let source = match env::var("CAPTURE_SOURCE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.source,
        };

        let retry_backoff_ms = env_or(
            "RETRY_BACKOFF_MS",
            defaults.retry_backoff.as_millis() as u64,
        );

        Ok(Self {
            environment: Environment::from_env(),
            device_id: env_or("DEVICE_ID", defaults.device_id),
            source,
            retry_backoff: Duration::from_millis(retry_backoff_ms),
            read_fps: env_or("READ_FPS", defaults.read_fps),
            pattern: PatternConfig {
                width: env_or("PATTERN_WIDTH", defaults.pattern.width),
                height: env_or("PATTERN_HEIGHT", defaults.pattern.height),
                fps: env_or("PATTERN_FPS", defaults.pattern.fps),
            },
        })
    }

    /// Interval between two polls of the demo consumer.
    pub fn read_period(&self) -> Duration {
        frame_period(self.read_fps).unwrap_or_else(|| {
            tracing::warn!(
                "READ_FPS {} is not a usable rate, polling every {:?}",
                self.read_fps,
                DEFAULT_READ_PERIOD
            );
            DEFAULT_READ_PERIOD
        })
    }

    pub fn with_device_id(mut self, device_id: u32) -> Self {
        self.device_id = device_id;
        self
    }

    pub fn with_source(mut self, source: SourceKind) -> Self {
        self.source = source;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn with_pattern(mut self, width: u32, height: u32, fps: f64) -> Self {
        self.pattern = PatternConfig { width, height, fps };
        self
    }
}
