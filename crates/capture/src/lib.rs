//! Non-blocking access to the most recent frame of a blocking camera.
//!
//! A [`CameraCapture`] owns a [`CaptureDevice`] and a detached acquisition
//! thread that grabs and decodes frames as fast as the device delivers them,
//! publishing each into a single [`LatestFrame`] slot. Readers copy the slot
//! out at whatever rate suits them.

mod acquisition;
pub mod camera;
pub mod config;
pub mod decoder;
pub mod device;
pub mod error;
pub mod frame;
pub mod slot;
pub mod stats;

pub use camera::CameraCapture;
pub use config::{CaptureConfig, SourceKind};
#[cfg(feature = "v4l2")]
pub use decoder::MjpegDecoder;
pub use decoder::{FrameDecoder, YuyvDecoder};
pub use device::{CaptureDevice, PatternDevice};
#[cfg(feature = "v4l2")]
pub use device::V4l2Device;
pub use error::CaptureError;
pub use frame::Frame;
pub use slot::{LatestFrame, Outcome};
pub use stats::StatsSnapshot;
