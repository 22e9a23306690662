use crate::frame::Frame;

pub mod pattern;
#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use pattern::PatternDevice;
#[cfg(feature = "v4l2")]
pub use v4l2::V4l2Device;

/// Numeric device property ids accepted by [`CaptureDevice::set`].
pub mod props {
    pub const PROP_BRIGHTNESS: u32 = 10;
    pub const PROP_CONTRAST: u32 = 11;
    pub const PROP_SATURATION: u32 = 12;
    pub const PROP_GAIN: u32 = 14;
    pub const PROP_EXPOSURE: u32 = 15;
    pub const PROP_FPS: u32 = 5;
    pub const PROP_AUTO_EXPOSURE: u32 = 21;
}

/// A camera whose frame acquisition blocks.
///
/// Acquisition is split in two steps: [`grab`](Self::grab) waits for the
/// next frame, [`retrieve`](Self::retrieve) decodes the last grabbed frame.
/// Only the acquisition thread calls `grab`/`retrieve`; `is_opened` and `set`
/// may be called from any thread at the same time.
pub trait CaptureDevice: Send + Sync + 'static {
    fn is_opened(&self) -> bool;

    /// Block until the next frame is available. May block indefinitely.
    fn grab(&self) -> bool;

    /// Decode the most recently grabbed frame into `frame`.
    fn retrieve(&self, frame: &mut Frame) -> bool;

    fn set(&self, property_id: u32, value: f64) -> bool;
}

impl<D: CaptureDevice + ?Sized> CaptureDevice for Box<D> {
    fn is_opened(&self) -> bool {
        (**self).is_opened()
    }

    fn grab(&self) -> bool {
        (**self).grab()
    }

    fn retrieve(&self, frame: &mut Frame) -> bool {
        (**self).retrieve(frame)
    }

    fn set(&self, property_id: u32, value: f64) -> bool {
        (**self).set(property_id, value)
    }
}

impl<D: CaptureDevice + ?Sized> CaptureDevice for std::sync::Arc<D> {
    fn is_opened(&self) -> bool {
        (**self).is_opened()
    }

    fn grab(&self) -> bool {
        (**self).grab()
    }

    fn retrieve(&self, frame: &mut Frame) -> bool {
        (**self).retrieve(frame)
    }

    fn set(&self, property_id: u32, value: f64) -> bool {
        (**self).set(property_id, value)
    }
}
