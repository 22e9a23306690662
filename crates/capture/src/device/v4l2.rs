use super::CaptureDevice;
use super::props;
use crate::decoder::{FrameDecoder, MjpegDecoder, YuyvDecoder};
use crate::error::CaptureError;
use crate::frame::Frame;
use std::sync::{Mutex, PoisonError};
use v4l::{
    Device, FourCC,
    buffer::Type,
    control::{Control, Value},
    io::{mmap::Stream, traits::CaptureStream},
    video::{Capture, capture::Parameters},
};

const BUFFER_COUNT: u32 = 4;

const FOURCC_YUYV: FourCC = FourCC { repr: *b"YUYV" };
const FOURCC_MJPG: FourCC = FourCC { repr: *b"MJPG" };

// V4L2 control IDs (from videodev2.h)
const V4L2_CID_BRIGHTNESS: u32 = 0x00980900;
const V4L2_CID_CONTRAST: u32 = 0x00980901;
const V4L2_CID_SATURATION: u32 = 0x00980902;
const V4L2_CID_GAIN: u32 = 0x00980913;
const V4L2_CID_EXPOSURE_AUTO: u32 = 0x009a0901;
const V4L2_CID_EXPOSURE_ABSOLUTE: u32 = 0x009a0902;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelFormat {
    Yuyv,
    Mjpeg,
}

fn control_id(property_id: u32) -> Option<u32> {
    match property_id {
        props::PROP_BRIGHTNESS => Some(V4L2_CID_BRIGHTNESS),
        props::PROP_CONTRAST => Some(V4L2_CID_CONTRAST),
        props::PROP_SATURATION => Some(V4L2_CID_SATURATION),
        props::PROP_GAIN => Some(V4L2_CID_GAIN),
        props::PROP_EXPOSURE => Some(V4L2_CID_EXPOSURE_ABSOLUTE),
        props::PROP_AUTO_EXPOSURE => Some(V4L2_CID_EXPOSURE_AUTO),
        _ => None,
    }
}

/// Select best pixel format: prefer YUYV (faster decode), fallback to MJPEG
fn select_format(device: &Device) -> Result<PixelFormat, CaptureError> {
    let formats = device.enum_formats()?;

    tracing::debug!("Available formats:");
    for fmt in &formats {
        tracing::debug!("  {:?}: {}", fmt.fourcc, fmt.description);
    }

    if formats.iter().any(|f| f.fourcc == FOURCC_YUYV) {
        return Ok(PixelFormat::Yuyv);
    }

    if formats.iter().any(|f| f.fourcc == FOURCC_MJPG) {
        return Ok(PixelFormat::Mjpeg);
    }

    Err(CaptureError::UnsupportedFormat(format!(
        "neither YUYV nor MJPEG - available: {:?}",
        formats.iter().map(|f| f.fourcc).collect::<Vec<_>>()
    )))
}

/// State touched only by the acquisition thread.
struct CaptureState {
    stream: Stream<'static>,
    decoder: Box<dyn FrameDecoder>,
    raw: Vec<u8>,
    grabbed: bool,
}

struct Opened {
    device: Device,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    capture: Mutex<CaptureState>,
}

impl Opened {
    fn open(index: u32) -> Result<Self, CaptureError> {
        let device = Device::new(index as usize).map_err(|e| CaptureError::DeviceOpen {
            index,
            reason: e.to_string(),
        })?;

        let caps = device.query_caps()?;
        tracing::info!("Camera opened: {} ({})", caps.card, caps.driver);

        let pixel_format = select_format(&device)?;
        let mut format = device.format()?;
        format.fourcc = match pixel_format {
            PixelFormat::Yuyv => FOURCC_YUYV,
            PixelFormat::Mjpeg => FOURCC_MJPG,
        };
        let format = device.set_format(&format)?;

        tracing::info!(
            "Capture format: {}x{} {:?} ({:?})",
            format.width,
            format.height,
            format.fourcc,
            pixel_format
        );

        let decoder: Box<dyn FrameDecoder> = match pixel_format {
            PixelFormat::Yuyv => Box::new(YuyvDecoder),
            PixelFormat::Mjpeg => Box::new(MjpegDecoder::new()?),
        };

        let stream = Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)?;

        Ok(Self {
            device,
            width: format.width,
            height: format.height,
            pixel_format,
            capture: Mutex::new(CaptureState {
                stream,
                decoder,
                raw: Vec::new(),
                grabbed: false,
            }),
        })
    }
}

/// V4L2 camera at `/dev/video<index>`.
///
/// Opening never fails outright: a device that cannot be opened or configured
/// reports `is_opened() == false` and refuses every other call.
pub struct V4l2Device {
    index: u32,
    opened: Option<Opened>,
}

impl std::fmt::Debug for V4l2Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Device")
            .field("index", &self.index)
            .field("opened", &self.opened.is_some())
            .field("geometry", &self.geometry())
            .field("pixel_format", &self.opened.as_ref().map(|o| o.pixel_format))
            .finish()
    }
}

impl V4l2Device {
    pub fn open(index: u32) -> Self {
        let opened = match Opened::open(index) {
            Ok(opened) => Some(opened),
            Err(e) => {
                tracing::error!("Could not open camera {}: {}", index, e);
                None
            }
        };
        Self { index, opened }
    }

    pub fn geometry(&self) -> Option<(u32, u32)> {
        self.opened.as_ref().map(|o| (o.width, o.height))
    }
}

impl CaptureDevice for V4l2Device {
    fn is_opened(&self) -> bool {
        self.opened.is_some()
    }

    fn grab(&self) -> bool {
        let Some(opened) = &self.opened else {
            return false;
        };
        let mut state = opened
            .capture
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let CaptureState {
            stream,
            raw,
            grabbed,
            ..
        } = &mut *state;

        match stream.next() {
            Ok((buf, meta)) => {
                let used = (meta.bytesused as usize).min(buf.len());
                let used = if used == 0 { buf.len() } else { used };
                raw.clear();
                raw.extend_from_slice(&buf[..used]);
                *grabbed = true;
                true
            }
            // The acquisition loop reports the failed grab.
            Err(_) => {
                *grabbed = false;
                false
            }
        }
    }

    fn retrieve(&self, frame: &mut Frame) -> bool {
        let Some(opened) = &self.opened else {
            return false;
        };
        let mut state = opened
            .capture
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !state.grabbed {
            return false;
        }

        let CaptureState { decoder, raw, .. } = &mut *state;
        decoder
            .decode(raw, opened.width, opened.height, frame)
            .is_ok()
    }

    fn set(&self, property_id: u32, value: f64) -> bool {
        let Some(opened) = &self.opened else {
            return false;
        };

        let result = if property_id == props::PROP_FPS {
            if !(value.is_finite() && value >= 1.0) {
                return false;
            }
            opened
                .device
                .set_params(&Parameters::with_fps(value.round() as u32))
                .map(|_| ())
        } else {
            let Some(id) = control_id(property_id) else {
                tracing::debug!("Unsupported camera property {}", property_id);
                return false;
            };
            opened.device.set_control(Control {
                id,
                value: Value::Integer(value.round() as i64),
            })
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "Setting property {} = {} on camera {} failed: {}",
                    property_id,
                    value,
                    self.index,
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_mapping() {
        assert_eq!(control_id(props::PROP_BRIGHTNESS), Some(V4L2_CID_BRIGHTNESS));
        assert_eq!(control_id(props::PROP_EXPOSURE), Some(V4L2_CID_EXPOSURE_ABSOLUTE));
        assert_eq!(control_id(props::PROP_FPS), None);
        assert_eq!(control_id(4242), None);
    }

    #[test]
    fn test_missing_device_is_closed() {
        let device = V4l2Device::open(250);
        assert!(!device.is_opened());
        assert!(!device.grab());
        assert!(!device.retrieve(&mut Frame::default()));
        assert!(!device.set(props::PROP_BRIGHTNESS, 1.0));
        assert_eq!(device.geometry(), None);
        assert!(format!("{:?}", device).contains("pixel_format: None"));
    }

    #[test]
    fn test_failed_grab_and_retrieve_are_silent() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tracing::{Event, Subscriber};
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        struct EventCounter(Arc<AtomicUsize>);

        impl<S: Subscriber> Layer<S> for EventCounter {
            fn on_event(&self, _event: &Event<'_>, _ctx: Context<'_, S>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let device = V4l2Device::open(251);
        let events = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(EventCounter(Arc::clone(&events)));

        tracing::subscriber::with_default(subscriber, || {
            assert!(!device.grab());
            assert!(!device.retrieve(&mut Frame::default()));
        });
        assert_eq!(events.load(Ordering::SeqCst), 0);
    }
}
