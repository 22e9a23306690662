use crate::error::CaptureError;
use crate::frame::Frame;
use common::span;

/// Decodes raw camera buffers into packed RGB frames.
pub trait FrameDecoder: Send {
    /// Decode `raw` into `out` (3 bytes per pixel). `width`/`height` are the
    /// negotiated capture geometry; compressed formats may override them.
    fn decode(
        &mut self,
        raw: &[u8],
        width: u32,
        height: u32,
        out: &mut Frame,
    ) -> Result<(), CaptureError>;
}

/// YUYV (YUV 4:2:2) decoder.
///
/// YUYV packs 2 pixels in 4 bytes: [Y0, U, Y1, V]
#[derive(Debug, Default, Clone, Copy)]
pub struct YuyvDecoder;

impl FrameDecoder for YuyvDecoder {
    fn decode(
        &mut self,
        raw: &[u8],
        width: u32,
        height: u32,
        out: &mut Frame,
    ) -> Result<(), CaptureError> {
        let _s = span!("decode");

        if width == 0 || height == 0 || width % 2 != 0 {
            return Err(CaptureError::Decode(format!(
                "invalid YUYV geometry {}x{}",
                width, height
            )));
        }

        let bytes_per_row = width as usize * 2;
        let stride = raw.len() / height as usize;
        if stride < bytes_per_row {
            return Err(CaptureError::Decode(format!(
                "YUYV buffer too short: {} bytes for {}x{}",
                raw.len(),
                width,
                height
            )));
        }

        let rgb = out.reshape(width, height, 3);
        let rows = raw.chunks_exact(stride).take(height as usize);

        for (row, dst_row) in rows.zip(rgb.chunks_exact_mut(width as usize * 3)) {
            for (chunk, dst) in row[..bytes_per_row]
                .chunks_exact(4)
                .zip(dst_row.chunks_exact_mut(6))
            {
                let y0 = chunk[0] as i32;
                let u = chunk[1] as i32 - 128;
                let y1 = chunk[2] as i32;
                let v = chunk[3] as i32 - 128;

                // BT.601 fixed-point coefficients (8-bit fraction)
                let rv = (359 * v) >> 8;
                let gu = (88 * u + 183 * v) >> 8;
                let bu = (454 * u) >> 8;

                dst[0] = (y0 + rv).clamp(0, 255) as u8;
                dst[1] = (y0 - gu).clamp(0, 255) as u8;
                dst[2] = (y0 + bu).clamp(0, 255) as u8;
                dst[3] = (y1 + rv).clamp(0, 255) as u8;
                dst[4] = (y1 - gu).clamp(0, 255) as u8;
                dst[5] = (y1 + bu).clamp(0, 255) as u8;
            }
        }

        Ok(())
    }
}

/// MJPEG decoder using turbojpeg (libjpeg-turbo)
#[cfg(feature = "v4l2")]
pub struct MjpegDecoder {
    decompressor: turbojpeg::Decompressor,
}

#[cfg(feature = "v4l2")]
impl MjpegDecoder {
    pub fn new() -> Result<Self, CaptureError> {
        let decompressor = turbojpeg::Decompressor::new()
            .map_err(|e| CaptureError::Decode(format!("turbojpeg init: {}", e)))?;
        Ok(Self { decompressor })
    }
}

#[cfg(feature = "v4l2")]
impl FrameDecoder for MjpegDecoder {
    fn decode(
        &mut self,
        raw: &[u8],
        _width: u32,
        _height: u32,
        out: &mut Frame,
    ) -> Result<(), CaptureError> {
        let _s = span!("decode");

        let header = self
            .decompressor
            .read_header(raw)
            .map_err(|e| CaptureError::Decode(e.to_string()))?;
        let (width, height) = (header.width, header.height);

        let output = turbojpeg::Image {
            pixels: out.reshape(width as u32, height as u32, 3),
            width,
            pitch: width * 3,
            height,
            format: turbojpeg::PixelFormat::RGB,
        };

        self.decompressor
            .decompress(raw, output)
            .map_err(|e| CaptureError::Decode(e.to_string()))
    }
}
