/// Owned, packed image buffer (`height` rows of `width * channels` bytes).
///
/// The default value is the empty image: no pixels and no geometry. It is what
/// readers see before the first frame has been decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap packed pixel data. Returns `None` if `data` does not match the
    /// geometry.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * channels as usize;
        (data.len() == expected).then_some(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Zero-filled frame of the given geometry.
    pub fn zeroed(width: u32, height: u32, channels: u8) -> Self {
        let len = width as usize * height as usize * channels as usize;
        Self {
            width,
            height,
            channels,
            data: vec![0u8; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at `(x, y)`, `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * channels;
        self.data.get(start..start + channels)
    }

    /// Reshape in place and hand out the pixel buffer for writing.
    ///
    /// The allocation is reused when it is large enough; contents after the
    /// call are unspecified until the caller fills them.
    pub fn reshape(&mut self, width: u32, height: u32, channels: u8) -> &mut [u8] {
        let len = width as usize * height as usize * channels as usize;
        self.width = width;
        self.height = height;
        self.channels = channels;
        self.data.resize(len, 0);
        &mut self.data
    }

    /// Deep copy into `dst`, reusing its allocation where possible.
    pub fn copy_to(&self, dst: &mut Frame) {
        dst.width = self.width;
        dst.height = self.height;
        dst.channels = self.channels;
        dst.data.clear();
        dst.data.extend_from_slice(&self.data);
    }
}
