use ndarray::ArrayView3;

/// One decoded video frame: contiguous interleaved RGB bytes, row-major,
/// no padding between rows.
///
/// Decoders strip any stride before constructing a `Frame`; everything
/// downstream (detector, redactor, encoder) can assume a packed buffer.
#[derive(Clone, Debug)]
pub struct Frame {
    index: usize,
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        let expected = width as usize * height as usize * usize::from(channels);
        debug_assert_eq!(data.len(), expected, "pixel buffer does not match dimensions");
        Self { index, width, height, channels, data }
    }

    /// Zero-based position of this frame in the source stream.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel; 3 for RGB.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Packed pixel bytes, `width * height * channels` long.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// View as `(height, width, channels)` for tensor preprocessing.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        let (h, w, c) = (self.height as usize, self.width as usize, self.channels as usize);
        ArrayView3::from_shape((h, w, c), &self.data)
            .expect("Frame data length must match dimensions")
    }
}
