use crate::config::Resolution;
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Interleaved 8-bit R, G, B
    Rgb8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// One captured or synthesized image.
///
/// Pixel memory is shared between clones, so the displayed frame and the
/// buffered copy of the same tick cost one allocation.
#[derive(Clone)]
pub struct Frame {
    data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Time since the source was opened
    pub captured_at: Duration,
    pub sequence: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, captured_at: Duration, sequence: u64) -> Result<Self> {
        Self::from_shared(Arc::new(data), width, height, captured_at, sequence)
    }

    pub fn from_shared(
        data: Arc<Vec<u8>>,
        width: u32,
        height: u32,
        captured_at: Duration,
        sequence: u64,
    ) -> Result<Self> {
        let format = PixelFormat::Rgb8;
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if width == 0 || height == 0 || data.len() != expected {
            return Err(Error::InvalidFrame(format!(
                "{}x{} RGB needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            format,
            captured_at,
            sequence,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// RGB triple at (x, y), or black outside the frame
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if x >= self.width || y >= self.height {
            return (0, 0, 0);
        }
        let offset = y as usize * self.stride() + x as usize * 3;
        (self.data[offset], self.data[offset + 1], self.data[offset + 2])
    }

    pub fn shares_pixels_with(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("captured_at", &self.captured_at)
            .field("size", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        let err = Frame::new(vec![0; 10], 2, 2, Duration::ZERO, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidFrame(_)));
        assert!(Frame::new(vec![], 0, 0, Duration::ZERO, 0).is_err());
    }

    #[test]
    fn pixel_lookup() {
        let mut data = vec![0u8; 2 * 2 * 3];
        // (1,1) red
        data[9] = 255;
        let frame = Frame::new(data, 2, 2, Duration::ZERO, 7).unwrap();
        assert_eq!(frame.pixel(1, 1), (255, 0, 0));
        assert_eq!(frame.pixel(0, 0), (0, 0, 0));
        assert_eq!(frame.pixel(5, 5), (0, 0, 0));
        assert_eq!(frame.stride(), 6);
    }

    #[test]
    fn clones_share_pixels() {
        let frame = Frame::new(vec![1; 3], 1, 1, Duration::ZERO, 0).unwrap();
        let copy = frame.clone();
        assert!(frame.shares_pixels_with(&copy));
    }
}
