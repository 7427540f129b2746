use crate::capture::Frame;
use crate::config::Resolution;
use crate::error::{Error, Result};
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};

/// RGB resampler shared by the quality adapter and the exporter.
///
/// Shrinking averages the covered source area (box filter); enlarging is
/// bilinear so upscaled low-quality frames stay smooth.
pub struct Resampler {
    resizer: Resizer,
}

impl Resampler {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    fn algorithm(from: Resolution, to: Resolution) -> ResizeAlg {
        if to.pixels() < from.pixels() {
            ResizeAlg::Convolution(FilterType::Box)
        } else {
            ResizeAlg::Convolution(FilterType::Bilinear)
        }
    }

    /// New frame at `target`, keeping timestamp and sequence.
    /// Returns a cheap clone when the size already matches.
    pub fn resize(&mut self, frame: &Frame, target: Resolution) -> Result<Frame> {
        if frame.resolution() == target {
            return Ok(frame.clone());
        }
        if target.pixels() == 0 {
            return Err(Error::Resize(format!("empty target {}", target)));
        }

        let src = Image::from_vec_u8(frame.width, frame.height, frame.data().to_vec(), PixelType::U8x3)
            .map_err(|e| Error::Resize(e.to_string()))?;
        let mut dst = Image::new(target.width, target.height, PixelType::U8x3);

        let options = ResizeOptions::new().resize_alg(Self::algorithm(frame.resolution(), target));
        self.resizer
            .resize(&src, &mut dst, &options)
            .map_err(|e| Error::Resize(e.to_string()))?;

        Frame::new(dst.into_vec(), target.width, target.height, frame.captured_at, frame.sequence)
    }
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new()
    }
}
