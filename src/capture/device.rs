use crate::error::{Error, Result};

/// Packed RGB pixels straight from a device, before they become a `Frame`
pub struct RawImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// A camera that can be polled once per tick
pub trait CaptureDevice: Send {
    /// `Ok(None)` means the device had nothing this tick.
    fn grab(&mut self) -> Result<Option<RawImage>>;

    fn describe(&self) -> String;
}

#[cfg(feature = "opencv")]
pub use self::opencv_device::OpenCvCamera;

/// Try the platform camera at `index`.
pub fn open_default(index: i32) -> Result<Box<dyn CaptureDevice>> {
    #[cfg(feature = "opencv")]
    {
        Ok(Box::new(OpenCvCamera::open(index)?))
    }

    #[cfg(not(feature = "opencv"))]
    {
        let _ = index;
        Err(Error::DeviceUnavailable("built without camera support".into()))
    }
}

#[cfg(feature = "opencv")]
mod opencv_device {
    use super::{CaptureDevice, RawImage};
    use crate::error::{Error, Result};
    use opencv::{core, imgproc, prelude::*, videoio};

    pub struct OpenCvCamera {
        capture: videoio::VideoCapture,
        index: i32,
        width: u32,
        height: u32,
    }

    fn cv_err(e: opencv::Error) -> Error {
        Error::DeviceUnavailable(e.to_string())
    }

    impl OpenCvCamera {
        pub fn open(index: i32) -> Result<Self> {
            // CAP_ANY lets OpenCV pick V4L2 / AVFoundation / Media Foundation
            let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY).map_err(cv_err)?;
            if !capture.is_opened().map_err(cv_err)? {
                return Err(Error::DeviceUnavailable(format!("camera {} could not be opened", index)));
            }

            let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH).map_err(cv_err)? as u32;
            let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT).map_err(cv_err)? as u32;
            tracing::debug!("OpenCV camera {} opened at {}x{}", index, width, height);

            Ok(Self {
                capture,
                index,
                width,
                height,
            })
        }
    }

    impl CaptureDevice for OpenCvCamera {
        fn grab(&mut self) -> Result<Option<RawImage>> {
            let mut frame = Mat::default();
            if !self.capture.read(&mut frame).map_err(cv_err)? || frame.empty() {
                return Ok(None);
            }

            // Devices hand out BGR; everything downstream is RGB
            let mut rgb = Mat::default();
            imgproc::cvt_color(
                &frame,
                &mut rgb,
                imgproc::COLOR_BGR2RGB,
                0,
                core::AlgorithmHint::ALGO_HINT_DEFAULT,
            )
            .map_err(cv_err)?;

            if !rgb.is_continuous() {
                return Err(Error::InvalidFrame("camera frame is not continuous".into()));
            }

            Ok(Some(RawImage {
                pixels: rgb.data_bytes().map_err(cv_err)?.to_vec(),
                width: rgb.cols() as u32,
                height: rgb.rows() as u32,
            }))
        }

        fn describe(&self) -> String {
            format!("camera {} ({}x{})", self.index, self.width, self.height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "opencv"))]
    #[test]
    fn without_opencv_the_device_is_unavailable() {
        let err = open_default(0).err().expect("no camera backend compiled in");
        assert!(matches!(err, Error::DeviceUnavailable(_)));
    }
}
