use super::{ExportSession, VideoBackend, VideoSink};
use crate::capture::Frame;
use opencv::{core, imgproc, prelude::*, videoio};
use std::io;

fn io_err(e: opencv::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// Writes through `cv::VideoWriter`, which picks the container from the file extension.
pub struct OpenCvBackend;

impl VideoBackend for OpenCvBackend {
    fn name(&self) -> &'static str {
        "opencv"
    }

    fn open(&self, session: &ExportSession) -> io::Result<Box<dyn VideoSink>> {
        let [a, b, c, d] = session.codec.chars();
        let fourcc = videoio::VideoWriter::fourcc(a, b, c, d).map_err(io_err)?;
        let size = core::Size::new(session.resolution.width as i32, session.resolution.height as i32);
        let path = session.path.to_string_lossy();

        let writer = videoio::VideoWriter::new(&path, fourcc, session.fps as f64, size, true).map_err(io_err)?;
        if !writer.is_opened().map_err(io_err)? {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("VideoWriter could not open {}", path),
            ));
        }

        Ok(Box::new(OpenCvSink { writer }))
    }
}

struct OpenCvSink {
    writer: videoio::VideoWriter,
}

impl VideoSink for OpenCvSink {
    fn write(&mut self, frame: &Frame) -> io::Result<()> {
        let mut rgb = Mat::new_rows_cols_with_default(
            frame.height as i32,
            frame.width as i32,
            core::CV_8UC3,
            core::Scalar::all(0.0),
        )
        .map_err(io_err)?;
        rgb.data_bytes_mut().map_err(io_err)?.copy_from_slice(frame.data());

        // VideoWriter expects BGR
        let mut bgr = Mat::default();
        imgproc::cvt_color(
            &rgb,
            &mut bgr,
            imgproc::COLOR_RGB2BGR,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(io_err)?;

        self.writer.write(&bgr).map_err(io_err)
    }

    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.writer.release().map_err(io_err)
    }
}
