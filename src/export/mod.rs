//! Writing buffered frames and stills to disk

pub mod ffmpeg;
#[cfg(feature = "opencv")]
pub mod opencv;
pub mod snapshot;

pub use snapshot::SnapshotWriter;

use crate::capture::Frame;
use crate::config::{ExportBackendKind, ExportConfig, Resolution};
use crate::core::frame_buffer::FrameBuffer;
use crate::core::resample::Resampler;
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `<dir>/<prefix>_<YYYYMMDD_hhmmss>.<ext>`
pub fn artifact_path(dir: &Path, prefix: &str, ext: &str, at: NaiveDateTime) -> PathBuf {
    dir.join(format!("{}_{}.{}", prefix, at.format(TIMESTAMP_FORMAT), ext))
}

/// Four-character codec tag such as `mp4v`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const MP4V: FourCc = FourCc(*b"mp4v");

    pub fn parse(tag: &str) -> Result<Self> {
        let bytes: [u8; 4] = tag
            .as_bytes()
            .try_into()
            .map_err(|_| Error::Config(format!("codec tag must be 4 bytes: {:?}", tag)))?;
        Ok(FourCc(bytes))
    }

    pub fn chars(&self) -> [char; 4] {
        self.0.map(char::from)
    }
}

impl std::fmt::Display for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in self.chars() {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Parameters for one export invocation
#[derive(Debug, Clone)]
pub struct ExportSession {
    pub path: PathBuf,
    pub resolution: Resolution,
    pub fps: u32,
    pub codec: FourCc,
}

impl ExportSession {
    pub fn new(config: &ExportConfig, at: NaiveDateTime) -> Result<Self> {
        Ok(Self {
            path: artifact_path(&config.directory, "video", "mp4", at),
            resolution: config.resolution,
            fps: config.fps,
            codec: FourCc::parse(&config.codec)?,
        })
    }
}

/// An open video artifact accepting frames of the session resolution
pub trait VideoSink {
    fn write(&mut self, frame: &Frame) -> std::io::Result<()>;

    /// Flush and close the artifact.
    fn finish(self: Box<Self>) -> std::io::Result<()>;
}

/// Opens sinks for export sessions
pub trait VideoBackend: Send {
    fn name(&self) -> &'static str;

    fn open(&self, session: &ExportSession) -> std::io::Result<Box<dyn VideoSink>>;
}

pub fn backend_for(config: &ExportConfig) -> Result<Box<dyn VideoBackend>> {
    match config.backend {
        ExportBackendKind::Ffmpeg => Ok(Box::new(ffmpeg::FfmpegBackend::new(&config.ffmpeg_path))),
        #[cfg(feature = "opencv")]
        ExportBackendKind::Opencv => Ok(Box::new(self::opencv::OpenCvBackend)),
        #[cfg(not(feature = "opencv"))]
        ExportBackendKind::Opencv => Err(Error::Config(
            "the opencv export backend needs the `opencv` feature".into(),
        )),
    }
}

/// Turns the buffered frame sequence into one video artifact
pub struct Exporter {
    backend: Box<dyn VideoBackend>,
    resampler: Resampler,
}

/// Close a sink after a failed frame. The close error usually says why
/// (ffmpeg's stderr), so it is folded into the reported error.
fn close_after_failure(sink: Box<dyn VideoSink>, err: io::Error) -> io::Error {
    match sink.finish() {
        Ok(()) => err,
        Err(close) => io::Error::new(err.kind(), format!("{}; {}", err, close)),
    }
}

impl Exporter {
    pub fn new(backend: Box<dyn VideoBackend>) -> Self {
        Self {
            backend,
            resampler: Resampler::new(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Drain `buffer` into one artifact, each frame resized to the session
    /// resolution, in capture order.
    ///
    /// The buffer is drained only once the sink is open, so a destination
    /// that cannot be opened leaves every frame buffered. Returns the number
    /// of frames written. On a mid-stream failure the partial artifact stays
    /// on disk and the error carries the count.
    pub fn export(&mut self, buffer: &FrameBuffer, session: &ExportSession) -> Result<usize> {
        if buffer.is_empty() {
            return Err(Error::EmptyBuffer);
        }

        if let Some(dir) = session.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, 0, e))?;
        }

        let sink = self
            .backend
            .open(session)
            .map_err(|e| Error::io(&session.path, 0, e))?;

        let frames = buffer.drain_all();
        if frames.is_empty() {
            // Drained elsewhere between the check and the open
            let _ = sink.finish();
            return Err(Error::EmptyBuffer);
        }

        debug!(
            "Exporting {} frames via {} to {} ({} @ {} fps, {})",
            frames.len(),
            self.backend.name(),
            session.path.display(),
            session.resolution,
            session.fps,
            session.codec
        );
        self.write_all(sink, frames, session)
    }

    fn write_all(&mut self, mut sink: Box<dyn VideoSink>, frames: Vec<Frame>, session: &ExportSession) -> Result<usize> {
        let total = frames.len();
        let mut written = 0;
        for frame in frames {
            let result = self
                .resampler
                .resize(&frame, session.resolution)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
                .and_then(|frame| sink.write(&frame));

            if let Err(e) = result {
                warn!("Export stopped after {} of {} frames: {}", written, total, e);
                let e = close_after_failure(sink, e);
                return Err(Error::io(&session.path, written, e));
            }
            written += 1;
        }

        sink.finish().map_err(|e| Error::io(&session.path, written, e))?;
        info!("Exported {} frames to {}", written, session.path.display());
        Ok(written)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Written {
        pub path: PathBuf,
        pub fps: u32,
        pub sizes: Vec<(u32, u32)>,
        pub sequences: Vec<u64>,
        pub finished: bool,
    }

    /// Records sessions in memory; optionally fails after `fail_after` frames
    /// and reports `close_error` from `finish`.
    #[derive(Clone, Default)]
    pub struct MemoryBackend {
        pub sessions: Arc<Mutex<Vec<Written>>>,
        pub fail_after: Option<usize>,
        pub fail_open: bool,
        pub close_error: Option<&'static str>,
    }

    struct MemorySink {
        index: usize,
        sessions: Arc<Mutex<Vec<Written>>>,
        fail_after: Option<usize>,
        close_error: Option<&'static str>,
    }

    impl VideoBackend for MemoryBackend {
        fn name(&self) -> &'static str {
            "memory"
        }

        fn open(&self, session: &ExportSession) -> std::io::Result<Box<dyn VideoSink>> {
            if self.fail_open {
                return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"));
            }
            // Touch the file so partial artifacts are observable on disk
            std::fs::write(&session.path, b"")?;
            let mut sessions = self.sessions.lock();
            sessions.push(Written {
                path: session.path.clone(),
                fps: session.fps,
                sizes: Vec::new(),
                sequences: Vec::new(),
                finished: false,
            });
            Ok(Box::new(MemorySink {
                index: sessions.len() - 1,
                sessions: Arc::clone(&self.sessions),
                fail_after: self.fail_after,
                close_error: self.close_error,
            }))
        }
    }

    impl VideoSink for MemorySink {
        fn write(&mut self, frame: &Frame) -> std::io::Result<()> {
            let mut sessions = self.sessions.lock();
            let session = &mut sessions[self.index];
            if Some(session.sizes.len()) == self.fail_after {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            session.sizes.push((frame.width, frame.height));
            session.sequences.push(frame.sequence);
            Ok(())
        }

        fn finish(self: Box<Self>) -> std::io::Result<()> {
            self.sessions.lock()[self.index].finished = true;
            match self.close_error {
                Some(msg) => Err(std::io::Error::new(std::io::ErrorKind::Other, msg)),
                None => Ok(()),
            }
        }
    }
}
