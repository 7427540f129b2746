use crate::core::{ExportReport, Pipeline, QualityMode};
use crate::error::{Error, Result};
use crossbeam_channel::tick;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct RecordOptions {
    pub duration: Duration,
    pub quality: QualityMode,
    pub snapshot: bool,
}

#[derive(Debug, Serialize)]
pub struct RecordSummary {
    pub ticks: u64,
    pub frames: usize,
    pub video: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    /// Why the snapshot was not saved, when it failed
    pub snapshot_error: Option<String>,
    pub interrupted: bool,
}

/// Headless capture: tick until `duration` elapses or `running` is cleared,
/// then export whatever the buffer holds.
///
/// An empty buffer is not an error here; the summary just has no video.
/// A failed snapshot is reported in the summary and does not stop the export.
pub fn record(pipeline: &mut Pipeline, options: RecordOptions, running: &AtomicBool) -> Result<RecordSummary> {
    pipeline.set_quality(options.quality);

    let ticker = tick(pipeline.config().tick_interval());
    let deadline = Instant::now() + options.duration;
    let mut ticks = 0u64;
    let mut interrupted = false;

    while Instant::now() < deadline {
        if !running.load(Ordering::SeqCst) {
            interrupted = true;
            break;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if ticker.recv_timeout(remaining).is_err() {
            break;
        }
        pipeline.on_video_tick();
        ticks += 1;
    }
    info!("Recorded {} ticks, {} frames buffered", ticks, pipeline.buffer().len());

    let (snapshot, snapshot_error) = if options.snapshot {
        match pipeline.on_snapshot_requested() {
            Ok(path) => (Some(path), None),
            Err(e) if e.is_warning() => (None, None),
            Err(e) => (None, Some(e.to_string())),
        }
    } else {
        (None, None)
    };

    let (video, frames) = match pipeline.on_export_requested() {
        Ok(ExportReport { path, frames }) => (Some(path), frames),
        Err(Error::EmptyBuffer) => (None, 0),
        Err(e) => return Err(e),
    };

    Ok(RecordSummary {
        ticks,
        frames,
        video,
        snapshot,
        snapshot_error,
        interrupted,
    })
}

/// Ctrl-C flag for `record`
pub fn interrupt_flag() -> std::result::Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}
