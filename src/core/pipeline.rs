use super::event_log::{EventLog, EventTag};
use super::frame_buffer::FrameBuffer;
use super::quality::{QualityAdapter, QualityMode};
use crate::capture::{Frame, FrameSource, OpenOutcome};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::export::{self, artifact_path, ExportSession, Exporter, SnapshotWriter, VideoBackend};
use chrono::{Local, NaiveDateTime};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub frames: usize,
}

/// Capture → quality → buffer, plus the export and snapshot actions.
///
/// Hosts call `on_video_tick` on their timer and the `on_*_requested`
/// methods from user actions. Failures end up in the event log and are
/// returned; nothing here terminates the process.
pub struct Pipeline {
    source: FrameSource,
    adapter: QualityAdapter,
    quality: QualityMode,
    buffer: Arc<FrameBuffer>,
    displayed: Option<Frame>,
    exporter: Exporter,
    snapshots: SnapshotWriter,
    events: EventLog,
    config: PipelineConfig,
}

impl Pipeline {
    /// Probe the camera and pick the configured export backend.
    pub fn start(config: PipelineConfig, events: EventLog) -> Result<Self> {
        let (source, outcome) = FrameSource::open(&config.capture);
        let backend = export::backend_for(&config.export)?;
        let pipeline = Self::new(config, source, backend, events);
        pipeline.report_open(&outcome);
        Ok(pipeline)
    }

    pub fn new(
        config: PipelineConfig,
        source: FrameSource,
        backend: Box<dyn VideoBackend>,
        events: EventLog,
    ) -> Self {
        Self {
            source,
            adapter: QualityAdapter::new(config.low_quality),
            quality: QualityMode::default(),
            buffer: Arc::new(FrameBuffer::new(config.buffer_capacity)),
            displayed: None,
            exporter: Exporter::new(backend),
            snapshots: SnapshotWriter::new(),
            events,
            config,
        }
    }

    fn report_open(&self, outcome: &OpenOutcome) {
        match outcome {
            OpenOutcome::Available(device) => self
                .events
                .push(EventTag::Camera, format!("Camera connected: {}", device)),
            OpenOutcome::Unavailable(reason) => self.events.push(
                EventTag::Camera,
                format!("Camera not found ({}), using simulation", reason),
            ),
        }
    }

    /// One video tick. Returns the size of the frame produced, if any.
    pub fn on_video_tick(&mut self) -> Option<(u32, u32)> {
        // Read once so a toggle during this tick applies from the next one
        let mode = self.quality;

        let frame = self.source.capture()?;
        let frame = match self.adapter.transform(frame, mode) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping frame: {}", e);
                return None;
            }
        };

        let size = (frame.width, frame.height);
        self.displayed = Some(frame.clone());
        if self.buffer.push(frame) {
            debug!("Frame buffer full, oldest frame evicted");
        }
        Some(size)
    }

    pub fn on_export_requested(&mut self) -> Result<ExportReport> {
        self.export_at(Local::now().naive_local())
    }

    pub fn export_at(&mut self, at: NaiveDateTime) -> Result<ExportReport> {
        let result = ExportSession::new(&self.config.export, at).and_then(|session| {
            self.exporter
                .export(&self.buffer, &session)
                .map(|count| ExportReport {
                    path: session.path.clone(),
                    frames: count,
                })
        });

        match &result {
            Ok(report) => self.events.push(
                EventTag::Video,
                format!("Video stream saved: {} ({} frames)", report.path.display(), report.frames),
            ),
            Err(Error::EmptyBuffer) => self.events.push(EventTag::Warn, "No frames to save"),
            Err(e) => self.events.push(EventTag::Error, format!("Video export failed: {}", e)),
        }
        result
    }

    pub fn on_snapshot_requested(&mut self) -> Result<PathBuf> {
        self.snapshot_at(Local::now().naive_local())
    }

    pub fn snapshot_at(&mut self, at: NaiveDateTime) -> Result<PathBuf> {
        let path = artifact_path(&self.config.snapshot_directory, "snapshot", "png", at);
        let result = self.snapshots.write(self.displayed.as_ref(), &path);

        match &result {
            Ok(path) => self
                .events
                .push(EventTag::Save, format!("Frame saved: {}", path.display())),
            Err(Error::EmptyDisplay) => self.events.push(EventTag::Warn, "No frame to save"),
            Err(e) => self.events.push(EventTag::Error, format!("Snapshot failed: {}", e)),
        }
        result
    }

    pub fn toggle_quality(&mut self) -> QualityMode {
        self.quality = self.quality.toggled();
        self.events.push(
            EventTag::Video,
            format!("Switched to {} quality", self.quality.label()),
        );
        self.quality
    }

    pub fn set_quality(&mut self, mode: QualityMode) {
        if self.quality != mode {
            self.toggle_quality();
        }
    }

    pub fn quality(&self) -> QualityMode {
        self.quality
    }

    /// Shared handle to the rolling buffer
    pub fn buffer(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.buffer)
    }

    pub fn displayed(&self) -> Option<&Frame> {
        self.displayed.as_ref()
    }

    pub fn is_simulated(&self) -> bool {
        self.source.is_simulated()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn exporter_name(&self) -> &'static str {
        self.exporter.backend_name()
    }
}
