use super::resample::Resampler;
use crate::capture::Frame;
use crate::config::Resolution;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum QualityMode {
    /// Native capture resolution
    #[default]
    High,
    /// Fixed small preview resolution
    Low,
}

impl QualityMode {
    pub fn toggled(self) -> Self {
        match self {
            QualityMode::High => QualityMode::Low,
            QualityMode::Low => QualityMode::High,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityMode::High => "high",
            QualityMode::Low => "low",
        }
    }
}

/// Maps a frame to the resolution its quality mode asks for
pub struct QualityAdapter {
    low: Resolution,
    resampler: Resampler,
}

impl QualityAdapter {
    pub fn new(low: Resolution) -> Self {
        Self {
            low,
            resampler: Resampler::new(),
        }
    }

    pub fn low_resolution(&self) -> Resolution {
        self.low
    }

    pub fn transform(&mut self, frame: Frame, mode: QualityMode) -> Result<Frame> {
        match mode {
            QualityMode::High => Ok(frame),
            QualityMode::Low => self.resampler.resize(&frame, self.low),
        }
    }
}
