//! Pipeline configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Which encoder writes exported video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportBackendKind {
    #[default]
    Ffmpeg,
    Opencv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture device index (0 is the built-in camera)
    pub device_index: i32,
    /// Size of the placeholder frame when no device is present
    pub simulated: Resolution,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            simulated: Resolution::new(640, 480),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: PathBuf,
    pub resolution: Resolution,
    pub fps: u32,
    /// Four-character codec tag
    pub codec: String,
    pub backend: ExportBackendKind,
    /// ffmpeg executable used by the ffmpeg backend
    pub ffmpeg_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("videos"),
            resolution: Resolution::new(1280, 720),
            fps: 30,
            codec: "mp4v".to_string(),
            backend: ExportBackendKind::Ffmpeg,
            ffmpeg_path: PathBuf::from("ffmpeg"),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub capture: CaptureConfig,
    /// Video tick period in milliseconds (~30 fps)
    pub tick_interval_ms: u64,
    /// Sensor telemetry refresh period in milliseconds
    pub telemetry_interval_ms: u64,
    /// Maximum frames retained for export (~30 seconds at 30 fps)
    pub buffer_capacity: usize,
    /// Target size in low quality mode
    pub low_quality: Resolution,
    pub export: ExportConfig,
    pub snapshot_directory: PathBuf,
    /// Where saved event logs go
    pub log_directory: PathBuf,
    pub event_log_lines: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            tick_interval_ms: 33,
            telemetry_interval_ms: 500,
            buffer_capacity: 900,
            low_quality: Resolution::new(128, 72),
            export: ExportConfig::default(),
            snapshot_directory: PathBuf::from("snapshots"),
            log_directory: PathBuf::from("."),
            event_log_lines: 100,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, 0, e))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path if given, otherwise `<config_dir>/pult/config.json` when it exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match dirs::config_dir().map(|d| d.join("pult").join("config.json")) {
            Some(path) if path.exists() => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("capture.simulated", self.capture.simulated),
            ("low_quality", self.low_quality),
            ("export.resolution", self.export.resolution),
        ];
        for (name, res) in sizes {
            if res.width == 0 || res.height == 0 {
                return Err(Error::Config(format!("{} must be non-zero, got {}", name, res)));
            }
        }
        if self.export.fps == 0 {
            return Err(Error::Config("export.fps must be non-zero".into()));
        }
        if self.export.codec.len() != 4 || !self.export.codec.is_ascii() {
            return Err(Error::Config(format!(
                "export.codec must be a four-character tag, got {:?}",
                self.export.codec
            )));
        }
        if self.buffer_capacity == 0 {
            return Err(Error::Config("buffer_capacity must be non-zero".into()));
        }
        if self.tick_interval_ms == 0 || self.telemetry_interval_ms == 0 {
            return Err(Error::Config("tick intervals must be non-zero".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_console_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.buffer_capacity, 900);
        assert_eq!(config.low_quality, Resolution::new(128, 72));
        assert_eq!(config.export.resolution, Resolution::new(1280, 720));
        assert_eq!(config.export.fps, 30);
        assert_eq!(config.export.codec, "mp4v");
        assert_eq!(config.capture.device_index, 0);
        assert_eq!(config.tick_interval(), Duration::from_millis(33));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "buffer_capacity": 10, "export": { "fps": 25 } }"#).unwrap();
        assert_eq!(config.buffer_capacity, 10);
        assert_eq!(config.export.fps, 25);
        assert_eq!(config.export.resolution, Resolution::new(1280, 720));
        assert_eq!(config.snapshot_directory, PathBuf::from("snapshots"));
    }

    #[test]
    fn load_rejects_zero_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "low_quality": { "width": 0, "height": 72 } }"#).unwrap();

        let err = PipelineConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn codec_must_be_four_chars() {
        let mut config = PipelineConfig::default();
        config.export.codec = "h264x".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn backend_kind_is_lowercase_in_json() {
        let json = serde_json::to_string(&ExportBackendKind::Opencv).unwrap();
        assert_eq!(json, "\"opencv\"");
    }
}
