use crate::capture::Frame;
use crate::error::{Error, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Saves the displayed frame as a PNG still, unresized.
#[derive(Default)]
pub struct SnapshotWriter;

impl SnapshotWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, displayed: Option<&Frame>, path: &Path) -> Result<PathBuf> {
        let frame = displayed.ok_or(Error::EmptyDisplay)?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, 0, e))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| Error::io(path, 0, e))?;

        PngEncoder::new(BufWriter::new(file)).write_image(
            frame.data(),
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )?;

        info!("Snapshot {}x{} saved to {}", frame.width, frame.height, path.display());
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn frame() -> Frame {
        let mut data = vec![0u8; 4 * 3 * 3];
        data[0] = 200;
        Frame::new(data, 4, 3, Duration::ZERO, 0).unwrap()
    }

    #[test]
    fn nothing_displayed_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots/snapshot.png");
        let err = SnapshotWriter::new().write(None, &path).unwrap_err();
        assert!(matches!(err, Error::EmptyDisplay));
        assert!(!path.exists());
    }

    #[test]
    fn writes_png_at_native_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots/snapshot_20240101_000000.png");
        let frame = frame();

        let saved = SnapshotWriter::new().write(Some(&frame), &path).unwrap();
        assert_eq!(saved, path);

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(0, 0).0, [200, 0, 0]);
    }

    #[test]
    fn never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken.png");
        std::fs::write(&path, b"keep").unwrap();

        let err = SnapshotWriter::new().write(Some(&frame()), &path).unwrap_err();
        assert!(matches!(err, Error::Io { written: 0, .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"keep");
    }
}
