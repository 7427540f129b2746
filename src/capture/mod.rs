pub mod device;
pub mod frame;
pub mod simulated;

pub use device::{CaptureDevice, RawImage};
pub use frame::{Frame, PixelFormat};
pub use simulated::SimulatedSource;

use crate::config::{CaptureConfig, Resolution};
use crate::error::Result;
use std::time::Instant;
use tracing::{info, warn};

/// Result of the single startup probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Available(String),
    Unavailable(String),
}

enum Backend {
    Device(Box<dyn CaptureDevice>),
    Simulated(SimulatedSource),
}

/// Produces at most one frame per tick.
///
/// The variant is fixed at `open`; a missing camera is never probed again.
pub struct FrameSource {
    backend: Backend,
    started: Instant,
    sequence: u64,
}

impl FrameSource {
    /// Probe the configured camera once, falling back to the placeholder.
    pub fn open(config: &CaptureConfig) -> (Self, OpenOutcome) {
        let index = config.device_index;
        Self::open_with(|| device::open_default(index), config.simulated)
    }

    pub fn open_with<F>(probe: F, simulated: Resolution) -> (Self, OpenOutcome)
    where
        F: FnOnce() -> Result<Box<dyn CaptureDevice>>,
    {
        let (backend, outcome) = match probe() {
            Ok(device) => {
                let description = device.describe();
                info!("Capture device opened: {}", description);
                (Backend::Device(device), OpenOutcome::Available(description))
            }
            Err(e) => {
                warn!("No capture device ({}), using simulated video", e);
                (
                    Backend::Simulated(SimulatedSource::new(simulated)),
                    OpenOutcome::Unavailable(e.to_string()),
                )
            }
        };

        let source = Self {
            backend,
            started: Instant::now(),
            sequence: 0,
        };
        (source, outcome)
    }

    pub fn simulated(size: Resolution) -> Self {
        Self {
            backend: Backend::Simulated(SimulatedSource::new(size)),
            started: Instant::now(),
            sequence: 0,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.backend, Backend::Simulated(_))
    }

    /// One frame for this tick, or `None` if the device had nothing.
    pub fn capture(&mut self) -> Option<Frame> {
        let captured_at = self.started.elapsed();
        let frame = match &mut self.backend {
            Backend::Simulated(sim) => {
                let size = sim.size();
                Frame::from_shared(sim.pixels(), size.width, size.height, captured_at, self.sequence)
            }
            Backend::Device(device) => match device.grab() {
                Ok(Some(raw)) => Frame::new(raw.pixels, raw.width, raw.height, captured_at, self.sequence),
                Ok(None) => return None,
                Err(e) => {
                    warn!("Capture read failed: {}", e);
                    return None;
                }
            },
        };

        match frame {
            Ok(frame) => {
                self.sequence += 1;
                Some(frame)
            }
            Err(e) => {
                warn!("Dropping malformed frame: {}", e);
                None
            }
        }
    }
}
