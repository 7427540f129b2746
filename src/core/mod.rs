pub mod event_log;
pub mod frame_buffer;
pub mod pipeline;
pub mod quality;
pub mod resample;

pub use event_log::{EventLog, EventTag, LogEntry};
pub use frame_buffer::FrameBuffer;
pub use pipeline::{ExportReport, Pipeline};
pub use quality::{QualityAdapter, QualityMode};
