//! Operator console video pipeline: capture (or simulate) frames, adapt them
//! to the selected quality, keep a rolling window and export it on demand.

pub mod capture;
pub mod config;
pub mod console;
pub mod core;
pub mod error;
pub mod export;

pub use error::{Error, Result};
