//! Jimaku Common Utilities
//!
//! Shared infrastructure for all Jimaku crates:
//! - Error types and result aliases
//! - Timecode formatting for overlay scripts, sidecar subtitles, and encoder arguments
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod timecode;

pub use config::*;
pub use error::*;
