//! Jimaku Overlay
//!
//! Text renderings of timed cues:
//! - **Overlay script:** ASS v4+ document burned in by the encoder's `ass` filter
//! - **Sidecar subtitles:** SRT for players that load captions separately

pub mod ass;
pub mod srt;

pub use ass::{render_overlay_script, write_overlay_script};
pub use srt::{render_srt, save_subtitles};
