//! Jimaku Render Engine
//!
//! Drives the external encoder to turn a source file plus cues or edits into
//! finished output files.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source.mp4 ──► probe ──► plan segments ──┐
//!                                          ├── segment 1 ──► transcode ──┐
//! edits ───────────────────────────────────┤   ...                       ├── concat ──► output.mp4
//!                                          └── segment N ──► transcode ──┘
//!
//! source.mp4 ──► probe ──┐
//!                        ├── transcode (ass filter) ──► output.mp4
//! cues ──► overlay.ass ──┘
//! ```
//!
//! Jobs run one at a time. Intermediates live in the configured temp
//! directory and are removed when the export returns.

pub mod cancel;
pub mod concat;
pub mod encoder;
pub mod ffmpeg;
pub mod job;
pub mod pipeline;
pub mod temp;

pub use cancel::CancellationHandle;
pub use encoder::{Encoder, EncoderInvocation, EncoderMode, EncoderProgress, MediaInfo};
pub use ffmpeg::FfmpegEncoder;
pub use job::{TimeRange, TranscodeJob};
pub use pipeline::{
    ExportKind, ExportOutcome, ExportPipeline, ExportProgress, ExportRequest, ExportStage,
    ExportTask,
};
