//! Encoder abstraction.
//!
//! Everything that launches the external media tool goes through [`Encoder`],
//! so the pipeline can be driven by an in-process fake in tests.

use std::path::Path;

use serde::{Deserialize, Serialize};

use jimaku_common::error::JimakuResult;

use crate::cancel::CancellationHandle;

/// What an encoder invocation is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncoderMode {
    /// Stream inspection.
    Probe,
    /// Decode, filter and re-encode.
    Transcode,
    /// Join already-encoded parts without re-encoding.
    StreamCopyConcat,
}

/// One run of the external encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderInvocation {
    pub mode: EncoderMode,

    /// Arguments after the program name. The output path is always last.
    pub args: Vec<String>,

    /// Output duration used to turn processed time into a percentage.
    /// Zero when unknown.
    pub expected_duration_secs: f64,
}

impl EncoderInvocation {
    pub fn new(mode: EncoderMode, args: Vec<String>, expected_duration_secs: f64) -> Self {
        Self {
            mode,
            args,
            expected_duration_secs,
        }
    }
}

/// Progress report from a running invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderProgress {
    pub processed_secs: f64,
    pub total_secs: f64,
}

impl EncoderProgress {
    /// Percentage in `[0, 100]`; zero when the total is unknown.
    pub fn percent(&self) -> f64 {
        if self.total_secs <= 0.0 || !self.total_secs.is_finite() {
            return 0.0;
        }
        (self.processed_secs / self.total_secs * 100.0).clamp(0.0, 100.0)
    }
}

/// Stream summary of a media file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub duration_secs: f64,
    pub has_video: bool,
    pub has_audio: bool,
}

/// Callback receiving encoder progress.
pub type EncoderProgressFn<'a> = &'a (dyn Fn(EncoderProgress) + Send + Sync);

/// Interface to the external media encoder.
#[async_trait::async_trait]
pub trait Encoder: Send + Sync {
    /// Encoder name for logs and messages.
    fn name(&self) -> &str;

    /// Whether the encoder binaries can be launched on this system.
    async fn is_available(&self) -> bool;

    /// Inspect `path` for duration and stream presence.
    async fn probe(&self, path: &Path) -> JimakuResult<MediaInfo>;

    /// Run one invocation to completion.
    ///
    /// Returns `Cancelled` if `cancel` fires first; the process is stopped
    /// before this returns.
    async fn run(
        &self,
        invocation: &EncoderInvocation,
        cancel: &CancellationHandle,
        on_progress: EncoderProgressFn<'_>,
    ) -> JimakuResult<()>;
}
