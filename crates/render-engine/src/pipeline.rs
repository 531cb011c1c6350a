//! Export orchestration.
//!
//! An export probes the source, builds its work list (one whole-file job for
//! overlay burn-in, one job per planned segment for edits), runs the jobs
//! strictly one after another and then assembles the result. Every
//! intermediate file lives in the run's [`TempArtifacts`] and is gone when
//! the export returns, whatever the outcome.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use jimaku_common::config::{AppConfig, EncoderSettings};
use jimaku_common::error::{JimakuError, JimakuResult};
use jimaku_overlay::render_overlay_script;
use jimaku_processing_core::segment_planner::{plan, SegmentPlan};
use jimaku_project_model::cue::TimedCue;
use jimaku_project_model::edit::EditOperation;

use crate::cancel::CancellationHandle;
use crate::concat::{concatenate, move_file};
use crate::encoder::{Encoder, MediaInfo};
use crate::ffmpeg::FfmpegEncoder;
use crate::job::TranscodeJob;
use crate::temp::TempArtifacts;

/// Extension used for intermediates when the output has none.
const DEFAULT_EXTENSION: &str = "mp4";

/// Stages of an export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Idle,
    Planning,
    RenderingOverlay,
    /// Running job `index` (zero-based) of `total`.
    Encoding {
        index: usize,
        total: usize,
    },
    Concatenating,
    CleaningUp,
    Done,
    Failed,
    Cancelled,
}

/// Export progress report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportProgress {
    pub stage: ExportStage,

    /// Overall progress in `[0, 100]`. Never decreases within one run.
    pub percent: f64,
}

/// Progress callback for a single export run.
pub type ProgressCallback<'a> = &'a (dyn Fn(ExportProgress) + Send + Sync);

/// What an export run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    /// Files written. One entry except for split exports.
    pub outputs: Vec<PathBuf>,

    /// The segment plan for edit exports.
    pub plan: Option<SegmentPlan>,
}

/// Work for [`ExportPipeline::spawn`].
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: ExportKind,
}

#[derive(Debug, Clone)]
pub enum ExportKind {
    /// Burn `cues` into the whole source.
    Overlay { cues: Vec<TimedCue> },
    /// Apply timeline edits.
    Edits { edits: Vec<EditOperation> },
}

/// A running export spawned onto the tokio runtime.
#[derive(Debug)]
pub struct ExportTask {
    handle: JoinHandle<JimakuResult<ExportOutcome>>,
    progress: mpsc::UnboundedReceiver<ExportProgress>,
    cancel: CancellationHandle,
}

impl ExportTask {
    /// Handle that cancels this export.
    pub fn cancel_handle(&self) -> CancellationHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Next progress report; `None` once the export has finished.
    pub async fn next_progress(&mut self) -> Option<ExportProgress> {
        self.progress.recv().await
    }

    /// Wait for the export to finish.
    pub async fn wait(self) -> JimakuResult<ExportOutcome> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) => Err(JimakuError::Other(anyhow::anyhow!(
                "export task terminated abnormally: {err}"
            ))),
        }
    }
}

/// Keeps reported progress monotonic across stages and jobs.
struct ProgressReporter<'a> {
    callback: ProgressCallback<'a>,
    last: Mutex<f64>,
}

impl<'a> ProgressReporter<'a> {
    fn new(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback,
            last: Mutex::new(0.0),
        }
    }

    fn report(&self, stage: ExportStage, percent: f64) {
        let percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let percent = {
            let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
            *last = last.max(percent);
            *last
        };
        (self.callback)(ExportProgress { stage, percent });
    }

    /// Report `stage` without moving the percentage.
    fn stage(&self, stage: ExportStage) {
        self.report(stage, 0.0);
    }
}

/// Runs exports against an [`Encoder`].
#[derive(Clone)]
pub struct ExportPipeline {
    encoder: Arc<dyn Encoder>,
    settings: EncoderSettings,
    temp_dir: PathBuf,
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("encoder", &self.encoder.name())
            .field("settings", &self.settings)
            .field("temp_dir", &self.temp_dir)
            .finish()
    }
}

impl ExportPipeline {
    pub fn new(encoder: Arc<dyn Encoder>, settings: EncoderSettings, temp_dir: PathBuf) -> Self {
        Self {
            encoder,
            settings,
            temp_dir,
        }
    }

    /// Pipeline backed by ffmpeg as configured in `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(FfmpegEncoder::new(&config.encoder)),
            config.encoder.clone(),
            config.resolved_temp_dir(),
        )
    }

    /// Burn `cues` into the whole of `input`, writing `output`.
    ///
    /// With no cues the source is transcoded unchanged.
    pub async fn export_with_overlay(
        &self,
        input: &Path,
        output: &Path,
        cues: &[TimedCue],
        cancel: &CancellationHandle,
        on_progress: ProgressCallback<'_>,
    ) -> JimakuResult<ExportOutcome> {
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            cues = cues.len(),
            "Starting overlay export"
        );
        let reporter = ProgressReporter::new(on_progress);
        let mut temps = TempArtifacts::new();
        let result = self
            .run_overlay(input, output, cues, cancel, &reporter, &mut temps)
            .await;
        finish(result, &reporter, temps)
    }

    /// Apply `edits` to `input`, writing `output` (plus `_part<N>` siblings
    /// for split exports).
    pub async fn export_with_edits(
        &self,
        input: &Path,
        output: &Path,
        edits: &[EditOperation],
        cancel: &CancellationHandle,
        on_progress: ProgressCallback<'_>,
    ) -> JimakuResult<ExportOutcome> {
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            edits = edits.len(),
            "Starting edit export"
        );
        let reporter = ProgressReporter::new(on_progress);
        let mut temps = TempArtifacts::new();
        let result = self
            .run_edits(input, output, edits, cancel, &reporter, &mut temps)
            .await;
        finish(result, &reporter, temps)
    }

    /// Run `request` as an independent task.
    ///
    /// Progress arrives on the task's channel; the channel closes when the
    /// export finishes.
    pub fn spawn(&self, request: ExportRequest) -> ExportTask {
        let pipeline = self.clone();
        let cancel = CancellationHandle::new();
        let task_cancel = cancel.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            let on_progress = move |p: ExportProgress| {
                // A dropped receiver only means nobody is watching.
                let _ = tx.send(p);
            };
            let ExportRequest {
                input,
                output,
                kind,
            } = request;
            match kind {
                ExportKind::Overlay { cues } => {
                    pipeline
                        .export_with_overlay(&input, &output, &cues, &task_cancel, &on_progress)
                        .await
                }
                ExportKind::Edits { edits } => {
                    pipeline
                        .export_with_edits(&input, &output, &edits, &task_cancel, &on_progress)
                        .await
                }
            }
        });

        ExportTask {
            handle,
            progress: rx,
            cancel,
        }
    }

    async fn run_overlay(
        &self,
        input: &Path,
        output: &Path,
        cues: &[TimedCue],
        cancel: &CancellationHandle,
        reporter: &ProgressReporter<'_>,
        temps: &mut TempArtifacts,
    ) -> JimakuResult<ExportOutcome> {
        reporter.stage(ExportStage::Planning);
        cancel.check()?;
        let info = self.inspect_source(input).await?;
        if !info.has_video {
            return Err(JimakuError::planning(format!(
                "{} has no video stream to draw the overlay on",
                input.display()
            )));
        }
        let temp_dir = self.prepare_dirs(output).await?;

        let script = if cues.is_empty() {
            None
        } else {
            reporter.stage(ExportStage::RenderingOverlay);
            let path = temps.allocate(&temp_dir, "overlay", "ass");
            tokio::fs::write(&path, render_overlay_script(cues)?).await?;
            Some(path)
        };

        cancel.check()?;
        let mut job = TranscodeJob::new(input, output, &self.settings)
            .with_audio(info.has_audio)
            .with_source_duration(info.duration_secs);
        if let Some(script) = script {
            job = job.with_overlay(script);
        }

        let stage = ExportStage::Encoding { index: 0, total: 1 };
        reporter.stage(stage);
        job.run(self.encoder.as_ref(), cancel, &|pct| reporter.report(stage, pct))
            .await?;

        Ok(ExportOutcome {
            outputs: vec![output.to_path_buf()],
            plan: None,
        })
    }

    async fn run_edits(
        &self,
        input: &Path,
        output: &Path,
        edits: &[EditOperation],
        cancel: &CancellationHandle,
        reporter: &ProgressReporter<'_>,
        temps: &mut TempArtifacts,
    ) -> JimakuResult<ExportOutcome> {
        reporter.stage(ExportStage::Planning);
        cancel.check()?;
        let info = self.inspect_source(input).await?;
        if !info.has_video && !info.has_audio {
            return Err(JimakuError::planning(format!(
                "{} has no audio or video streams",
                input.display()
            )));
        }
        let plan = plan(info.duration_secs, edits)?;
        let temp_dir = self.prepare_dirs(output).await?;
        let extension = output
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        let total = plan.segments.len();
        let mut parts = Vec::with_capacity(total);
        for (index, segment) in plan.segments.iter().enumerate() {
            cancel.check()?;
            let part = temps.allocate(&temp_dir, "segment", &extension);
            let job = TranscodeJob::for_segment(input, &part, segment, &self.settings)
                .with_audio(info.has_audio);

            let stage = ExportStage::Encoding { index, total };
            let base = index as f64 / total as f64 * 100.0;
            reporter.report(stage, base);
            job.run(self.encoder.as_ref(), cancel, &|pct| {
                reporter.report(stage, base + pct / total as f64)
            })
            .await?;
            parts.push(part);
        }

        cancel.check()?;
        reporter.stage(ExportStage::Concatenating);
        let outputs = if plan.is_standalone_parts() {
            let mut outputs = Vec::with_capacity(parts.len());
            for (index, part) in parts.iter().enumerate() {
                let dest = split_output_path(output, index);
                move_file(part, &dest).await?;
                outputs.push(dest);
            }
            outputs
        } else {
            concatenate(self.encoder.as_ref(), &parts, output, &temp_dir, cancel).await?;
            vec![output.to_path_buf()]
        };

        Ok(ExportOutcome {
            outputs,
            plan: Some(plan),
        })
    }

    async fn inspect_source(&self, input: &Path) -> JimakuResult<MediaInfo> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(JimakuError::FileNotFound {
                path: input.to_path_buf(),
            });
        }
        if !self.encoder.is_available().await {
            return Err(JimakuError::process(format!(
                "{} is not available (set encoder.ffmpeg_path in the config)",
                self.encoder.name()
            )));
        }
        self.encoder.probe(input).await
    }

    /// Create the temp and output directories; returns the absolute temp dir.
    async fn prepare_dirs(&self, output: &Path) -> JimakuResult<PathBuf> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        Ok(tokio::fs::canonicalize(&self.temp_dir).await?)
    }
}

fn finish(
    result: JimakuResult<ExportOutcome>,
    reporter: &ProgressReporter<'_>,
    mut temps: TempArtifacts,
) -> JimakuResult<ExportOutcome> {
    reporter.stage(ExportStage::CleaningUp);
    let failures = temps.cleanup();
    if failures > 0 {
        tracing::warn!(failures, "Some temporary files could not be removed");
    }

    match result {
        Ok(outcome) => {
            reporter.report(ExportStage::Done, 100.0);
            tracing::info!(outputs = ?outcome.outputs, "Export finished");
            Ok(outcome)
        }
        Err(JimakuError::Cancelled) => {
            reporter.stage(ExportStage::Cancelled);
            tracing::info!("Export cancelled");
            Err(JimakuError::Cancelled)
        }
        Err(err) => {
            reporter.stage(ExportStage::Failed);
            tracing::error!(error = %err, "Export failed");
            Err(err)
        }
    }
}

/// Path of split part `index`: the output itself for the first part,
/// `<stem>_part<N>.<ext>` beside it for the rest, numbered from 2.
pub fn split_output_path(output: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{stem}_part{}.{}", index + 1, ext.to_string_lossy()),
        None => format!("{stem}_part{}", index + 1),
    };
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_output_paths() {
        let out = Path::new("/videos/talk.mp4");
        assert_eq!(split_output_path(out, 0), PathBuf::from("/videos/talk.mp4"));
        assert_eq!(
            split_output_path(out, 1),
            PathBuf::from("/videos/talk_part2.mp4")
        );
        assert_eq!(
            split_output_path(out, 11),
            PathBuf::from("/videos/talk_part12.mp4")
        );
        assert_eq!(
            split_output_path(Path::new("clip"), 2),
            PathBuf::from("clip_part3")
        );
    }

    #[test]
    fn test_reporter_never_goes_backwards() {
        let seen = Mutex::new(Vec::new());
        let callback = |p: ExportProgress| seen.lock().unwrap().push(p.percent);
        let reporter = ProgressReporter::new(&callback);

        reporter.report(ExportStage::Encoding { index: 0, total: 2 }, 40.0);
        reporter.report(ExportStage::Encoding { index: 0, total: 2 }, 30.0);
        reporter.stage(ExportStage::Concatenating);
        reporter.report(ExportStage::Done, 150.0);

        assert_eq!(*seen.lock().unwrap(), vec![40.0, 40.0, 40.0, 100.0]);
    }
}
