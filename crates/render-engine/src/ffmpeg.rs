//! ffmpeg/ffprobe backed [`Encoder`].

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{ChildStdout, Command};

use jimaku_common::config::EncoderSettings;
use jimaku_common::error::{JimakuError, JimakuResult};

use crate::cancel::CancellationHandle;
use crate::encoder::{
    Encoder, EncoderInvocation, EncoderMode, EncoderProgress, EncoderProgressFn, MediaInfo,
};

/// Arguments placed before every transcode/concat invocation. Progress goes
/// to stdout as `key=value` blocks, diagnostics to stderr.
const COMMON_ARGS: [&str; 7] = [
    "-y",
    "-hide_banner",
    "-loglevel",
    "error",
    "-nostats",
    "-progress",
    "pipe:1",
];

/// Lines of stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 12;

/// Encoder that shells out to ffmpeg and ffprobe.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(settings: &EncoderSettings) -> Self {
        Self {
            ffmpeg_path: settings.ffmpeg_path.clone(),
            ffprobe_path: settings.ffprobe_path.clone(),
        }
    }

    fn program(&self, mode: EncoderMode) -> &Path {
        match mode {
            EncoderMode::Probe => &self.ffprobe_path,
            EncoderMode::Transcode | EncoderMode::StreamCopyConcat => &self.ffmpeg_path,
        }
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(&EncoderSettings::default())
    }
}

#[async_trait::async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn is_available(&self) -> bool {
        command_runs(&self.ffmpeg_path).await && command_runs(&self.ffprobe_path).await
    }

    async fn probe(&self, path: &Path) -> JimakuResult<MediaInfo> {
        if !path.exists() {
            return Err(JimakuError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let program = self.program(EncoderMode::Probe);
        let output = Command::new(program)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                JimakuError::process(format!("Failed to start {}: {e}", program.display()))
            })?;

        if !output.status.success() {
            return Err(JimakuError::process(format!(
                "ffprobe failed for {} ({}): {}",
                path.display(),
                output.status,
                stderr_tail(&String::from_utf8_lossy(&output.stderr))
            )));
        }

        let info = parse_probe_output(&output.stdout)?;
        tracing::debug!(
            path = %path.display(),
            duration_secs = info.duration_secs,
            has_video = info.has_video,
            has_audio = info.has_audio,
            "Probed media"
        );
        Ok(info)
    }

    async fn run(
        &self,
        invocation: &EncoderInvocation,
        cancel: &CancellationHandle,
        on_progress: EncoderProgressFn<'_>,
    ) -> JimakuResult<()> {
        cancel.check()?;

        let program = self.program(invocation.mode);
        let mut cmd = Command::new(program);
        if invocation.mode != EncoderMode::Probe {
            cmd.args(COMMON_ARGS);
        }
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(mode = ?invocation.mode, args = ?invocation.args, "Running encoder");
        let started = std::time::Instant::now();
        let mut child = cmd.spawn().map_err(|e| {
            JimakuError::process(format!("Failed to start {}: {e}", program.display()))
        })?;

        tracing::info!(
            pid = child.id(),
            mode = ?invocation.mode,
            expected_duration_secs = invocation.expected_duration_secs,
            "Encoder process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| JimakuError::process("Failed to capture encoder stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| JimakuError::process("Failed to capture encoder stderr"))?;

        // Drained concurrently so a chatty encoder never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut stderr = stderr;
            let mut buf = Vec::new();
            match stderr.read_to_end(&mut buf).await {
                Ok(_) => String::from_utf8_lossy(&buf).into_owned(),
                Err(err) => format!("<failed to read encoder stderr: {err}>"),
            }
        });

        let finished = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            status = async {
                pump_progress(stdout, invocation.expected_duration_secs, on_progress).await?;
                child.wait().await.map_err(|e| {
                    JimakuError::process(format!("Failed to wait on encoder: {e}"))
                })
            } => Some(status),
        };

        let status = match finished {
            Some(status) => status?,
            None => {
                if let Err(err) = child.kill().await {
                    tracing::warn!(error = %err, "Failed to kill encoder process");
                }
                stderr_task.abort();
                tracing::info!(
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "Encoder process stopped after cancellation"
                );
                return Err(JimakuError::Cancelled);
            }
        };

        let stderr_output = stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(JimakuError::process(format!(
                "{} exited with {status}: {}",
                program.display(),
                stderr_tail(&stderr_output)
            )));
        }

        tracing::debug!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            mode = ?invocation.mode,
            "Encoder process finished"
        );
        Ok(())
    }
}

async fn pump_progress(
    stdout: ChildStdout,
    total_secs: f64,
    on_progress: EncoderProgressFn<'_>,
) -> JimakuResult<()> {
    let mut lines = BufReader::new(stdout).lines();
    let mut state = ProgressState::default();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| JimakuError::process(format!("Failed reading encoder progress: {e}")))?
    {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        state.update(key, value);
        // A `progress=` line closes each report block.
        if key == "progress" {
            on_progress(EncoderProgress {
                processed_secs: if state.complete {
                    total_secs.max(state.out_time_secs)
                } else {
                    state.out_time_secs
                },
                total_secs,
            });
        }
    }
    Ok(())
}

/// Accumulates one `-progress` block.
#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // Both keys carry microseconds despite the name of the first.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.trim().parse::<f64>() {
                    if us >= 0.0 {
                        self.out_time_secs = us / 1_000_000.0;
                    }
                }
            }
            "progress" => {
                self.complete = value.trim() == "end";
            }
            _ => {}
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_duration(raw: Option<&str>) -> Option<f64> {
    raw?.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Turn `ffprobe -print_format json` output into [`MediaInfo`].
///
/// The container duration wins; the longest stream is the fallback.
fn parse_probe_output(stdout: &[u8]) -> JimakuResult<MediaInfo> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)?;

    let has_stream = |kind: &str| {
        probe
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some(kind))
    };

    let duration_secs = probe
        .format
        .as_ref()
        .and_then(|f| parse_duration(f.duration.as_deref()))
        .or_else(|| {
            probe
                .streams
                .iter()
                .filter_map(|s| parse_duration(s.duration.as_deref()))
                .reduce(f64::max)
        })
        .unwrap_or(0.0);

    Ok(MediaInfo {
        duration_secs,
        has_video: has_stream("video"),
        has_audio: has_stream("audio"),
    })
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    let tail = lines[start..].join("\n");
    if tail.is_empty() {
        "<no diagnostics>".to_string()
    } else {
        tail
    }
}

async fn command_runs(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}
