//! Single transcode jobs.
//!
//! A job turns one input range into one encoded file: optional overlay burn-in,
//! optional speed change, codec parameters from [`EncoderSettings`]. The
//! encoder writes to a sibling part file that only replaces the target once
//! the run has succeeded.

use std::path::{Path, PathBuf};

use jimaku_common::config::EncoderSettings;
use jimaku_common::error::JimakuResult;
use jimaku_common::timecode::format_encoder_secs;
use jimaku_project_model::segment::{OutputSegment, SPEED_EPSILON};

use crate::cancel::CancellationHandle;
use crate::encoder::{Encoder, EncoderInvocation, EncoderMode, EncoderProgress};
use crate::temp::{discard_part, sibling_part_path};

/// Range of the source to encode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl TimeRange {
    pub fn new(start_secs: f64, duration_secs: f64) -> Self {
        Self {
            start_secs,
            duration_secs,
        }
    }
}

/// One encoder run producing one output file.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub range: Option<TimeRange>,
    pub overlay_script: Option<PathBuf>,
    pub speed_ratio: f64,
    pub has_audio: bool,

    /// Source duration, used for progress when no range is set.
    pub source_duration_secs: f64,

    pub settings: EncoderSettings,
}

impl TranscodeJob {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        settings: &EncoderSettings,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            range: None,
            overlay_script: None,
            speed_ratio: 1.0,
            has_audio: true,
            source_duration_secs: 0.0,
            settings: settings.clone(),
        }
    }

    /// Job encoding exactly `segment` of `input`.
    pub fn for_segment(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        segment: &OutputSegment,
        settings: &EncoderSettings,
    ) -> Self {
        Self::new(input, output, settings)
            .with_range(TimeRange::new(segment.start_secs, segment.duration_secs()))
            .with_speed(segment.speed_ratio)
    }

    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_overlay(mut self, script: impl Into<PathBuf>) -> Self {
        self.overlay_script = Some(script.into());
        self
    }

    pub fn with_speed(mut self, speed_ratio: f64) -> Self {
        self.speed_ratio = speed_ratio;
        self
    }

    pub fn with_audio(mut self, has_audio: bool) -> Self {
        self.has_audio = has_audio;
        self
    }

    pub fn with_source_duration(mut self, secs: f64) -> Self {
        self.source_duration_secs = secs;
        self
    }

    fn applies_speed(&self) -> bool {
        (self.speed_ratio - 1.0).abs() > SPEED_EPSILON
    }

    /// Length of the encoded output.
    pub fn output_duration_secs(&self) -> f64 {
        let source = self
            .range
            .map(|r| r.duration_secs)
            .unwrap_or(self.source_duration_secs);
        if self.applies_speed() {
            source / self.speed_ratio
        } else {
            source
        }
    }

    /// Encoder arguments writing to `output`.
    ///
    /// Seeking happens on the output side so filters see source timestamps
    /// (the overlay script is timed against the source). With a speed change
    /// the seek values are scaled into the sped-up timeline.
    pub fn build_args(&self, output: &Path) -> Vec<String> {
        let speed = self.applies_speed().then_some(self.speed_ratio);

        let mut args = vec!["-i".to_string(), self.input.to_string_lossy().into_owned()];

        if let Some(range) = self.range {
            let scale = speed.unwrap_or(1.0);
            args.extend([
                "-ss".to_string(),
                format_encoder_secs(range.start_secs / scale),
                "-t".to_string(),
                format_encoder_secs(range.duration_secs / scale),
            ]);
        }

        let mut video_filters = Vec::new();
        if let Some(script) = &self.overlay_script {
            video_filters.push(format!("ass={}", escape_filter_path(script)));
        }
        if let Some(r) = speed {
            video_filters.push(format!("setpts={}*PTS", format_factor(1.0 / r)));
        }
        if !video_filters.is_empty() {
            args.push("-vf".to_string());
            args.push(video_filters.join(","));
        }

        if let (Some(r), true) = (speed, self.has_audio) {
            let chain: Vec<String> = atempo_chain(r)
                .into_iter()
                .map(|f| format!("atempo={}", format_factor(f)))
                .collect();
            args.push("-af".to_string());
            args.push(chain.join(","));
        }

        args.extend([
            "-c:v".to_string(),
            self.settings.video_codec.clone(),
            "-preset".to_string(),
            self.settings.preset.clone(),
            "-crf".to_string(),
            self.settings.crf.to_string(),
        ]);
        if self.has_audio {
            args.extend([
                "-c:a".to_string(),
                self.settings.audio_codec.clone(),
                "-b:a".to_string(),
                format!("{}k", self.settings.audio_bitrate_kbps),
            ]);
        }

        args.push(output.to_string_lossy().into_owned());
        args
    }

    /// Run the job, reporting its own progress in percent.
    pub async fn run(
        &self,
        encoder: &dyn Encoder,
        cancel: &CancellationHandle,
        on_progress: &(dyn Fn(f64) + Send + Sync),
    ) -> JimakuResult<()> {
        cancel.check()?;

        let part = sibling_part_path(&self.output);
        let invocation = EncoderInvocation::new(
            EncoderMode::Transcode,
            self.build_args(&part),
            self.output_duration_secs(),
        );

        tracing::debug!(
            input = %self.input.display(),
            output = %self.output.display(),
            range = ?self.range,
            speed_ratio = self.speed_ratio,
            overlay = self.overlay_script.is_some(),
            "Starting transcode job"
        );

        let forward = |p: EncoderProgress| on_progress(p.percent());
        let result = encoder.run(&invocation, cancel, &forward).await;

        if let Err(err) = result {
            discard_part(&part).await;
            return Err(err);
        }
        if let Err(err) = tokio::fs::rename(&part, &self.output).await {
            discard_part(&part).await;
            return Err(err.into());
        }

        on_progress(100.0);
        Ok(())
    }
}

/// Quote a path for use as a filter option inside a filter graph.
///
/// Level one escapes `\`, `:` and `'` for the option parser; level two wraps
/// the result in single quotes for the graph parser, closing and reopening
/// the quotes around any literal `'`.
pub fn escape_filter_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut option = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        if matches!(c, '\\' | ':' | '\'') {
            option.push('\\');
        }
        option.push(c);
    }
    format!("'{}'", option.replace('\'', r"'\''"))
}

/// `atempo` factors, each within `[0.5, 2.0]`, whose product is `ratio`.
pub fn atempo_chain(ratio: f64) -> Vec<f64> {
    let mut factors = Vec::new();
    let mut remaining = ratio;
    while remaining > 2.0 {
        factors.push(2.0);
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        factors.push(0.5);
        remaining /= 0.5;
    }
    factors.push(remaining);
    factors
}

fn format_factor(value: f64) -> String {
    let s = format!("{value:.6}");
    let s = s.trim_end_matches('0');
    s.strip_suffix('.').unwrap_or(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EncoderSettings {
        EncoderSettings::default()
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_whole_file_overlay_args() {
        let job = TranscodeJob::new("in.mp4", "out.mp4", &settings()).with_overlay("/tmp/o.ass");
        let args = job.build_args(Path::new("out.part.mp4"));

        assert_eq!(&args[..2], &["-i".to_string(), "in.mp4".to_string()]);
        assert!(value_after(&args, "-ss").is_none());
        assert_eq!(value_after(&args, "-vf"), Some("ass='/tmp/o.ass'"));
        assert!(value_after(&args, "-af").is_none());
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&args, "-preset"), Some("medium"));
        assert_eq!(value_after(&args, "-crf"), Some("23"));
        assert_eq!(value_after(&args, "-c:a"), Some("aac"));
        assert_eq!(value_after(&args, "-b:a"), Some("192k"));
        assert_eq!(args.last().unwrap(), "out.part.mp4");
    }

    #[test]
    fn test_segment_seeks_after_input() {
        let seg = OutputSegment::new(20.0, 100.0, 1.0);
        let job = TranscodeJob::for_segment("in.mp4", "seg.mp4", &seg, &settings());
        let args = job.build_args(Path::new("seg.part.mp4"));

        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        let ss_pos = args.iter().position(|a| a == "-ss").unwrap();
        assert!(ss_pos > input_pos);
        assert_eq!(value_after(&args, "-ss"), Some("20.000"));
        assert_eq!(value_after(&args, "-t"), Some("80.000"));
        assert!(value_after(&args, "-vf").is_none());
        assert!((job.output_duration_secs() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_change_adds_filters_and_scales_seek() {
        let seg = OutputSegment::new(30.0, 40.0, 2.0);
        let job = TranscodeJob::for_segment("in.mp4", "seg.mp4", &seg, &settings());
        let args = job.build_args(Path::new("seg.part.mp4"));

        assert_eq!(value_after(&args, "-vf"), Some("setpts=0.5*PTS"));
        assert_eq!(value_after(&args, "-af"), Some("atempo=2"));
        assert_eq!(value_after(&args, "-ss"), Some("15.000"));
        assert_eq!(value_after(&args, "-t"), Some("5.000"));
        assert!((job.output_duration_secs() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_near_unity_speed_adds_no_filters() {
        let seg = OutputSegment::new(0.0, 10.0, 1.005);
        let job = TranscodeJob::for_segment("in.mp4", "seg.mp4", &seg, &settings());
        let args = job.build_args(Path::new("seg.part.mp4"));
        assert!(value_after(&args, "-vf").is_none());
        assert!(value_after(&args, "-af").is_none());
    }

    #[test]
    fn test_silent_source_gets_no_audio_args() {
        let seg = OutputSegment::new(0.0, 10.0, 3.0);
        let job =
            TranscodeJob::for_segment("in.mp4", "seg.mp4", &seg, &settings()).with_audio(false);
        let args = job.build_args(Path::new("seg.part.mp4"));
        assert!(value_after(&args, "-af").is_none());
        assert!(value_after(&args, "-c:a").is_none());
        assert!(value_after(&args, "-b:a").is_none());
    }

    #[test]
    fn test_overlay_and_speed_share_one_filter_chain() {
        let job = TranscodeJob::new("in.mp4", "out.mp4", &settings())
            .with_overlay("o.ass")
            .with_speed(0.5);
        let args = job.build_args(Path::new("out.part.mp4"));
        assert_eq!(value_after(&args, "-vf"), Some("ass='o.ass',setpts=2*PTS"));
        assert_eq!(value_after(&args, "-af"), Some("atempo=0.5"));
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(
            escape_filter_path(Path::new(r"C:\Users\me\sub.ass")),
            r"'C\:\\Users\\me\\sub.ass'"
        );
        assert_eq!(
            escape_filter_path(Path::new("/tmp/it's.ass")),
            r"'/tmp/it\'\''s.ass'"
        );
    }

    #[test]
    fn test_atempo_chain_stays_in_range() {
        assert_eq!(atempo_chain(2.0), vec![2.0]);
        assert_eq!(atempo_chain(1.5), vec![1.5]);

        for ratio in [0.1, 0.25, 0.3, 3.0, 4.0, 10.0] {
            let chain = atempo_chain(ratio);
            assert!(chain.iter().all(|f| (0.5..=2.0).contains(f)), "{ratio}: {chain:?}");
            let product: f64 = chain.iter().product();
            assert!((product - ratio).abs() < 1e-9, "{ratio}: {chain:?}");
        }
    }

    #[test]
    fn test_format_factor() {
        assert_eq!(format_factor(0.5), "0.5");
        assert_eq!(format_factor(2.0), "2");
        assert_eq!(format_factor(1.0 / 3.0), "0.333333");
    }
}
