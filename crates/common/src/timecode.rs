//! Timecode formatting.
//!
//! All times in Jimaku are `f64` seconds from the start of the source file.
//! Formatting rounds to the nearest millisecond first and then truncates to
//! the target precision, so `1.23` renders as `0:00:01.23` rather than
//! falling victim to `122.999…` centiseconds. Negative and non-finite inputs
//! render as zero.

/// Milliseconds per hour.
const MS_PER_HOUR: u64 = 3_600_000;
/// Milliseconds per minute.
const MS_PER_MINUTE: u64 = 60_000;

fn total_millis(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * 1000.0).round() as u64
}

fn split_millis(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = total_millis(secs);
    (
        total_ms / MS_PER_HOUR,
        (total_ms % MS_PER_HOUR) / MS_PER_MINUTE,
        (total_ms % MS_PER_MINUTE) / 1000,
        total_ms % 1000,
    )
}

/// Format seconds as an overlay script timestamp: `H:MM:SS.CC`.
///
/// Hours are not padded.
pub fn format_ass_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours}:{minutes:02}:{seconds:02}.{:02}", millis / 10)
}

/// Format seconds as an SRT timestamp: `HH:MM:SS,mmm`.
pub fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds for display next to cues and edits: `hh:mm:ss.ff`.
pub fn format_display_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{:02}", millis / 10)
}

/// Format seconds as a plain decimal argument for the encoder command line.
pub fn format_encoder_secs(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    format!("{secs:.3}")
}
