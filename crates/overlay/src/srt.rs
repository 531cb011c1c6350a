//! SRT sidecar subtitles.

use std::path::Path;

use jimaku_common::error::JimakuResult;
use jimaku_common::timecode::format_srt_time;
use jimaku_project_model::cue::TimedCue;

use crate::ass::write_overlay_script;

/// Generate SRT content from cues, ordered by start time.
///
/// Position, size and color have no SRT equivalent and are dropped.
pub fn render_srt(cues: &[TimedCue]) -> String {
    let mut ordered: Vec<&TimedCue> = cues.iter().collect();
    ordered.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));

    let mut output = String::new();
    for (i, cue) in ordered.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(cue.start_secs),
            format_srt_time(cue.end_secs),
        ));
        output.push_str(&srt_text(&cue.text));
        output.push_str("\n\n");
    }
    output
}

/// Cue text with blank lines removed; a blank line ends an SRT block.
fn srt_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Save cues to `path`, choosing the format by extension.
///
/// `.ass` writes a full overlay script; anything else is written as SRT.
pub fn save_subtitles(cues: &[TimedCue], path: &Path) -> JimakuResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("ass") => write_overlay_script(cues, path)?,
        _ => std::fs::write(path, render_srt(cues))?,
    }
    tracing::info!(path = %path.display(), cues = cues.len(), "Subtitles saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srt_generation() {
        let cues = vec![
            TimedCue::new("This is a test", 3.0, 5.0),
            TimedCue::new("Hello world", 0.0, 2.5),
        ];

        let srt = render_srt(&cues);
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,500\nHello world\n\n"));
        assert!(srt.contains("2\n00:00:03,000 --> 00:00:05,000\nThis is a test\n\n"));
    }

    #[test]
    fn test_srt_hours_and_millis() {
        let srt = render_srt(&[TimedCue::new("late", 3661.5, 3662.125)]);
        assert!(srt.contains("01:01:01,500 --> 01:01:02,125"));
    }

    #[test]
    fn test_blank_lines_inside_cue_text_are_collapsed() {
        let cues = vec![
            TimedCue::new("first\n\nsecond", 0.0, 1.0),
            TimedCue::new("next\r\n\r\nline", 2.0, 3.0),
        ];
        let srt = render_srt(&cues);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,000\nfirst\nsecond\n\n\
             2\n00:00:02,000 --> 00:00:03,000\nnext\nline\n\n"
        );
        // Every block is separated by exactly one blank line.
        assert_eq!(srt.matches("\n\n").count(), 2);
    }

    #[test]
    fn test_empty_cue_list_is_empty_file() {
        assert!(render_srt(&[]).is_empty());
    }

    #[test]
    fn test_save_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let cues = vec![TimedCue::new("Hi", 0.0, 1.0)];

        let srt_path = dir.path().join("clip.srt");
        save_subtitles(&cues, &srt_path).unwrap();
        let srt = std::fs::read_to_string(&srt_path).unwrap();
        assert!(srt.starts_with("1\n"));

        let ass_path = dir.path().join("clip.ASS");
        save_subtitles(&cues, &ass_path).unwrap();
        let ass = std::fs::read_to_string(&ass_path).unwrap();
        assert!(ass.starts_with("[Script Info]"));
    }

    #[test]
    fn test_save_ass_rejects_invalid_cue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ass");
        assert!(save_subtitles(&[TimedCue::new("x", 2.0, 1.0)], &path).is_err());
        assert!(!path.exists());
    }
}
