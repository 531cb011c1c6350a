//! ASS v4+ overlay script generation.
//!
//! The script declares one style per [`CuePosition`] and carries each cue's
//! own size and color as inline override tags, so the style table never
//! depends on the cue set.

use std::fmt::Write as _;
use std::path::Path;

use jimaku_common::error::{JimakuError, JimakuResult};
use jimaku_common::timecode::format_ass_time;
use jimaku_project_model::cue::{CuePosition, Rgb, TimedCue};

/// Script resolution. Style sizes and margins are expressed in this space.
const PLAY_RES_X: u32 = 1920;
const PLAY_RES_Y: u32 = 1080;

const FONT_FAMILY: &str = "Noto Sans CJK JP";

/// Style font size: a logical 28 doubled, matching the cue size convention.
const STYLE_FONT_SIZE: u32 = 56;

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Numpad-style alignment code for a position.
fn alignment(position: CuePosition) -> u8 {
    match position {
        CuePosition::BottomLeft => 1,
        CuePosition::BottomCenter => 2,
        CuePosition::BottomRight => 3,
        CuePosition::Center => 5,
        CuePosition::TopCenter => 8,
    }
}

/// `&HBBGGRR` color as used by the `\c` override tag.
fn bgr_hex(color: Rgb) -> String {
    format!("&H{:02X}{:02X}{:02X}", color.b, color.g, color.r)
}

/// Cue text with line breaks turned into ASS hard breaks.
fn escape_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "\\N")
}

/// Render `cues` into a complete overlay script.
///
/// Cues are ordered by start time (stable for equal starts). An invalid cue
/// fails the whole render.
pub fn render_overlay_script(cues: &[TimedCue]) -> JimakuResult<String> {
    for (i, cue) in cues.iter().enumerate() {
        cue.validate()
            .map_err(|e| JimakuError::render(format!("cue #{}: {e}", i + 1)))?;
    }

    let mut ordered: Vec<&TimedCue> = cues.iter().collect();
    ordered.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));

    let mut out = String::new();
    write_script(&mut out, &ordered)
        .map_err(|e| JimakuError::render(format!("failed to format overlay script: {e}")))?;
    Ok(out)
}

fn write_script(out: &mut String, cues: &[&TimedCue]) -> std::fmt::Result {
    writeln!(out, "[Script Info]")?;
    writeln!(out, "Title: Jimaku Overlay")?;
    writeln!(out, "ScriptType: v4.00+")?;
    writeln!(out, "WrapStyle: 0")?;
    writeln!(out, "PlayResX: {PLAY_RES_X}")?;
    writeln!(out, "PlayResY: {PLAY_RES_Y}")?;
    writeln!(out, "ScaledBorderAndShadow: yes")?;
    writeln!(out)?;

    writeln!(out, "[V4+ Styles]")?;
    writeln!(out, "{STYLE_FORMAT}")?;
    for position in CuePosition::ALL {
        writeln!(
            out,
            "Style: {},{FONT_FAMILY},{STYLE_FONT_SIZE},&H00FFFFFF,&H000000FF,&H00000000,&H00000000,\
-1,0,0,0,100,100,0,0,1,3,3,{},40,40,40,1",
            position.name(),
            alignment(position),
        )?;
    }
    writeln!(out)?;

    writeln!(out, "[Events]")?;
    writeln!(out, "{EVENT_FORMAT}")?;
    for cue in cues {
        writeln!(
            out,
            "Dialogue: 0,{},{},{},,0,0,0,,{{\\fs{}\\c{}}}{}",
            format_ass_time(cue.start_secs),
            format_ass_time(cue.end_secs),
            cue.position.name(),
            (cue.font_size * 2.0) as u32,
            bgr_hex(cue.color),
            escape_text(&cue.text),
        )?;
    }
    Ok(())
}

/// Render `cues` and write the script to `path` as UTF-8.
pub fn write_overlay_script(cues: &[TimedCue], path: &Path) -> JimakuResult<()> {
    let script = render_overlay_script(cues)?;
    std::fs::write(path, script)?;
    tracing::debug!(path = %path.display(), cues = cues.len(), "Overlay script written");
    Ok(())
}
