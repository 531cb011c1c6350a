//! Show the output segments an edit list produces.

use std::path::PathBuf;

use jimaku_common::config::AppConfig;
use jimaku_common::timecode::format_display_time;
use jimaku_processing_core::{plan, PlanMode};
use jimaku_render_engine::{Encoder, FfmpegEncoder};

use super::load_edit_list;

pub async fn run(
    config: &AppConfig,
    edits: PathBuf,
    duration: Option<f64>,
    input: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let list = load_edit_list(&edits)?;

    let duration = match (duration, input) {
        (Some(duration), _) => duration,
        (None, Some(input)) => {
            FfmpegEncoder::new(&config.encoder)
                .probe(&input)
                .await?
                .duration_secs
        }
        (None, None) => anyhow::bail!("Pass --duration or --input so the source length is known"),
    };

    let plan = plan(duration, &list.edits)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan.segments)?);
        return Ok(());
    }

    println!("Segment plan for: {}", edits.display());
    println!("  Source duration: {}", format_display_time(duration));
    println!("  Edits: {}", list.edits.len());
    println!(
        "  Mode: {}",
        match plan.mode {
            PlanMode::Trim => "trim",
            PlanMode::Split => "split (one file per segment)",
            PlanMode::Sweep => "cut/speed (joined into one file)",
        }
    );
    println!();
    for (i, seg) in plan.segments.iter().enumerate() {
        println!(
            "  {:>3}. {} -> {}  {:>5.2}x  ({:.3}s out)",
            i + 1,
            format_display_time(seg.start_secs),
            format_display_time(seg.end_secs),
            seg.speed_ratio,
            seg.output_duration_secs(),
        );
    }
    println!();
    println!(
        "  Output duration: {}",
        format_display_time(plan.output_duration_secs())
    );

    Ok(())
}
