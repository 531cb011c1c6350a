//! Burn cues into a video.

use std::path::PathBuf;

use jimaku_common::config::AppConfig;
use jimaku_render_engine::{ExportKind, ExportPipeline, ExportRequest};

use super::{default_output, load_edit_list, run_export};

pub async fn run(
    config: &AppConfig,
    input: PathBuf,
    edits: PathBuf,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let list = load_edit_list(&edits)?;
    let output = output.unwrap_or_else(|| default_output(&input, "captioned"));

    println!("Burning captions into: {}", input.display());
    println!("  Cues: {}", list.cues.len());
    println!("  Output: {}", output.display());
    if list.cues.is_empty() {
        println!("  (no cues: the video is re-encoded unchanged)");
    }

    let pipeline = ExportPipeline::from_config(config);
    let outcome = run_export(
        &pipeline,
        ExportRequest {
            input,
            output,
            kind: ExportKind::Overlay { cues: list.cues },
        },
    )
    .await?;

    for path in &outcome.outputs {
        println!("Export complete: {}", path.display());
    }
    Ok(())
}
