//! Apply timeline edits to a video.

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
    let output = output.unwrap_or_else(|| default_output(&input, "edited"));

    println!("Editing: {}", input.display());
    println!("  Edits: {}", list.edits.len());
    println!("  Output: {}", output.display());

    let pipeline = ExportPipeline::from_config(config);
    let outcome = run_export(
        &pipeline,
        ExportRequest {
            input,
            output,
            kind: ExportKind::Edits { edits: list.edits },
        },
    )
    .await?;

    if let Some(plan) = &outcome.plan {
        println!(
            "  Segments: {} ({:.3}s of output)",
            plan.segments.len(),
            plan.output_duration_secs()
        );
    }
    for path in &outcome.outputs {
        println!("Export complete: {}", path.display());
    }
    Ok(())
}
