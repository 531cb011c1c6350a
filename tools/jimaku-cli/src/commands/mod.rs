pub mod burn;
pub mod check;
pub mod edit;
pub mod init;
pub mod plan;
pub mod subtitles;
pub mod validate;

use std::io::Write;
use std::path::{Path, PathBuf};

use jimaku_project_model::EditList;
use jimaku_render_engine::{ExportOutcome, ExportPipeline, ExportRequest, ExportStage};

pub(crate) fn load_edit_list(path: &Path) -> anyhow::Result<EditList> {
    EditList::load(path).map_err(|e| anyhow::anyhow!("Failed to load edit list: {e}"))
}

/// `<dir>/<stem>_<suffix>.<ext>` next to `input`.
pub(crate) fn default_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    input.with_file_name(format!("{stem}_{suffix}.{ext}"))
}

fn stage_label(stage: ExportStage) -> String {
    match stage {
        ExportStage::Idle => "Idle".to_string(),
        ExportStage::Planning => "Planning".to_string(),
        ExportStage::RenderingOverlay => "Rendering overlay".to_string(),
        ExportStage::Encoding { index, total } => format!("Encoding {}/{}", index + 1, total),
        ExportStage::Concatenating => "Assembling".to_string(),
        ExportStage::CleaningUp => "Cleaning up".to_string(),
        ExportStage::Done => "Done".to_string(),
        ExportStage::Failed => "Failed".to_string(),
        ExportStage::Cancelled => "Cancelled".to_string(),
    }
}

/// Spawn `request`, print progress until it finishes, and cancel on Ctrl-C.
pub(crate) async fn run_export(
    pipeline: &ExportPipeline,
    request: ExportRequest,
) -> anyhow::Result<ExportOutcome> {
    let mut task = pipeline.spawn(request);

    let cancel = task.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling export...");
            cancel.cancel();
        }
    });

    while let Some(p) = task.next_progress().await {
        print!("\r  {:<20} {:5.1}%  ", stage_label(p.stage), p.percent);
        let _ = std::io::stdout().flush();
    }
    println!();
    interrupt.abort();

    Ok(task.wait().await?)
}
