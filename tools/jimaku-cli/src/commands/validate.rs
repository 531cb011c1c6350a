//! Validate an edit list.

use std::path::PathBuf;

use super::load_edit_list;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating edit list at: {}", path.display());

    let list = load_edit_list(&path)?;

    println!("  Version: {}", list.version);
    println!("  Cues: {}", list.cues.len());
    for cue in &list.cues {
        println!(
            "    {} -> {}  [{}] {}",
            cue.start_formatted(),
            cue.end_formatted(),
            cue.position.name(),
            cue.text.replace('\n', " / ")
        );
    }
    println!("  Edits: {}", list.edits.len());
    for edit in &list.edits {
        let mut line = format!(
            "    {:<12} {} -> {}",
            edit.kind.label(),
            edit.start_formatted(),
            edit.end_formatted()
        );
        if edit.kind == jimaku_project_model::EditKind::SpeedChange {
            line.push_str(&format!("  {}", edit.speed_label()));
        }
        if !edit.label.is_empty() {
            line.push_str(&format!("  ({})", edit.label));
        }
        println!("{line}");
    }

    let errors = list.validate();
    if errors.is_empty() {
        println!("\nEdit list is valid.");
        return Ok(());
    }

    println!("\nValidation issues:");
    for error in &errors {
        println!("  - {error}");
    }
    anyhow::bail!("{} issue(s) found", errors.len())
}
