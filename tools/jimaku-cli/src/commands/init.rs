//! Create a starter edit list.

use std::path::PathBuf;

use jimaku_common::config::{config_file_path, AppConfig};
use jimaku_project_model::{CuePosition, EditList, EditOperation, Rgb, TimedCue};

pub fn run(path: PathBuf, force: bool, with_config: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let mut list = EditList::new();
    list.cues.push(TimedCue::new("Caption text", 1.0, 4.0));
    list.cues.push(
        TimedCue::new("Title", 0.0, 3.0)
            .with_position(CuePosition::TopCenter)
            .with_color(Rgb::WHITE),
    );
    list.edits
        .push(EditOperation::cut(10.0, 12.5).with_label("remove pause"));
    list.save(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write edit list: {e}"))?;

    println!("Created edit list: {}", path.display());
    println!("  2 cues, 1 edit. Edit the JSON, then run:");
    println!("    jimaku validate {}", path.display());
    println!("    jimaku burn <video> {}", path.display());

    if with_config {
        let config_path = config_file_path();
        if config_path.exists() {
            println!("Config already present: {}", config_path.display());
        } else {
            AppConfig::default().save()?;
            println!("Wrote default config: {}", config_path.display());
        }
    }

    Ok(())
}
