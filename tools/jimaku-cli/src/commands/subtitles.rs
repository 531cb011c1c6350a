//! Write cues as a subtitle file.

use std::path::PathBuf;

use jimaku_overlay::save_subtitles;

use super::load_edit_list;

pub fn run(edits: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let list = load_edit_list(&edits)?;
    save_subtitles(&list.cues, &output)?;
    println!("Wrote {} cue(s) to {}", list.cues.len(), output.display());
    Ok(())
}
