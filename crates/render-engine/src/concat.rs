//! Joining encoded parts into one file.

use std::path::{Path, PathBuf};

use jimaku_common::error::{JimakuError, JimakuResult};

use crate::cancel::CancellationHandle;
use crate::encoder::{Encoder, EncoderInvocation, EncoderMode};
use crate::temp::{discard_part, sibling_part_path, TempArtifacts};

/// Join `parts` in order into `output` without re-encoding.
///
/// A single part is moved into place. Otherwise a concat manifest is written
/// to `temp_dir`, removed again whatever the outcome.
pub async fn concatenate(
    encoder: &dyn Encoder,
    parts: &[PathBuf],
    output: &Path,
    temp_dir: &Path,
    cancel: &CancellationHandle,
) -> JimakuResult<()> {
    cancel.check()?;

    match parts {
        [] => Err(JimakuError::invalid_input("no parts to concatenate")),
        [single] => {
            tracing::debug!(part = %single.display(), output = %output.display(), "Moving single part into place");
            move_file(single, output).await
        }
        _ => {
            let mut manifest_guard = TempArtifacts::new();
            let manifest = manifest_guard.allocate(temp_dir, "concat", "txt");
            tokio::fs::write(&manifest, concat_manifest(parts)).await?;

            let part = sibling_part_path(output);
            let invocation = EncoderInvocation::new(
                EncoderMode::StreamCopyConcat,
                vec![
                    "-f".to_string(),
                    "concat".to_string(),
                    "-safe".to_string(),
                    "0".to_string(),
                    "-i".to_string(),
                    manifest.to_string_lossy().into_owned(),
                    "-c".to_string(),
                    "copy".to_string(),
                    part.to_string_lossy().into_owned(),
                ],
                0.0,
            );

            tracing::info!(parts = parts.len(), output = %output.display(), "Concatenating parts");
            let result = match encoder.run(&invocation, cancel, &|_| {}).await {
                Ok(()) => tokio::fs::rename(&part, output).await.map_err(Into::into),
                Err(err) => Err(err),
            };
            if result.is_err() {
                discard_part(&part).await;
            }
            manifest_guard.cleanup();
            result
        }
    }
}

/// Concat demuxer manifest: one `file '<path>'` line per part.
pub fn concat_manifest(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', r"'\''")))
        .collect()
}

/// Rename `from` to `to`, copying when a rename is not possible
/// (e.g. across filesystems).
pub async fn move_file(from: &Path, to: &Path) -> JimakuResult<()> {
    if let Err(err) = tokio::fs::rename(from, to).await {
        tracing::debug!(
            from = %from.display(),
            to = %to.display(),
            error = %err,
            "Rename failed, falling back to copy"
        );
        tokio::fs::copy(from, to).await?;
        tokio::fs::remove_file(from).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_lists_parts_in_order_and_escapes_quotes() {
        let parts = vec![
            PathBuf::from("/tmp/a.mp4"),
            PathBuf::from("/tmp/it's.mp4"),
        ];
        assert_eq!(
            concat_manifest(&parts),
            "file '/tmp/a.mp4'\nfile '/tmp/it'\\''s.mp4'\n"
        );
    }

    #[tokio::test]
    async fn test_move_file() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.mp4");
        let to = dir.path().join("b.mp4");
        std::fs::write(&from, "payload").unwrap();

        move_file(&from, &to).await.unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "payload");
    }
}
