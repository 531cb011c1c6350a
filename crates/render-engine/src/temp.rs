//! Intermediate files.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// `<dir>/<prefix>-<uuid>.<extension>`.
pub fn unique_temp_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    dir.join(format!("{prefix}-{}.{extension}", Uuid::new_v4().simple()))
}

/// Unique in-progress path next to `output`: `<stem>.<uuid>.part.<ext>`.
///
/// The real extension stays last so the encoder still picks the container
/// from it.
pub fn sibling_part_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let token = Uuid::new_v4().simple().to_string();
    let name = match output.extension() {
        Some(ext) => format!("{stem}.{}.part.{}", &token[..8], ext.to_string_lossy()),
        None => format!("{stem}.{}.part", &token[..8]),
    };
    output.with_file_name(name)
}

/// Removes a file, treating "already gone" as success.
pub(crate) fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

/// Remove an in-progress output left by a failed run, logging any failure.
pub(crate) async fn discard_part(part: &Path) {
    match tokio::fs::remove_file(part).await {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %part.display(), error = %err, "Failed to remove partial output");
        }
        _ => {}
    }
}

/// Temp files owned by one export run.
///
/// Everything allocated here is deleted by [`cleanup`](Self::cleanup) or,
/// failing that, on drop. Removal failures are logged and never returned.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    paths: Vec<PathBuf>,
}

impl TempArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a new unique path in `dir` and track it.
    pub fn allocate(&mut self, dir: &Path, prefix: &str, extension: &str) -> PathBuf {
        let path = unique_temp_path(dir, prefix, extension);
        self.paths.push(path.clone());
        path
    }

    /// Delete every tracked file. Returns how many could not be removed.
    pub fn cleanup(&mut self) -> usize {
        let mut failures = 0;
        for path in self.paths.drain(..) {
            if let Err(err) = remove_if_exists(&path) {
                failures += 1;
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to remove temporary file"
                );
            }
        }
        failures
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        if !self.paths.is_empty() {
            self.cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_paths_differ() {
        let dir = Path::new("/tmp");
        let a = unique_temp_path(dir, "segment", "mp4");
        let b = unique_temp_path(dir, "segment", "mp4");
        assert_ne!(a, b);
        assert!(a.file_name().unwrap().to_string_lossy().starts_with("segment-"));
        assert_eq!(a.extension().unwrap(), "mp4");
    }

    #[test]
    fn test_part_path_keeps_extension_and_directory() {
        let part = sibling_part_path(Path::new("/videos/out.mp4"));
        assert_eq!(part.parent().unwrap(), Path::new("/videos"));
        assert_eq!(part.extension().unwrap(), "mp4");
        let name = part.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("out."));
        assert!(name.ends_with(".part.mp4"));
    }

    #[test]
    fn test_cleanup_removes_tracked_files_and_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut temps = TempArtifacts::new();
        let created = temps.allocate(dir.path(), "segment", "mp4");
        std::fs::write(&created, b"data").unwrap();
        temps.allocate(dir.path(), "never-written", "mp4");

        assert_eq!(temps.cleanup(), 0);
        assert!(!created.exists());
    }

    #[tokio::test]
    async fn test_discard_part_removes_file_and_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let part = sibling_part_path(&dir.path().join("out.mp4"));
        std::fs::write(&part, b"partial").unwrap();

        discard_part(&part).await;
        assert!(!part.exists());
        discard_part(&part).await;
    }

    #[test]
    fn test_drop_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut temps = TempArtifacts::new();
            let path = temps.allocate(dir.path(), "overlay", "ass");
            std::fs::write(&path, "x").unwrap();
            path
        };
        assert!(!path.exists());
    }
}
