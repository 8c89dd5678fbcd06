// ============================================================
// Layer 4: Artifact Discovery
// ============================================================
// Lists the artifact files directly inside the input directory
// (no recursion) whose extension matches the selected format,
// sorted lexicographically so every run visits files in the
// same order. That order fixes where a row cap truncates.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::{error::ConvertError, options::ArtifactFormat};

/// Return the sorted artifact paths, or `ConvertError::Discovery`
/// when there are none (including when the directory is missing).
pub fn discover(dir: &Path, format: ArtifactFormat) -> Result<Vec<PathBuf>, ConvertError> {
    let extension = format.extension();
    let empty = || ConvertError::Discovery { dir: dir.to_path_buf(), extension };

    if !dir.is_dir() {
        return Err(empty());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))? {
        let path = entry.map_err(|e| ConvertError::io(dir, e))?.path();

        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension) {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(empty());
    }

    paths.sort();
    tracing::info!("Found {} .{} artifacts in '{}'", paths.len(), extension, dir.display());
    Ok(paths)
}
