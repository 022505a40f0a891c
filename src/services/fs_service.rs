use crate::config::OrganizerConfig;
use crate::error::AppError;
use crate::models::organize_types::ImageRef;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// List candidate images under `dir`, flat by default or recursive per the
/// config. Non-image files are silently excluded. The result is sorted
/// lexicographically by filename so reports are reproducible.
pub fn list_image_files(dir: &Path, config: &OrganizerConfig) -> Result<Vec<ImageRef>, AppError> {
    if !dir.is_dir() {
        return Err(AppError::Setup(format!(
            "source directory does not exist: {}",
            dir.display()
        )));
    }

    // Probe readability up front: walkdir surfaces a permission-denied
    // source as a per-entry error, which the scan below skips.
    std::fs::read_dir(dir).map_err(|e| {
        AppError::Setup(format!(
            "cannot read source directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let max_depth = if config.recursive { usize::MAX } else { 1 };
    let mut images = Vec::new();

    for entry in WalkDir::new(dir).max_depth(max_depth).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| config.matches_extension(ext))
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        images.push(ImageRef::new(path.to_path_buf(), size));
    }

    // Filename first; full path breaks ties between same-named files in
    // different subdirectories so recursive scans stay reproducible.
    images.sort_by(|a, b| {
        a.file_name()
            .cmp(&b.file_name())
            .then_with(|| a.path.cmp(&b.path))
    });
    Ok(images)
}

/// Pick a collision-free destination for `file_name` inside `dest_dir`,
/// appending "name (1).ext", "name (2).ext", ... as needed. `planned` holds
/// destinations already claimed earlier in the run, so dry-run simulation
/// resolves collisions the same way a real run does.
pub fn unique_destination(
    dest_dir: &Path,
    file_name: &str,
    planned: &HashSet<PathBuf>,
) -> PathBuf {
    let candidate = dest_dir.join(file_name);
    if !candidate.exists() && !planned.contains(&candidate) {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    let ext = name.extension().and_then(|e| e.to_str());

    let mut counter = 1;
    loop {
        let numbered = match ext {
            Some(ext) => format!("{} ({}).{}", stem, counter, ext),
            None => format!("{} ({})", stem, counter),
        };
        let candidate = dest_dir.join(numbered);
        if !candidate.exists() && !planned.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Move a single file. Rename first; if that fails (typically a
/// cross-volume move) fall back to copy + delete. The destination is
/// assumed collision-free, never overwritten.
pub fn move_file(source: &Path, dest: &Path) -> Result<(), AppError> {
    if std::fs::rename(source, dest).is_ok() {
        return Ok(());
    }

    match std::fs::copy(source, dest) {
        Ok(_) => {
            if let Err(e) = std::fs::remove_file(source) {
                return Err(AppError::FileMove {
                    path: source.to_path_buf(),
                    message: format!("copied but failed to remove source: {}", e),
                });
            }
            Ok(())
        }
        Err(e) => {
            // Don't leave a partial copy behind.
            let _ = std::fs::remove_file(dest);
            Err(AppError::FileMove {
                path: source.to_path_buf(),
                message: e.to_string(),
            })
        }
    }
}
