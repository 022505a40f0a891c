use crate::config::OrganizerConfig;
use crate::error::AppError;
use crate::models::organize_types::{Decision, OrganizeRecord, RunStats};
use crate::services::classifier::HomeworkClassifier;
use crate::services::fs_service;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Drives a full run: enumerate candidate images, classify each, and move
/// (or simulate moving) the homework-related ones into the destination
/// folder. Every scanned file gets exactly one report row; per-image
/// failures are recorded and never abort the run.
pub struct Organizer {
    classifier: HomeworkClassifier,
    config: OrganizerConfig,
}

impl Organizer {
    pub fn new(classifier: HomeworkClassifier, config: OrganizerConfig) -> Self {
        Self { classifier, config }
    }

    /// Run over `source_dir`, moving homework images into `dest_dir`.
    ///
    /// Under `dry_run` no filesystem mutation happens anywhere (the
    /// destination folder is not even created); the report still shows the
    /// destinations files would land at, with name collisions resolved the
    /// same way a real run resolves them.
    ///
    /// Only setup failures (missing source directory, uncreatable
    /// destination) return `Err`; they abort before any file is touched.
    pub fn organize(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        dry_run: bool,
        threshold: f32,
    ) -> Result<(Vec<OrganizeRecord>, RunStats), AppError> {
        let images = fs_service::list_image_files(source_dir, &self.config)?;

        if !dry_run {
            std::fs::create_dir_all(dest_dir).map_err(|e| {
                AppError::Setup(format!(
                    "cannot create destination {}: {}",
                    dest_dir.display(),
                    e
                ))
            })?;
        }

        debug!(count = images.len(), source = %source_dir.display(), "scanning");

        // Classification may fan out across threads; moves and report rows
        // stay in lexicographic scan order so destination disambiguation is
        // deterministic.
        let results = self
            .classifier
            .classify_batch(&images, threshold);

        let mut planned: HashSet<PathBuf> = HashSet::new();
        let mut report = Vec::with_capacity(images.len());

        for (image, result) in images.iter().zip(results) {
            let record = match result {
                Err(e) => {
                    warn!(file = %image.path.display(), error = %e, "classification failed");
                    OrganizeRecord {
                        source: image.path.clone(),
                        destination: None,
                        decision: Decision::Error,
                        reason: e.to_string(),
                        confidence: 0.0,
                    }
                }
                Ok(result) if result.is_homework => {
                    let dest =
                        fs_service::unique_destination(dest_dir, &image.file_name(), &planned);
                    let moved = if dry_run {
                        Ok(())
                    } else {
                        fs_service::move_file(&image.path, &dest)
                    };
                    match moved {
                        Ok(()) => {
                            planned.insert(dest.clone());
                            OrganizeRecord {
                                source: image.path.clone(),
                                destination: Some(dest),
                                decision: Decision::Moved,
                                reason: result.reason,
                                confidence: result.confidence,
                            }
                        }
                        Err(e) => {
                            warn!(file = %image.path.display(), error = %e, "move failed");
                            OrganizeRecord {
                                source: image.path.clone(),
                                destination: None,
                                decision: Decision::Error,
                                reason: e.to_string(),
                                confidence: result.confidence,
                            }
                        }
                    }
                }
                Ok(result) => OrganizeRecord {
                    source: image.path.clone(),
                    destination: None,
                    decision: Decision::Kept,
                    reason: result.reason,
                    confidence: result.confidence,
                },
            };
            report.push(record);
        }

        let stats = RunStats::from_report(&report);
        Ok((report, stats))
    }
}
