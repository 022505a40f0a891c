use serde::Serialize;
use std::path::PathBuf;

/// A resolved candidate image file. Immutable once enumerated.
#[derive(Debug, Serialize, Clone)]
pub struct ImageRef {
    pub path: PathBuf,
    /// Lowercase extension, without the dot.
    pub extension: String,
    pub size: u64,
}

impl ImageRef {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();
        Self { path, extension, size }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Moved,
    Kept,
    Error,
}

/// One row of the run report.
#[derive(Debug, Serialize, Clone)]
pub struct OrganizeRecord {
    pub source: PathBuf,
    /// Present only when the decision is `Moved`. Under dry run this is the
    /// destination the file would have landed at.
    pub destination: Option<PathBuf>,
    pub decision: Decision,
    pub reason: String,
    pub confidence: f32,
}

/// Aggregate counters, recomputable from the run report at any time.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub total_scanned: usize,
    pub total_moved: usize,
    pub total_kept: usize,
    pub total_errors: usize,
}

impl RunStats {
    pub fn from_report(report: &[OrganizeRecord]) -> Self {
        let mut stats = RunStats {
            total_scanned: report.len(),
            total_moved: 0,
            total_kept: 0,
            total_errors: 0,
        };
        for record in report {
            match record.decision {
                Decision::Moved => stats.total_moved += 1,
                Decision::Kept => stats.total_kept += 1,
                Decision::Error => stats.total_errors += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(decision: Decision) -> OrganizeRecord {
        OrganizeRecord {
            source: PathBuf::from("a.jpg"),
            destination: None,
            decision,
            reason: String::new(),
            confidence: 0.0,
        }
    }

    #[test]
    fn stats_add_up() {
        let report = vec![
            record(Decision::Moved),
            record(Decision::Kept),
            record(Decision::Kept),
            record(Decision::Error),
        ];
        let stats = RunStats::from_report(&report);
        assert_eq!(stats.total_scanned, 4);
        assert_eq!(
            stats.total_scanned,
            stats.total_moved + stats.total_kept + stats.total_errors
        );
        assert_eq!(stats.total_moved, 1);
        assert_eq!(stats.total_kept, 2);
        assert_eq!(stats.total_errors, 1);
    }

    #[test]
    fn image_ref_lowercases_extension() {
        let image = ImageRef::new(PathBuf::from("/photos/Notes.JPG"), 123);
        assert_eq!(image.extension, "jpg");
        assert_eq!(image.file_name(), "Notes.JPG");
    }
}
