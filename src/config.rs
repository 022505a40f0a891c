use crate::error::AppError;
use serde::Deserialize;
use std::path::Path;

/// Run configuration, loaded once before a run and read-only for its
/// duration. Keywords are matched as case-insensitive substrings against
/// the oracle's label text, in list order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    pub homework_keywords: Vec<String>,
    pub confidence_threshold: f32,
    pub top_k: usize,
    pub image_extensions: Vec<String>,
    pub recursive: bool,
    /// Grayscale variance above this marks a photo as document-like.
    pub variance_threshold: f32,
    /// Confidence reported when the variance heuristic fires.
    pub heuristic_confidence: f32,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            homework_keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            confidence_threshold: 0.3,
            top_k: 5,
            image_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            recursive: false,
            variance_threshold: 5000.0,
            heuristic_confidence: 0.5,
        }
    }
}

/// ImageNet classes that typically indicate homework material.
const DEFAULT_KEYWORDS: &[&str] = &[
    "notebook",
    "book",
    "paper",
    "pen",
    "pencil",
    "desk",
    "monitor",
    "screen",
    "keyboard",
    "laptop",
    "computer",
    "whiteboard",
    "blackboard",
    "chalkboard",
    "book_jacket",
    "pencil_box",
    "binder",
    "calculator",
    "web_site", // screenshots of educational sites
    "menu",     // often captures written content
];

const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp"];

impl OrganizerConfig {
    /// Load overrides from a JSON file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Setup(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config: OrganizerConfig = serde_json::from_str(&content).map_err(|e| {
            AppError::Setup(format!("cannot parse config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    pub fn matches_extension(&self, ext: &str) -> bool {
        self.image_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = OrganizerConfig::default();
        assert_eq!(config.confidence_threshold, 0.3);
        assert_eq!(config.top_k, 5);
        assert!(!config.recursive);
        assert!(config.homework_keywords.iter().any(|k| k == "book"));
        assert!(config.matches_extension("JPG"));
        assert!(config.matches_extension("webp"));
        assert!(!config.matches_extension("tiff"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: OrganizerConfig =
            serde_json::from_str(r#"{"confidence_threshold": 0.6, "recursive": true}"#).unwrap();
        assert_eq!(config.confidence_threshold, 0.6);
        assert!(config.recursive);
        assert_eq!(config.top_k, 5);
        assert!(!config.homework_keywords.is_empty());
    }
}
