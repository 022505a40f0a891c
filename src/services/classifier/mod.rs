pub mod heuristic;
pub mod inference;
pub mod model_manager;

use crate::config::OrganizerConfig;
use crate::error::AppError;
use crate::models::classify_types::{ClassificationResult, Prediction};
use crate::models::organize_types::ImageRef;
use ndarray::Array4;
use rayon::prelude::*;

pub const HEURISTIC_REASON: &str = "heuristic:grayscale_variance";
pub const NO_MATCH_REASON: &str = "no match";

/// The external image-labeling oracle: a pure function from a preprocessed
/// pixel tensor to a ranked prediction set. Model loading, caching, and
/// hardware acceleration live behind this seam (see `model_manager`).
pub trait LabelOracle: Send + Sync {
    /// Square input edge the oracle expects, e.g. 224.
    fn input_size(&self) -> u32;

    /// Top-K predictions, ranked descending by score. Scores are in [0, 1].
    fn predict(&self, input: Array4<f32>, top_k: usize) -> Result<Vec<Prediction>, AppError>;
}

/// Detects homework-related images by matching oracle labels against a
/// keyword list, with a document-likelihood pixel heuristic as fallback for
/// plain notes/document photos that general-purpose label vocabularies miss.
pub struct HomeworkClassifier {
    oracle: Box<dyn LabelOracle>,
    config: OrganizerConfig,
}

impl HomeworkClassifier {
    pub fn new(oracle: Box<dyn LabelOracle>, config: OrganizerConfig) -> Self {
        Self { oracle, config }
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    /// Classify one image. Fails with `ImageDecode` on undecodable files and
    /// `Oracle` on oracle failures; callers batch-processing a directory
    /// catch both per image.
    pub fn classify(
        &self,
        image: &ImageRef,
        threshold: f32,
    ) -> Result<ClassificationResult, AppError> {
        let decoded = inference::decode_image(&image.path)?;
        let tensor = inference::to_input_tensor(&decoded, self.oracle.input_size())?;
        let predictions = self.oracle.predict(tensor, self.config.top_k)?;

        if let Some((keyword, prediction)) = self.match_keywords(&predictions, threshold) {
            return Ok(ClassificationResult {
                is_homework: true,
                confidence: prediction.confidence.clamp(0.0, 1.0),
                reason: keyword,
                matched_label: Some(prediction.class_name.clone()),
                predictions,
            });
        }

        // Label vocabularies trained on general object recognition miss
        // plain document/notes photos; fall back to pixel statistics.
        let variance = heuristic::grayscale_variance(&decoded);
        if variance > self.config.variance_threshold {
            return Ok(ClassificationResult {
                is_homework: true,
                confidence: self.config.heuristic_confidence.clamp(0.0, 1.0),
                reason: HEURISTIC_REASON.to_string(),
                matched_label: None,
                predictions,
            });
        }

        let top_confidence = predictions
            .first()
            .map(|p| p.confidence.clamp(0.0, 1.0))
            .unwrap_or(0.0);
        Ok(ClassificationResult {
            is_homework: false,
            confidence: top_confidence,
            reason: NO_MATCH_REASON.to_string(),
            matched_label: None,
            predictions,
        })
    }

    /// Classify each image independently, preserving input order. One
    /// failure never suppresses the other results. Classification runs in
    /// parallel; the ONNX session serializes behind its own lock.
    pub fn classify_batch(
        &self,
        images: &[ImageRef],
        threshold: f32,
    ) -> Vec<Result<ClassificationResult, AppError>> {
        images
            .par_iter()
            .map(|image| self.classify(image, threshold))
            .collect()
    }

    /// First prediction (in rank order) clearing the threshold whose label
    /// contains a configured keyword; keyword list order breaks ties within
    /// one label.
    fn match_keywords<'a>(
        &self,
        predictions: &'a [Prediction],
        threshold: f32,
    ) -> Option<(String, &'a Prediction)> {
        for prediction in predictions {
            if prediction.confidence < threshold {
                continue;
            }
            let label = prediction.class_name.to_lowercase();
            for keyword in &self.config.homework_keywords {
                if label.contains(&keyword.to_lowercase()) {
                    return Some((keyword.clone(), prediction));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticOracle(Vec<Prediction>);

    impl LabelOracle for StaticOracle {
        fn input_size(&self) -> u32 {
            224
        }

        fn predict(&self, _input: Array4<f32>, top_k: usize) -> Result<Vec<Prediction>, AppError> {
            Ok(self.0.iter().take(top_k).cloned().collect())
        }
    }

    fn prediction(class_name: &str, confidence: f32) -> Prediction {
        Prediction {
            class_name: class_name.to_string(),
            confidence,
        }
    }

    fn classifier(predictions: Vec<Prediction>) -> HomeworkClassifier {
        HomeworkClassifier::new(Box::new(StaticOracle(predictions)), OrganizerConfig::default())
    }

    fn write_noise_png(dir: &std::path::Path) -> ImageRef {
        // Deterministic high-variance pattern for the heuristic fallback.
        let img = image::RgbImage::from_fn(64, 64, |x, y| {
            let v = ((x * 7 + y * 13) % 256) as u8;
            image::Rgb([v, v, v])
        });
        let path = dir.join("input.png");
        img.save(&path).unwrap();
        ImageRef::new(path, 1)
    }

    fn write_flat_png(dir: &std::path::Path) -> ImageRef {
        let img = image::RgbImage::from_pixel(64, 64, image::Rgb([128, 128, 128]));
        let path = dir.join("flat.png");
        img.save(&path).unwrap();
        ImageRef::new(path, 1)
    }

    #[test]
    fn keyword_match_takes_first_qualifying_rank() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_flat_png(dir.path());
        let classifier = classifier(vec![
            prediction("seashore", 0.9),
            prediction("book_jacket", 0.5),
            prediction("notebook", 0.4),
        ]);

        let result = classifier.classify(&image, 0.3).unwrap();
        assert!(result.is_homework);
        assert_eq!(result.reason, "book");
        assert_eq!(result.matched_label.as_deref(), Some("book_jacket"));
        assert!((result.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn keyword_order_breaks_ties_within_a_label() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_flat_png(dir.path());
        // The label matches both the "notebook" and "book" keywords;
        // "notebook" comes first in the default list.
        let classifier = classifier(vec![prediction("notebook computer", 0.8)]);

        let result = classifier.classify(&image, 0.3).unwrap();
        assert!(result.is_homework);
        assert_eq!(result.reason, "notebook");
    }

    #[test]
    fn below_threshold_labels_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_flat_png(dir.path());
        let classifier = classifier(vec![
            prediction("book_jacket", 0.2),
            prediction("desk", 0.35),
        ]);

        let result = classifier.classify(&image, 0.3).unwrap();
        assert!(result.is_homework);
        assert_eq!(result.reason, "desk");
        assert!((result.confidence - 0.35).abs() < 1e-6);
    }

    #[test]
    fn no_match_reports_top_score() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_flat_png(dir.path());
        let classifier = classifier(vec![
            prediction("seashore", 0.9),
            prediction("volcano", 0.05),
        ]);

        let result = classifier.classify(&image, 0.3).unwrap();
        assert!(!result.is_homework);
        assert_eq!(result.reason, NO_MATCH_REASON);
        assert!((result.confidence - 0.9).abs() < 1e-6);
        assert!(result.matched_label.is_none());
    }

    #[test]
    fn heuristic_fires_on_high_variance_without_label_match() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_noise_png(dir.path());
        let config = OrganizerConfig {
            variance_threshold: 100.0,
            ..OrganizerConfig::default()
        };
        let classifier = HomeworkClassifier::new(
            Box::new(StaticOracle(vec![prediction("seashore", 0.9)])),
            config,
        );

        let result = classifier.classify(&image, 0.3).unwrap();
        assert!(result.is_homework);
        assert_eq!(result.reason, HEURISTIC_REASON);
        assert!((result.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn undecodable_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        let image = ImageRef::new(path, 12);
        let classifier = classifier(vec![]);

        let err = classifier.classify(&image, 0.3).unwrap_err();
        assert!(matches!(err, AppError::ImageDecode { .. }));
    }

    #[test]
    fn batch_preserves_order_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_flat_png(dir.path());
        let bad_path = dir.path().join("bad.jpg");
        std::fs::write(&bad_path, b"").unwrap();
        let bad = ImageRef::new(bad_path, 0);

        let classifier = classifier(vec![prediction("book_jacket", 0.8)]);
        let results = classifier.classify_batch(&[bad.clone(), good.clone()], 0.3);

        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].as_ref().unwrap().is_homework);
    }
}
