use serde::Serialize;

/// One ranked entry of the oracle's output.
#[derive(Debug, Serialize, Clone)]
pub struct Prediction {
    pub class_name: String,
    pub confidence: f32,
}

/// Homework verdict for a single image, derived from the ranked prediction
/// set plus the pixel heuristic. Owned by the caller; never mutated after
/// creation.
#[derive(Debug, Serialize, Clone)]
pub struct ClassificationResult {
    pub is_homework: bool,
    /// Always in [0, 1]: the matching prediction's score, the heuristic
    /// confidence, or the top prediction's score on "no match".
    pub confidence: f32,
    /// Matched keyword, heuristic name, or "no match".
    pub reason: String,
    pub matched_label: Option<String>,
    /// The top-K prediction set that produced this verdict.
    pub predictions: Vec<Prediction>,
}
