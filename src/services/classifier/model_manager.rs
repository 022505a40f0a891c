use crate::error::AppError;
use crate::models::classify_types::Prediction;
use crate::services::classifier::LabelOracle;
use futures::StreamExt;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

const MODEL_URL: &str =
    "https://huggingface.co/Xenova/mobilenet_v2_1.4_224/resolve/main/onnx/model.onnx";
const CONFIG_URL: &str =
    "https://huggingface.co/Xenova/mobilenet_v2_1.4_224/resolve/main/config.json";
const MODEL_FILE: &str = "mobilenet_v2_1.4_224.onnx";
const CONFIG_FILE: &str = "mobilenet_v2_1.4_224-config.json";
const INPUT_SIZE: u32 = 224;

/// Downloads and loads the ONNX labeling model. Everything stateful about
/// the model lives here; the classifier only sees the `LabelOracle` seam.
pub struct ModelManager {
    model_dir: PathBuf,
}

impl ModelManager {
    pub fn new(model_dir: PathBuf) -> Self {
        Self { model_dir }
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(MODEL_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join(CONFIG_FILE)
    }

    pub fn is_downloaded(&self) -> bool {
        self.model_path().exists() && self.config_path().exists()
    }

    pub async fn download_model(&self) -> Result<(), AppError> {
        if self.is_downloaded() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.model_dir).map_err(|e| {
            AppError::Other(format!("failed to create model directory: {}", e))
        })?;

        let config_path = self.config_path();
        if !config_path.exists() {
            download_file(CONFIG_URL, &config_path).await?;
        }

        let model_path = self.model_path();
        if !model_path.exists() {
            download_file(MODEL_URL, &model_path).await?;
        }

        Ok(())
    }

    /// Load the session and label table into a ready-to-use oracle.
    pub fn load_oracle(&self) -> Result<OnnxOracle, AppError> {
        let labels = self.load_labels()?;

        let _ = ort::init().with_name("homework-lens").commit();

        let session = Session::builder()
            .map_err(|e| AppError::Oracle(format!("failed to create session builder: {}", e)))?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| AppError::Oracle(format!("failed to set optimization level: {}", e)))?
            .with_intra_threads(4)
            .map_err(|e| AppError::Oracle(format!("failed to set intra threads: {}", e)))?
            .commit_from_file(self.model_path())
            .map_err(|e| AppError::Oracle(format!("failed to load ONNX model: {}", e)))?;

        Ok(OnnxOracle {
            session: Mutex::new(session),
            labels,
        })
    }

    // Labels come from the config.json id2label map, ordered by class index.
    fn load_labels(&self) -> Result<Vec<String>, AppError> {
        let config_path = self.config_path();
        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            AppError::Oracle(format!(
                "failed to read model config {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| AppError::Oracle(format!("failed to parse model config: {}", e)))?;

        let id2label = config["id2label"]
            .as_object()
            .ok_or_else(|| AppError::Oracle("model config missing id2label".to_string()))?;

        let mut labels: Vec<(usize, String)> = id2label
            .iter()
            .map(|(k, v)| {
                let idx = k.parse::<usize>().unwrap_or(0);
                let label = v.as_str().unwrap_or("unknown").to_string();
                (idx, label)
            })
            .collect();
        labels.sort_by_key(|(idx, _)| *idx);
        Ok(labels.into_iter().map(|(_, label)| label).collect())
    }
}

/// `LabelOracle` backed by an ONNX Runtime session. The session is behind a
/// mutex so batch classification can fan out preprocessing across threads
/// while inference stays serialized.
pub struct OnnxOracle {
    session: Mutex<Session>,
    labels: Vec<String>,
}

impl LabelOracle for OnnxOracle {
    fn input_size(&self) -> u32 {
        INPUT_SIZE
    }

    fn predict(&self, input: Array4<f32>, top_k: usize) -> Result<Vec<Prediction>, AppError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::Oracle("model session lock poisoned".to_string()))?;

        let input_name = session.inputs()[0].name().to_string();
        let input_tensor = Value::from_array(input)
            .map_err(|e| AppError::Oracle(format!("failed to create tensor value: {}", e)))?;

        let outputs = session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .map_err(|e| AppError::Oracle(format!("inference failed: {}", e)))?;

        let output_value = outputs
            .values()
            .next()
            .ok_or_else(|| AppError::Oracle("model produced no outputs".to_string()))?;

        let (_, logits) = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| AppError::Oracle(format!("failed to extract output tensor: {}", e)))?;

        // Softmax over the logits, then rank.
        let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();
        let probabilities: Vec<f32> = logits
            .iter()
            .map(|&x| (x - max_logit).exp() / exp_sum)
            .collect();

        let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let top_k = top_k.min(indexed.len());
        Ok(indexed[..top_k]
            .iter()
            .map(|&(idx, confidence)| Prediction {
                class_name: self
                    .labels
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| format!("class_{}", idx)),
                confidence,
            })
            .collect())
    }
}

async fn download_file(url: &str, dest: &Path) -> Result<(), AppError> {
    info!(url, dest = %dest.display(), "downloading");

    let client = reqwest::Client::new();
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(AppError::Other(format!(
            "failed to download {}: HTTP {}",
            url,
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut last_logged = 0;

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| AppError::Other(format!("failed to create {}: {}", dest.display(), e)))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        downloaded += chunk.len() as u64;
        tokio::io::AsyncWriteExt::write_all(&mut file, &chunk)
            .await
            .map_err(|e| AppError::Other(format!("failed to write to file: {}", e)))?;

        if total_size > 0 {
            let progress = (downloaded * 100) / total_size;
            // Log roughly every 10% to keep output quiet.
            if progress >= last_logged + 10 {
                info!(progress, "download progress");
                last_logged = progress;
            }
        }
    }

    Ok(())
}
