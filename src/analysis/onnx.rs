//! ONNX Runtime backend for the classifier adapter.
//!
//! Expects an ImageNet-style model taking a `1×3×224×224` float input and
//! producing one score per label, plus a newline-separated label file in the
//! same order as the model's output.

use std::{fs, path::PathBuf, sync::Arc, sync::Mutex};

use anyhow::{anyhow, bail, Context, Result};
use ndarray::Array4;
use ort::{session::Session, value::Value};

use super::classifier::{ImageClassifier, ModelLoader, Prediction};

const TOP_K: usize = 5;

pub struct OnnxModelLoader {
    model_path: PathBuf,
    labels_path: PathBuf,
}

impl OnnxModelLoader {
    pub fn new(model_path: PathBuf, labels_path: PathBuf) -> Self {
        Self {
            model_path,
            labels_path,
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self) -> Result<Arc<dyn ImageClassifier>> {
        let labels = read_labels(&self.labels_path)?;

        let session = Session::builder()
            .map_err(|e| anyhow!("Failed to create session builder: {}", e))?
            .commit_from_file(&self.model_path)
            .map_err(|e| {
                anyhow!(
                    "Failed to load ONNX model {}: {}",
                    self.model_path.display(),
                    e
                )
            })?;

        let (input_name, output_name) = io_names(&session)?;
        log::debug!(
            "ONNX classifier ready: {} labels, input '{input_name}', output '{output_name}'",
            labels.len()
        );

        Ok(Arc::new(OnnxClassifier {
            session: Mutex::new(session),
            input_name,
            output_name,
            labels,
        }))
    }

    fn describe(&self) -> String {
        format!("onnx:{}", self.model_path.display())
    }
}

/// Name of the first input and first output; a classifier needs both.
fn io_names(session: &Session) -> Result<(String, String)> {
    let input = session
        .inputs
        .first()
        .ok_or_else(|| anyhow!("ONNX model declares no inputs"))?;
    let output = session
        .outputs
        .first()
        .ok_or_else(|| anyhow!("ONNX model declares no outputs"))?;
    Ok((input.name.clone(), output.name.clone()))
}

fn read_labels(path: &PathBuf) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read labels from {}", path.display()))?;
    let labels: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if labels.is_empty() {
        bail!("label file {} is empty", path.display());
    }
    Ok(labels)
}

struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    labels: Vec<String>,
}

impl ImageClassifier for OnnxClassifier {
    fn classify(&self, input: &Array4<f32>) -> Result<Vec<Prediction>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("classifier session lock poisoned"))?;

        let input_value = Value::from_array(input.clone())
            .map_err(|e| anyhow!("Failed to create input value: {}", e))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => &input_value])
            .map_err(|e| anyhow!("Failed to run inference: {}", e))?;

        let output_view = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| anyhow!("Failed to extract output array: {}", e))?;
        let scores: Vec<f32> = output_view.iter().copied().collect();

        Ok(top_k(&probabilities(&scores), &self.labels, TOP_K))
    }
}

/// Models exported with a softmax head already sum to one; raw logits do not.
fn probabilities(scores: &[f32]) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    let already_normalized =
        scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 1e-3;
    if already_normalized {
        return scores.to_vec();
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn top_k(probabilities: &[f32], labels: &[String], k: usize) -> Vec<Prediction> {
    let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    indexed
        .into_iter()
        .take(k)
        .map(|(idx, probability)| Prediction {
            label: labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("class {idx}")),
            probability,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logits_are_softmaxed() {
        let probs = probabilities(&[2.0, 1.0, 0.1]);
        let total: f32 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }

    #[test]
    fn malformed_model_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.onnx");
        let labels = dir.path().join("labels.txt");
        fs::write(&model, b"not an onnx graph").unwrap();
        fs::write(&labels, "rock\nleaf\n").unwrap();

        let err = OnnxModelLoader::new(model, labels).load().err().unwrap();
        assert!(err.to_string().contains("Failed to load ONNX model"));
    }

    #[test]
    fn top_k_keeps_label_order() {
        let labels = vec!["rock".to_string(), "leaf".to_string(), "ladybug".to_string()];
        let ranked = top_k(&[0.2, 0.5, 0.3], &labels, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].label, "leaf");
        assert_eq!(ranked[1].label, "ladybug");
    }
}
