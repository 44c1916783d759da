use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f32,
}

/// A loaded, pre-trained image classifier. Treated as a black box.
pub trait ImageClassifier: Send + Sync {
    /// Ranked labels for one standardized `1×3×N×N` input.
    fn classify(&self, input: &Array4<f32>) -> Result<Vec<Prediction>>;
}

/// Produces a classifier. Called at most once per successful load.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn ImageClassifier>>;

    fn describe(&self) -> String;
}

/// Loader used when no model backend is compiled in or configured.
pub struct UnavailableModel {
    reason: String,
}

impl UnavailableModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ModelLoader for UnavailableModel {
    fn load(&self) -> Result<Arc<dyn ImageClassifier>> {
        Err(anyhow!("{}", self.reason))
    }

    fn describe(&self) -> String {
        "unavailable".into()
    }
}

/// Shared, lazily initialised classifier.
///
/// Concurrent callers of `ensure_loaded` wait on the same in-flight load; a
/// failed load leaves the cell empty so the next run tries again.
#[derive(Clone)]
pub struct ClassifierAdapter {
    loader: Arc<dyn ModelLoader>,
    model: Arc<OnceCell<Arc<dyn ImageClassifier>>>,
}

impl ClassifierAdapter {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            model: Arc::new(OnceCell::new()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    pub async fn ensure_loaded(&self) -> Result<Arc<dyn ImageClassifier>> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let loader = self.loader.clone();
                log_info!("Loading classifier ({})", loader.describe());
                let loaded = tokio::task::spawn_blocking(move || loader.load())
                    .await
                    .context("classifier loader task failed to join")?;
                if let Err(err) = &loaded {
                    log_warn!("Classifier load failed: {err:#}");
                }
                loaded
            })
            .await?;
        Ok(model.clone())
    }

    /// Classify a standardized input; results are sorted by descending probability.
    pub async fn classify(&self, input: Array4<f32>) -> Result<Vec<Prediction>> {
        let model = self.ensure_loaded().await?;
        let mut predictions = tokio::task::spawn_blocking(move || model.classify(&input))
            .await
            .context("classifier inference task failed to join")??;

        predictions.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        Ok(predictions)
    }
}
