#![allow(dead_code)]

use std::{
    io::Cursor,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use agriguard_lib::{
    analysis::{ImageClassifier, ModelLoader, Prediction, UnavailableModel},
    pipeline::{PipelineState, PipelineStatus},
    FarmSession, PipelineConfig,
};
use anyhow::Result;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::Array4;
use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::watch;

pub const SEED: u64 = 7;

struct ScriptedModel(Vec<Prediction>);

impl ImageClassifier for ScriptedModel {
    fn classify(&self, _input: &Array4<f32>) -> Result<Vec<Prediction>> {
        Ok(self.0.clone())
    }
}

/// Loader whose model always answers with the same ranked labels.
pub struct ScriptedLoader {
    predictions: Vec<Prediction>,
    pub loads: Arc<AtomicUsize>,
}

impl ScriptedLoader {
    pub fn new(top: &[(&str, f32)]) -> Self {
        Self {
            predictions: top
                .iter()
                .map(|(label, probability)| Prediction {
                    label: label.to_string(),
                    probability: *probability,
                })
                .collect(),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ModelLoader for ScriptedLoader {
    fn load(&self) -> Result<Arc<dyn ImageClassifier>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedModel(self.predictions.clone())))
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

pub fn unavailable() -> Arc<dyn ModelLoader> {
    Arc::new(UnavailableModel::new("weights not found"))
}

/// No artificial delays and an ambient alert far beyond any test's runtime.
pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        ambient_alert_delay: Duration::from_secs(3600),
        ..PipelineConfig::default().without_delays()
    }
}

pub fn png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}

pub fn green_canopy() -> Vec<u8> {
    png(64, 64, [40, 160, 50])
}

pub fn grey_rock() -> Vec<u8> {
    png(64, 64, [128, 128, 128])
}

pub async fn open(
    dir: &Path,
    config: PipelineConfig,
    loader: Arc<dyn ModelLoader>,
) -> FarmSession {
    FarmSession::open(config, dir, loader, &mut StdRng::seed_from_u64(SEED))
        .await
        .expect("open session")
}

/// Distinct statuses published until the run settles in `Completed` or `Failed`.
pub async fn settled_statuses(mut updates: watch::Receiver<PipelineState>) -> Vec<PipelineStatus> {
    let mut seen = Vec::new();
    while updates.changed().await.is_ok() {
        let status = updates.borrow_and_update().status;
        if seen.last() != Some(&status) {
            seen.push(status);
        }
        if matches!(status, PipelineStatus::Completed | PipelineStatus::Failed) {
            break;
        }
    }
    seen
}
