//! One user's farm session: grid, settings, notification store, pipeline and
//! ambient alert task wired together.

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::{
    analysis::{ClassifierAdapter, ModelLoader},
    config::PipelineConfig,
    db::{models::NotificationKind, Database},
    error::PipelineResult,
    field::FieldGrid,
    forecast::{self, HistoricalYield, NutrientStatus, Telemetry, YieldForecast},
    models::{AnalysisReport, AnalysisResult},
    notifications::{AmbientAlerts, NotificationCenter},
    pipeline::PipelineController,
    settings::{FarmProfile, SettingsStore},
};

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub const DATABASE_FILE: &str = "agriguard.sqlite3";
pub const SETTINGS_FILE: &str = "settings.json";

pub fn health_label(score: u32) -> &'static str {
    if score > 90 {
        "Excellent"
    } else if score > 75 {
        "Good"
    } else {
        "Needs Attention"
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldCard {
    pub per_hectare: String,
    pub total: i64,
    pub change: String,
    #[serde(flatten)]
    pub forecast: YieldForecast,
}

impl From<YieldForecast> for YieldCard {
    fn from(forecast: YieldForecast) -> Self {
        Self {
            per_hectare: forecast.per_ha_label(),
            total: forecast.total_rounded(),
            change: forecast.change_label(),
            forecast,
        }
    }
}

/// Everything the dashboard cards show, in one serialisable snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub health_score: u32,
    pub health_label: String,
    pub global_ndvi: f64,
    pub evi: f64,
    pub active_issues: u32,
    pub pest_risk: u8,
    pub last_result: Option<AnalysisResult>,
    pub nutrients: NutrientStatus,
    #[serde(rename = "yield")]
    pub yield_card: YieldCard,
    pub farm: FarmProfile,
}

pub struct FarmSession {
    settings: Arc<SettingsStore>,
    grid: Arc<RwLock<FieldGrid>>,
    notifications: NotificationCenter,
    pipeline: PipelineController,
    telemetry: Telemetry,
    history: Vec<HistoricalYield>,
    ambient: AmbientAlerts,
    shutdown: CancellationToken,
}

impl FarmSession {
    /// Open (or create) the session stored under `data_dir`.
    ///
    /// Must be called from within a tokio runtime: the ambient alert task is
    /// spawned immediately.
    pub async fn open<R: Rng + ?Sized>(
        config: PipelineConfig,
        data_dir: &Path,
        loader: Arc<dyn ModelLoader>,
        rng: &mut R,
    ) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db = Database::new(data_dir.join(DATABASE_FILE))?;
        let settings = Arc::new(SettingsStore::new(data_dir.join(SETTINGS_FILE))?);
        let notifications = NotificationCenter::new(db);
        let grid = Arc::new(RwLock::new(FieldGrid::generate(rng)));

        let shutdown = CancellationToken::new();
        let ambient = AmbientAlerts::spawn(
            notifications.clone(),
            settings.clone(),
            config.ambient_alert_delay,
            shutdown.child_token(),
        );

        let pipeline = PipelineController::new(
            config,
            ClassifierAdapter::new(loader),
            grid.clone(),
            settings.clone(),
            notifications.clone(),
        );

        log_info!("farm session opened at {}", data_dir.display());

        Ok(Self {
            settings,
            grid,
            notifications,
            pipeline,
            telemetry: Telemetry::default(),
            history: forecast::default_history(),
            ambient,
            shutdown,
        })
    }

    pub fn pipeline(&self) -> &PipelineController {
        &self.pipeline
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub async fn analyze(&self, payload: Vec<u8>) -> PipelineResult<AnalysisReport> {
        self.pipeline.analyze(payload).await
    }

    pub async fn grid(&self) -> FieldGrid {
        self.grid.read().await.clone()
    }

    pub fn nutrient_status(&self) -> NutrientStatus {
        forecast::assess(&self.telemetry)
    }

    pub async fn yield_forecast(&self) -> Result<YieldForecast> {
        let grid = self.grid.read().await;
        forecast::forecast(
            &grid,
            self.pipeline.latest_risk(),
            &self.nutrient_status(),
            &self.history,
            self.settings.farm_profile().area_hectares(),
        )
    }

    pub async fn summary(&self) -> Result<DashboardSummary> {
        let (health_score, global_ndvi) = {
            let grid = self.grid.read().await;
            (grid.health_score(), grid.average_ndvi())
        };

        Ok(DashboardSummary {
            health_score,
            health_label: health_label(health_score).to_string(),
            global_ndvi,
            evi: self.telemetry.evi,
            active_issues: self
                .notifications
                .unread_count(Some(NotificationKind::Pest))
                .await?,
            pest_risk: self.pipeline.latest_risk(),
            last_result: self.pipeline.snapshot().last_result,
            nutrients: self.nutrient_status(),
            yield_card: self.yield_forecast().await?.into(),
            farm: self.settings.farm_profile(),
        })
    }

    /// Stop the ambient alert task and end the session.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.ambient.shutdown().await;
        log_info!("farm session closed");
    }
}
