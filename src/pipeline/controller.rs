use std::sync::Arc;

use tokio::{
    sync::{watch, Mutex, RwLock},
    time,
};

use crate::{
    analysis::{
        fuse, heuristics, preprocess, ClassifierAdapter, Fingerprint, FingerprintCache, Fusion,
        PixelSignals, SubjectVerdict,
    },
    config::PipelineConfig,
    db::models::ActivityKind,
    error::{PipelineError, PipelineResult},
    field::FieldGrid,
    models::{AnalysisReport, AnalysisResult, ResultSource, Severity},
    notifications::{self, NotificationCenter},
    settings::SettingsStore,
};

use super::{PipelineState, PipelineStatus};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Pest risk shown on the dashboard before any image has been analysed.
pub const BASELINE_RISK: u8 = 12;

/// Run bookkeeping guarded by one lock so that token checks and commits are atomic.
struct RunLedger {
    current_run: u64,
    cache: FingerprintCache,
}

/// Drives one upload at a time through preprocessing, scanning and fusion.
///
/// Every upload takes a new run token. Only the run holding the current token
/// may publish transitions or commit results; older runs get
/// `PipelineError::Superseded` and leave no trace.
#[derive(Clone)]
pub struct PipelineController {
    config: Arc<PipelineConfig>,
    classifier: ClassifierAdapter,
    ledger: Arc<Mutex<RunLedger>>,
    grid: Arc<RwLock<FieldGrid>>,
    settings: Arc<SettingsStore>,
    notifications: NotificationCenter,
    state_tx: Arc<watch::Sender<PipelineState>>,
}

impl PipelineController {
    pub fn new(
        config: PipelineConfig,
        classifier: ClassifierAdapter,
        grid: Arc<RwLock<FieldGrid>>,
        settings: Arc<SettingsStore>,
        notifications: NotificationCenter,
    ) -> Self {
        let (state_tx, _) = watch::channel(PipelineState::new());
        Self {
            ledger: Arc::new(Mutex::new(RunLedger {
                current_run: 0,
                cache: FingerprintCache::new(config.cache_capacity),
            })),
            config: Arc::new(config),
            classifier,
            grid,
            settings,
            notifications,
            state_tx: Arc::new(state_tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> PipelineState {
        self.state_tx.borrow().clone()
    }

    /// Risk of the last committed result, or the baseline before any analysis.
    pub fn latest_risk(&self) -> u8 {
        self.state_tx
            .borrow()
            .last_result
            .as_ref()
            .map(|result| result.risk)
            .unwrap_or(BASELINE_RISK)
    }

    /// `(hits, misses, entries)` of the fingerprint cache.
    pub async fn cache_stats(&self) -> (u64, u64, usize) {
        let ledger = self.ledger.lock().await;
        let (hits, misses) = ledger.cache.stats();
        (hits, misses, ledger.cache.len())
    }

    pub async fn analyze(&self, payload: Vec<u8>) -> PipelineResult<AnalysisReport> {
        if payload.len() > self.config.max_upload_bytes {
            return Err(PipelineError::InputTooLarge {
                size: payload.len(),
                limit: self.config.max_upload_bytes,
            });
        }

        let fingerprint = Fingerprint::of(&payload);
        let (run_id, cached) = self.begin_run(&fingerprint).await;

        if let Some(result) = cached {
            time::sleep(self.config.cache_hit_delay).await;
            return self.finish_cached(run_id, fingerprint, result).await;
        }

        match self.compute(run_id, payload).await {
            Ok(fusion) => self.finish_computed(run_id, fingerprint, fusion).await,
            Err(err) => Err(self.fail(run_id, err).await),
        }
    }

    /// Return to `Idle`, abandoning any run still in flight.
    pub async fn reset(&self) {
        let mut ledger = self.ledger.lock().await;
        ledger.current_run += 1;
        let run_id = ledger.current_run;
        self.state_tx.send_modify(|state| state.reset(run_id));
        log_info!("pipeline reset (token {run_id})");
    }

    async fn begin_run(&self, fingerprint: &Fingerprint) -> (u64, Option<AnalysisResult>) {
        let mut ledger = self.ledger.lock().await;
        ledger.current_run += 1;
        let run_id = ledger.current_run;

        let previous = self.state_tx.borrow().clone();
        if previous.status.is_in_flight() {
            log_info!("run {} superseded by run {run_id}", previous.run_id);
        }

        let cached = ledger.cache.lookup(fingerprint);
        self.state_tx
            .send_modify(|state| state.begin(run_id, fingerprint.to_string()));
        log_debug!("run {run_id} started for image {}", fingerprint.short());
        (run_id, cached)
    }

    async fn advance(&self, run_id: u64, status: PipelineStatus) -> PipelineResult<()> {
        let ledger = self.ledger.lock().await;
        if ledger.current_run != run_id {
            return Err(PipelineError::Superseded(run_id));
        }
        self.state_tx.send_modify(|state| state.advance(status));
        Ok(())
    }

    async fn compute(&self, run_id: u64, payload: Vec<u8>) -> PipelineResult<Fusion> {
        let loaded = self.classifier.ensure_loaded().await;
        self.advance(run_id, PipelineStatus::Preprocessing).await?;
        loaded.map_err(|err| PipelineError::ModelUnavailable(format!("{err:#}")))?;

        time::sleep(self.config.preprocess_delay).await;
        self.advance(run_id, PipelineStatus::Scanning).await?;

        let input_size = self.config.classifier_input_size;
        let grid_size = self.config.heuristic_grid_size;
        let (input, signals) = tokio::task::spawn_blocking(move || {
            let image = preprocess::decode(&payload)?;
            let input = preprocess::standardize(&image, input_size);
            let signals: PixelSignals = heuristics::analyze(&image, grid_size);
            anyhow::Ok((input, signals))
        })
        .await
        .map_err(|err| PipelineError::UnreadableImage(err.to_string()))?
        .map_err(|err| PipelineError::UnreadableImage(format!("{err:#}")))?;

        let predictions = self
            .classifier
            .classify(input)
            .await
            .map_err(|err| PipelineError::ModelUnavailable(format!("{err:#}")))?;

        let zones = self.grid.read().await.zones().to_vec();
        Ok(fuse(&predictions, &signals, &zones))
    }

    async fn finish_cached(
        &self,
        run_id: u64,
        fingerprint: Fingerprint,
        result: AnalysisResult,
    ) -> PipelineResult<AnalysisReport> {
        {
            let ledger = self.ledger.lock().await;
            if ledger.current_run != run_id {
                return Err(PipelineError::Superseded(run_id));
            }
            let committed = result.clone();
            self.state_tx.send_modify(|state| state.complete(committed));
        }

        log_info!("cache hit for image {} (run {run_id})", fingerprint.short());
        self.record(
            ActivityKind::Success,
            "Cache Hit: Retrieved deterministic result for existing image.".to_string(),
        )
        .await;

        Ok(AnalysisReport {
            run_id,
            fingerprint: fingerprint.to_string(),
            source: ResultSource::Cache,
            result,
        })
    }

    async fn finish_computed(
        &self,
        run_id: u64,
        fingerprint: Fingerprint,
        fusion: Fusion,
    ) -> PipelineResult<AnalysisReport> {
        if !fusion.is_rejected() {
            time::sleep(self.config.scan_delay).await;
        }

        let Fusion { verdict, result } = fusion;
        {
            let mut ledger = self.ledger.lock().await;
            if ledger.current_run != run_id {
                return Err(PipelineError::Superseded(run_id));
            }

            if let Some(evicted) = ledger.cache.store(fingerprint.clone(), result.clone()) {
                log_debug!("evicted cached result for image {}", evicted.short());
            }

            if verdict == SubjectVerdict::Verified && !result.affected_regions.is_empty() {
                let touched = self
                    .grid
                    .write()
                    .await
                    .mutate(&result.affected_regions, result.risk);
                log_debug!("run {run_id} degraded {touched} zones");
            }

            let committed = result.clone();
            self.state_tx.send_modify(|state| state.complete(committed));
        }

        match &verdict {
            SubjectVerdict::Rejected { label } => {
                log_warn!("run {run_id} rejected subject \"{label}\"");
                self.record(
                    ActivityKind::Warning,
                    format!("Neural Reject: Subject identified as \"{label}\""),
                )
                .await;
            }
            SubjectVerdict::Verified => {
                log_info!(
                    "run {run_id} complete: {} (risk {}, {} zones)",
                    result.pattern,
                    result.risk,
                    result.affected_regions.len()
                );

                let preferences = self.settings.preferences();
                // the result is already committed; a lost alert must not fail the run
                if let Some(draft) = notifications::evaluate(&result, &preferences) {
                    if let Err(err) = self.notifications.push_draft(draft).await {
                        log_error!("run {run_id} could not store its pest alert: {err:#}");
                    }
                }

                let kind = if result.severity == Severity::High {
                    ActivityKind::Warning
                } else {
                    ActivityKind::Success
                };
                self.record(
                    kind,
                    format!(
                        "Neural Evaluation Complete: {} [Conf: {}%]",
                        result.pattern, result.confidence
                    ),
                )
                .await;
            }
        }

        Ok(AnalysisReport {
            run_id,
            fingerprint: fingerprint.to_string(),
            source: ResultSource::Computed,
            result,
        })
    }

    /// Park the state machine in `Failed` if `run_id` is still current.
    async fn fail(&self, run_id: u64, err: PipelineError) -> PipelineError {
        let Some(kind) = err.failure_kind() else {
            return err;
        };

        {
            let ledger = self.ledger.lock().await;
            if ledger.current_run != run_id {
                return PipelineError::Superseded(run_id);
            }
            self.state_tx.send_modify(|state| state.fail(kind));
        }

        log_error!("run {run_id} failed: {err}");
        self.record(ActivityKind::Error, format!("Analysis failed: {err}"))
            .await;
        err
    }

    async fn record(&self, kind: ActivityKind, text: String) {
        if let Err(err) = self.notifications.record(kind, text).await {
            log_error!("failed to append activity entry: {err:#}");
        }
    }
}
