use serde::{Deserialize, Serialize};

use crate::{error::FailureKind, models::AnalysisResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PipelineStatus {
    Idle,
    Preprocessing,
    Scanning,
    Completed,
    Failed,
}

impl Default for PipelineStatus {
    fn default() -> Self {
        PipelineStatus::Idle
    }
}

impl PipelineStatus {
    pub fn is_in_flight(self) -> bool {
        matches!(self, PipelineStatus::Preprocessing | PipelineStatus::Scanning)
    }
}

/// Snapshot published to subscribers after every transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    pub status: PipelineStatus,
    /// Token of the run that produced this snapshot; bumped by every upload and reset.
    pub run_id: u64,
    pub fingerprint: Option<String>,
    /// Most recent committed result. Kept across resets.
    pub last_result: Option<AnalysisResult>,
    pub failure: Option<FailureKind>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, run_id: u64, fingerprint: String) {
        self.status = PipelineStatus::Preprocessing;
        self.run_id = run_id;
        self.fingerprint = Some(fingerprint);
        self.failure = None;
    }

    pub fn advance(&mut self, status: PipelineStatus) {
        self.status = status;
    }

    pub fn complete(&mut self, result: AnalysisResult) {
        self.status = PipelineStatus::Completed;
        self.last_result = Some(result);
        self.failure = None;
    }

    pub fn fail(&mut self, kind: FailureKind) {
        self.status = PipelineStatus::Failed;
        self.failure = Some(kind);
    }

    pub fn reset(&mut self, run_id: u64) {
        self.status = PipelineStatus::Idle;
        self.run_id = run_id;
        self.fingerprint = None;
        self.failure = None;
    }
}
