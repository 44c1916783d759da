use serde::{Deserialize, Serialize};

/// Coarse risk tier derived from classifier confidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Low
    }
}

impl Severity {
    /// `> 80` is High, `50..=80` is Medium, anything lower is Low.
    pub fn from_confidence(conf_score: u8) -> Self {
        if conf_score > 80 {
            Severity::High
        } else if conf_score >= 50 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

/// Fused risk assessment for a single crop photograph.
///
/// Immutable once produced; the fingerprint cache hands out clones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub risk: u8,
    pub pattern: String,
    pub confidence: u8,
    pub severity: Severity,
    pub affected_area: u8,
    pub affected_regions: Vec<String>,
}

pub const INCOMPATIBLE_SUBJECT_PREFIX: &str = "Incompatible Subject:";

impl AnalysisResult {
    pub fn is_incompatible_subject(&self) -> bool {
        self.pattern.starts_with(INCOMPATIBLE_SUBJECT_PREFIX)
    }
}

/// Where a surfaced result came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ResultSource {
    Computed,
    Cache,
}

/// What a completed pipeline run hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub run_id: u64,
    pub fingerprint: String,
    pub source: ResultSource,
    pub result: AnalysisResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_boundaries_are_inclusive_at_fifty_and_eighty() {
        assert_eq!(Severity::from_confidence(81), Severity::High);
        assert_eq!(Severity::from_confidence(80), Severity::Medium);
        assert_eq!(Severity::from_confidence(65), Severity::Medium);
        assert_eq!(Severity::from_confidence(50), Severity::Medium);
        assert_eq!(Severity::from_confidence(49), Severity::Low);
        assert_eq!(Severity::from_confidence(30), Severity::Low);
    }

    #[test]
    fn result_serializes_with_camel_case_keys() {
        let result = AnalysisResult {
            risk: 60,
            pattern: "Minor Stress Pattern".into(),
            confidence: 60,
            severity: Severity::Medium,
            affected_area: 12,
            affected_regions: vec!["A1".into()],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["affectedArea"], 12);
        assert_eq!(json["affectedRegions"][0], "A1");
        assert_eq!(json["severity"], "Medium");
    }
}
