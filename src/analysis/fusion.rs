//! Fusion of classifier output and pixel heuristics into one risk assessment.
//!
//! `fuse` is a pure function: the same predictions, signals and zone layout
//! always produce the same `AnalysisResult`.

use serde::Serialize;

use super::{classifier::Prediction, heuristics::PixelSignals};
use crate::models::{
    analysis::INCOMPATIBLE_SUBJECT_PREFIX, AnalysisResult, FieldZone, Severity,
};

/// Plant density (percent) above which the subject is accepted outright.
const MIN_PLANT_DENSITY: f64 = 15.0;
/// Risk at or below this selects no zones.
const ZONE_RISK_FLOOR: u8 = 15;
/// Each zone selected stands for this many points of affected area.
const AREA_PER_ZONE: u8 = 8;

const SUBJECT_KEYWORDS: [&str; 2] = ["leaf", "plant"];
const INSECT_KEYWORDS: [&str; 4] = ["beetle", "bug", "insect", "fly"];

const FALLBACK_LABEL: &str = "Unknown Object";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SubjectVerdict {
    Verified,
    Rejected { label: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fusion {
    pub verdict: SubjectVerdict,
    pub result: AnalysisResult,
}

impl Fusion {
    pub fn is_rejected(&self) -> bool {
        matches!(self.verdict, SubjectVerdict::Rejected { .. })
    }
}

fn percent(probability: f32) -> u8 {
    (probability.clamp(0.0, 1.0) as f64 * 100.0).round() as u8
}

pub fn fuse(predictions: &[Prediction], signals: &PixelSignals, zones: &[FieldZone]) -> Fusion {
    let (top_label, top_probability) = predictions
        .first()
        .map(|p| (p.label.as_str(), p.probability))
        .unwrap_or((FALLBACK_LABEL, 0.0));
    let lowered = top_label.to_lowercase();
    let conf_score = percent(top_probability);

    let verified = signals.plant_density() > MIN_PLANT_DENSITY
        || SUBJECT_KEYWORDS.iter().any(|k| lowered.contains(k));

    if !verified {
        return Fusion {
            verdict: SubjectVerdict::Rejected {
                label: top_label.to_string(),
            },
            result: AnalysisResult {
                risk: 0,
                pattern: format!("{INCOMPATIBLE_SUBJECT_PREFIX} {top_label}"),
                confidence: conf_score,
                severity: Severity::Low,
                affected_area: 0,
                affected_regions: Vec::new(),
            },
        };
    }

    let affected_area = affected_area_percent(signals);
    let severity = Severity::from_confidence(conf_score);
    // risk tracks classifier confidence one-to-one
    let risk = conf_score;

    let is_insect = INSECT_KEYWORDS.iter().any(|k| lowered.contains(k));
    let pattern = if severity == Severity::High || affected_area > 40 {
        if is_insect {
            format!("Pest Infestation: {}", first_segment(top_label))
        } else {
            "Severe Physiological Stress".to_string()
        }
    } else if severity == Severity::Medium || affected_area > 10 {
        if is_insect {
            format!("Detected Activity: {top_label}")
        } else {
            "Minor Stress Pattern".to_string()
        }
    } else {
        "Healthy: Optimal Surface".to_string()
    };

    Fusion {
        verdict: SubjectVerdict::Verified,
        result: AnalysisResult {
            risk,
            pattern,
            confidence: conf_score,
            severity,
            affected_area,
            affected_regions: select_zones(zones, risk, affected_area),
        },
    }
}

/// Stressed samples relative to foliage samples, capped at 100.
pub fn affected_area_percent(signals: &PixelSignals) -> u8 {
    let ratio = signals.stress_score as f64 / signals.plant_pixels.max(1) as f64;
    (ratio * 100.0).round().min(100.0) as u8
}

/// Coordinates in ascending lexicographic order, one zone per eight points of
/// affected area (always at least one once risk clears the floor).
pub fn select_zones(zones: &[FieldZone], risk: u8, affected_area: u8) -> Vec<String> {
    if risk <= ZONE_RISK_FLOOR {
        return Vec::new();
    }

    let mut coordinates: Vec<&str> = zones.iter().map(|z| z.coordinate.as_str()).collect();
    coordinates.sort_unstable();

    let take = usize::from((affected_area / AREA_PER_ZONE).max(1));
    coordinates
        .into_iter()
        .take(take)
        .map(str::to_string)
        .collect()
}

fn first_segment(label: &str) -> &str {
    label.split(',').next().unwrap_or(label)
}
