use crate::{
    db::models::{NotificationDraft, NotificationKind, Priority},
    models::AnalysisResult,
    settings::ThresholdSettings,
};

/// Risk above which a detection alert is raised as high priority.
const HIGH_PRIORITY_RISK: u8 = 80;

/// Decide whether a fused result warrants a pest alert.
///
/// Fires only when pest notifications are enabled and the risk is strictly
/// above the configured pest threshold.
pub fn evaluate(result: &AnalysisResult, settings: &ThresholdSettings) -> Option<NotificationDraft> {
    if !settings.notifications_enabled.pest || result.risk <= settings.thresholds.pest {
        return None;
    }

    let priority = if result.risk > HIGH_PRIORITY_RISK {
        Priority::High
    } else {
        Priority::Medium
    };

    Some(NotificationDraft {
        kind: NotificationKind::Pest,
        priority,
        message: format!(
            "AI Detection: {} ({}% confidence) identified in scanning workflow.",
            result.pattern, result.confidence
        ),
    })
}
