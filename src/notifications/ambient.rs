//! Recurring simulated pest alert, independent of any analysis.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use super::NotificationCenter;
use crate::{
    db::models::{NotificationKind, Priority},
    settings::{Language, SettingsStore},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_warn};

pub fn ambient_message(language: Language, pest_threshold: u8) -> String {
    match language {
        Language::English => {
            format!("CRITICAL: Pest infestation at {pest_threshold}% risk in Sector B")
        }
        Language::Spanish => {
            format!("CRÍTICO: Riesgo de infestación al {pest_threshold}% en el Sector B")
        }
        Language::Hindi => {
            format!("गंभीर: सेक्टर B में {pest_threshold}% जोखिम पर कीट का प्रकोप")
        }
        Language::French => {
            format!("CRITIQUE: Risque d'infestation à {pest_threshold}% dans le Secteur B")
        }
    }
}

/// Handle to the background alert task. Stops when the token is cancelled.
pub struct AmbientAlerts {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl AmbientAlerts {
    pub fn spawn(
        center: NotificationCenter,
        settings: Arc<SettingsStore>,
        delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = time::sleep(delay) => {}
                }

                // Settings are re-read every cycle so toggles apply immediately.
                let preferences = settings.preferences();
                if !preferences.notifications_enabled.pest {
                    continue;
                }

                let message =
                    ambient_message(preferences.language, preferences.thresholds.pest);
                if let Err(err) = center
                    .push(NotificationKind::Pest, Priority::High, message)
                    .await
                {
                    log_error!("failed to store ambient alert: {err:#}");
                }
            }
            log_debug!("ambient alert task stopped");
        });

        Self { cancel, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.handle.await {
            log_warn!("ambient alert task ended abnormally: {err}");
        }
    }
}
