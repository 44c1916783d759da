use anyhow::Result;

use crate::db::{
    models::{ActivityEntry, ActivityKind, Notification, NotificationDraft, NotificationKind, Priority},
    Database,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Notification store and activity feed for one farm session.
#[derive(Clone)]
pub struct NotificationCenter {
    db: Database,
}

impl NotificationCenter {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn push(
        &self,
        kind: NotificationKind,
        priority: Priority,
        message: impl Into<String>,
    ) -> Result<Notification> {
        self.push_draft(NotificationDraft {
            kind,
            priority,
            message: message.into(),
        })
        .await
    }

    pub async fn push_draft(&self, draft: NotificationDraft) -> Result<Notification> {
        let notification = self.db.insert_notification(draft).await?;
        log_debug!(
            "notification {} ({}/{}) stored",
            notification.id,
            notification.kind.as_str(),
            notification.priority.as_str()
        );
        Ok(notification)
    }

    pub async fn list(&self) -> Result<Vec<Notification>> {
        self.db.list_notifications().await
    }

    pub async fn mark_read(&self, id: &str) -> Result<bool> {
        self.db.mark_notification_read(id).await
    }

    pub async fn mark_all_read(&self) -> Result<usize> {
        self.db.mark_all_notifications_read().await
    }

    pub async fn clear(&self) -> Result<usize> {
        let removed = self.db.clear_notifications().await?;
        log_info!("cleared {removed} notifications");
        Ok(removed)
    }

    pub async fn unread_count(&self, kind: Option<NotificationKind>) -> Result<u32> {
        self.db.count_unread_notifications(kind).await
    }

    /// Append a line to the activity feed.
    pub async fn record(&self, kind: ActivityKind, text: impl Into<String>) -> Result<ActivityEntry> {
        self.db.insert_activity(kind, text.into()).await
    }

    pub async fn recent_activity(&self, limit: u64) -> Result<Vec<ActivityEntry>> {
        self.db.recent_activity(limit).await
    }
}
