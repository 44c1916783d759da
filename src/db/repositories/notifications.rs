use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, to_i64, to_u32},
    models::{Notification, NotificationDraft, NotificationKind},
};

/// Only the most recent notifications are kept.
pub const MAX_NOTIFICATIONS: u64 = 50;

fn row_to_notification(row: &Row) -> Result<Notification> {
    let kind: String = row.get("kind")?;
    let priority: String = row.get("priority")?;
    let created_at: String = row.get("created_at")?;

    Ok(Notification {
        id: row.get("id")?,
        kind: kind.parse()?,
        priority: priority.parse()?,
        message: row.get("message")?,
        timestamp: parse_datetime(&created_at, "created_at")?,
        read: row.get::<_, i64>("is_read")? != 0,
    })
}

impl Database {
    /// Insert an unread notification and drop everything beyond the newest 50.
    pub async fn insert_notification(&self, draft: NotificationDraft) -> Result<Notification> {
        self.execute(move |conn| {
            let notification = Notification {
                id: Uuid::new_v4().to_string(),
                kind: draft.kind,
                priority: draft.priority,
                message: draft.message,
                timestamp: Utc::now(),
                read: false,
            };

            // Trim within the same DB task so the cap holds under concurrent pushes.
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO notifications (id, kind, priority, message, created_at, is_read)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![
                    notification.id,
                    notification.kind.as_str(),
                    notification.priority.as_str(),
                    notification.message,
                    notification.timestamp.to_rfc3339(),
                ],
            )
            .context("failed to insert notification")?;
            tx.execute(
                "DELETE FROM notifications
                 WHERE seq NOT IN (
                     SELECT seq FROM notifications ORDER BY seq DESC LIMIT ?1
                 )",
                params![to_i64(MAX_NOTIFICATIONS)?],
            )
            .context("failed to trim notifications")?;
            tx.commit()?;

            Ok(notification)
        })
        .await
    }

    /// Newest first.
    pub async fn list_notifications(&self) -> Result<Vec<Notification>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, kind, priority, message, created_at, is_read
                 FROM notifications
                 ORDER BY seq DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut notifications = Vec::new();
            while let Some(row) = rows.next()? {
                notifications.push(row_to_notification(row)?);
            }

            Ok(notifications)
        })
        .await
    }

    /// Returns false when no notification has that id.
    pub async fn mark_notification_read(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.execute(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE notifications SET is_read = 1 WHERE id = ?1",
                    params![id],
                )
                .context("failed to mark notification read")?;
            Ok(updated > 0)
        })
        .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<usize> {
        self.execute(|conn| {
            conn.execute("UPDATE notifications SET is_read = 1 WHERE is_read = 0", [])
                .context("failed to mark notifications read")
        })
        .await
    }

    pub async fn clear_notifications(&self) -> Result<usize> {
        self.execute(|conn| {
            conn.execute("DELETE FROM notifications", [])
                .context("failed to clear notifications")
        })
        .await
    }

    /// Unread count, optionally restricted to one kind.
    pub async fn count_unread_notifications(&self, kind: Option<NotificationKind>) -> Result<u32> {
        self.execute(move |conn| {
            let count: i64 = match kind {
                Some(kind) => conn.query_row(
                    "SELECT COUNT(*) FROM notifications WHERE is_read = 0 AND kind = ?1",
                    params![kind.as_str()],
                    |row| row.get(0),
                )?,
                None => conn.query_row(
                    "SELECT COUNT(*) FROM notifications WHERE is_read = 0",
                    [],
                    |row| row.get(0),
                )?,
            };
            to_u32(count, "unread count")
        })
        .await
    }
}
