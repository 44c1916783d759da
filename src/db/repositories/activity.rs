use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, to_i64},
    models::{ActivityEntry, ActivityKind},
};

fn row_to_entry(row: &Row) -> Result<ActivityEntry> {
    let kind: String = row.get("kind")?;
    let created_at: String = row.get("created_at")?;

    Ok(ActivityEntry {
        id: row.get("id")?,
        time: parse_datetime(&created_at, "created_at")?,
        text: row.get("text")?,
        kind: kind.parse()?,
    })
}

impl Database {
    pub async fn insert_activity(&self, kind: ActivityKind, text: String) -> Result<ActivityEntry> {
        self.execute(move |conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO activity_log (kind, text, created_at) VALUES (?1, ?2, ?3)",
                params![kind.as_str(), text, now.to_rfc3339()],
            )
            .context("failed to insert activity entry")?;

            Ok(ActivityEntry {
                id: conn.last_insert_rowid(),
                time: now,
                text,
                kind,
            })
        })
        .await
    }

    /// Newest first, at most `limit` entries.
    pub async fn recent_activity(&self, limit: u64) -> Result<Vec<ActivityEntry>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, kind, text, created_at
                 FROM activity_log
                 ORDER BY id DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![to_i64(limit)?])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }

            Ok(entries)
        })
        .await
    }
}
