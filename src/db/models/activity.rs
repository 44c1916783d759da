use std::str::FromStr;

use anyhow::{anyhow, Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Info,
    Success,
    Warning,
    Error,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Info => "info",
            ActivityKind::Success => "success",
            ActivityKind::Warning => "warning",
            ActivityKind::Error => "error",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "info" => Ok(ActivityKind::Info),
            "success" => Ok(ActivityKind::Success),
            "warning" => Ok(ActivityKind::Warning),
            "error" => Ok(ActivityKind::Error),
            other => Err(anyhow!("unknown activity kind '{other}'")),
        }
    }
}

/// One line of the AI activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: i64,
    pub time: DateTime<Utc>,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
}
