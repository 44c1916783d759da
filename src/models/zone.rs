use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ZoneStatus {
    Optimal,
    Critical,
}

/// Display band for a zone's health reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ZoneBand {
    Optimal,
    Warning,
    Critical,
}

impl ZoneBand {
    pub fn from_health(health: u8) -> Self {
        if health >= 85 {
            ZoneBand::Optimal
        } else if health >= 60 {
            ZoneBand::Warning
        } else {
            ZoneBand::Critical
        }
    }
}

/// One cell of the field-health grid, addressed by column letter + row number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldZone {
    pub id: usize,
    pub coordinate: String,
    pub health: u8,
    pub ndvi: f64,
    pub nitrogen: f64,
    pub pest_risk: f64,
    pub status: ZoneStatus,
}

impl FieldZone {
    pub fn band(&self) -> ZoneBand {
        ZoneBand::from_health(self.health)
    }
}
