use rand::Rng;
use serde::Serialize;

use crate::models::{FieldZone, ZoneStatus};

pub const GRID_ROWS: usize = 6;
pub const GRID_COLS: usize = 10;

/// Zone indices seeded as stressed when a session starts.
const STRESSED_ZONES: [usize; 3] = [12, 34, 45];

const MIN_HEALTH: u8 = 5;
const MIN_NDVI: f64 = 0.1;
const NDVI_PER_HEALTH_POINT: f64 = 0.8;

const EMPTY_GRID_HEALTH: u32 = 92;
const EMPTY_GRID_NDVI: f64 = 0.88;

/// Fixed 6×10 field-health grid. Health and NDVI only ever go down.
#[derive(Debug, Clone, Serialize)]
pub struct FieldGrid {
    zones: Vec<FieldZone>,
}

fn coordinate(row: usize, col: usize) -> String {
    format!("{}{}", char::from(b'A' + col as u8), row + 1)
}

impl FieldGrid {
    /// Synthetic session-start grid with per-zone variance drawn from `rng`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let zones = (0..GRID_ROWS * GRID_COLS)
            .map(|i| {
                let (row, col) = (i / GRID_COLS, i % GRID_COLS);
                let ndvi = 0.7 + rng.gen::<f64>() * 0.2;
                let nitrogen = 0.8 + rng.gen::<f64>() * 0.2;
                let stressed = STRESSED_ZONES.contains(&i);
                let health = if stressed {
                    45
                } else {
                    (80.0 + rng.gen::<f64>() * 20.0).floor() as u8
                };

                FieldZone {
                    id: i,
                    coordinate: coordinate(row, col),
                    health,
                    ndvi,
                    nitrogen,
                    pest_risk: if stressed { 0.6 } else { 0.1 },
                    status: if stressed {
                        ZoneStatus::Critical
                    } else {
                        ZoneStatus::Optimal
                    },
                }
            })
            .collect();

        Self { zones }
    }

    pub fn from_zones(zones: Vec<FieldZone>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[FieldZone] {
        &self.zones
    }

    pub fn zone(&self, coordinate: &str) -> Option<&FieldZone> {
        self.zones.iter().find(|z| z.coordinate == coordinate)
    }

    /// Degrade every zone named in `affected`. Returns how many zones changed.
    pub fn mutate(&mut self, affected: &[String], risk: u8) -> usize {
        if affected.is_empty() {
            return 0;
        }

        let health_drop: u8 = if risk > 50 { 25 } else { 12 };
        let ndvi_drop = (health_drop as f64 / 100.0) * NDVI_PER_HEALTH_POINT;

        let mut touched = 0;
        for zone in self
            .zones
            .iter_mut()
            .filter(|z| affected.iter().any(|c| *c == z.coordinate))
        {
            zone.health = zone.health.saturating_sub(health_drop).max(MIN_HEALTH);
            zone.ndvi = (zone.ndvi - ndvi_drop).max(MIN_NDVI);
            touched += 1;
        }
        touched
    }

    pub fn average_health(&self) -> f64 {
        if self.zones.is_empty() {
            return EMPTY_GRID_HEALTH as f64;
        }
        let total: u32 = self.zones.iter().map(|z| z.health as u32).sum();
        total as f64 / self.zones.len() as f64
    }

    /// Rounded mean health, the figure shown on the dashboard.
    pub fn health_score(&self) -> u32 {
        if self.zones.is_empty() {
            return EMPTY_GRID_HEALTH;
        }
        self.average_health().round() as u32
    }

    pub fn average_ndvi(&self) -> f64 {
        if self.zones.is_empty() {
            return EMPTY_GRID_NDVI;
        }
        self.zones.iter().map(|z| z.ndvi).sum::<f64>() / self.zones.len() as f64
    }
}
