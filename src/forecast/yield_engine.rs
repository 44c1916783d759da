//! Yield forecast: historical average scaled by current field health, the
//! latest pest risk and nutrient status.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use super::nutrients::NutrientStatus;
use crate::field::FieldGrid;

/// Health score treated as a standard season.
const REFERENCE_HEALTH: f64 = 90.0;
/// Share of yield lost at 100% pest risk.
const MAX_PEST_PENALTY: f64 = 0.15;
const OPTIMAL_NUTRIENT_MULTIPLIER: f64 = 1.05;
const LOW_NUTRIENT_MULTIPLIER: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalYield {
    pub year: u16,
    pub yield_per_hectare: f64,
}

/// Tonnes per hectare for the last five seasons.
pub fn default_history() -> Vec<HistoricalYield> {
    [(2021, 3.8), (2022, 4.1), (2023, 3.9), (2024, 4.2), (2025, 4.0)]
        .into_iter()
        .map(|(year, yield_per_hectare)| HistoricalYield {
            year,
            yield_per_hectare,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldForecast {
    pub predicted_per_ha: f64,
    pub total_predicted: f64,
    pub percent_change: f64,
}

impl YieldForecast {
    pub fn per_ha_label(&self) -> String {
        format!("{:.1}", self.predicted_per_ha)
    }

    pub fn total_rounded(&self) -> i64 {
        self.total_predicted.round() as i64
    }

    pub fn change_label(&self) -> String {
        let rounded = self.percent_change.round();
        if rounded == 0.0 {
            return "0%".to_string();
        }
        let sign = if rounded > 0.0 { "+" } else { "" };
        format!("{sign}{rounded:.0}%")
    }
}

pub fn forecast(
    grid: &FieldGrid,
    latest_risk: u8,
    nutrients: &NutrientStatus,
    history: &[HistoricalYield],
    area_hectares: f64,
) -> Result<YieldForecast> {
    ensure!(!history.is_empty(), "historical yield series is empty");

    let avg_historical =
        history.iter().map(|h| h.yield_per_hectare).sum::<f64>() / history.len() as f64;

    let health_multiplier = grid.health_score() as f64 / REFERENCE_HEALTH;
    let pest_penalty = (latest_risk.min(100) as f64 / 100.0) * MAX_PEST_PENALTY;
    let nutrient_multiplier = if nutrients.overall.is_optimal() {
        OPTIMAL_NUTRIENT_MULTIPLIER
    } else {
        LOW_NUTRIENT_MULTIPLIER
    };

    let predicted_per_ha =
        avg_historical * health_multiplier * (1.0 - pest_penalty) * nutrient_multiplier;

    Ok(YieldForecast {
        predicted_per_ha,
        total_predicted: predicted_per_ha * area_hectares,
        percent_change: (predicted_per_ha - avg_historical) / avg_historical * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::nutrients::NutrientLevel;
    use crate::models::{FieldZone, ZoneStatus};
    use crate::settings::FarmProfile;

    fn uniform_grid(health: u8) -> FieldGrid {
        FieldGrid::from_zones(
            (0..60)
                .map(|id| FieldZone {
                    id,
                    coordinate: format!("Z{id}"),
                    health,
                    ndvi: 0.8,
                    nitrogen: 0.9,
                    pest_risk: 0.1,
                    status: ZoneStatus::Optimal,
                })
                .collect(),
        )
    }

    fn status(overall: NutrientLevel) -> NutrientStatus {
        NutrientStatus {
            nitrogen: overall,
            phosphorus: overall,
            potassium: NutrientLevel::Optimal,
            overall,
        }
    }

    fn flat_history(value: f64) -> Vec<HistoricalYield> {
        vec![HistoricalYield {
            year: 2025,
            yield_per_hectare: value,
        }]
    }

    #[test]
    fn reference_scenario() {
        let farm = FarmProfile {
            farm_area_value: 2.471,
            ..FarmProfile::default()
        };
        let result = forecast(
            &uniform_grid(90),
            0,
            &status(NutrientLevel::Optimal),
            &flat_history(4.0),
            farm.area_hectares(),
        )
        .unwrap();

        assert!((result.predicted_per_ha - 4.2).abs() < 1e-9);
        assert_eq!(result.per_ha_label(), "4.2");
        assert_eq!(result.total_rounded(), 4);
        assert_eq!(result.change_label(), "+5%");
    }

    #[test]
    fn pest_risk_and_low_nutrients_reduce_the_forecast() {
        let result = forecast(
            &uniform_grid(90),
            60,
            &status(NutrientLevel::Low),
            &flat_history(4.0),
            1.0,
        )
        .unwrap();

        // 4.0 * (1 - 0.09) * 0.9
        assert!((result.predicted_per_ha - 3.276).abs() < 1e-9);
        assert_eq!(result.change_label(), "-18%");
    }

    #[test]
    fn averages_the_default_history() {
        let result = forecast(
            &uniform_grid(90),
            0,
            &status(NutrientLevel::Low),
            &default_history(),
            100.0,
        )
        .unwrap();

        // mean 4.0, * 0.9
        assert!((result.predicted_per_ha - 3.6).abs() < 1e-9);
        assert!((result.total_predicted - 360.0).abs() < 1e-6);
    }

    #[test]
    fn change_label_signs_the_rounded_value() {
        let label = |percent_change| {
            YieldForecast {
                predicted_per_ha: 4.0,
                total_predicted: 4.0,
                percent_change,
            }
            .change_label()
        };
        assert_eq!(label(-0.3), "0%");
        assert_eq!(label(0.4), "0%");
        assert_eq!(label(0.0), "0%");
        assert_eq!(label(4.6), "+5%");
        assert_eq!(label(-18.0), "-18%");
    }

    #[test]
    fn empty_history_is_rejected() {
        let err = forecast(
            &uniform_grid(90),
            0,
            &status(NutrientLevel::Optimal),
            &[],
            1.0,
        )
        .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
