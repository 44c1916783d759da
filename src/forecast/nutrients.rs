use serde::{Deserialize, Serialize};

/// Chlorophyll reading (SPAD-equivalent) above which nitrogen is adequate.
const NITROGEN_CHLOROPHYLL_FLOOR: f64 = 40.0;
const PHOSPHORUS_INDEX_FLOOR: f64 = 0.4;
const POTASSIUM_MOISTURE_FLOOR: f64 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reflectance {
    pub red: f64,
    pub nir: f64,
    pub green: f64,
}

/// Field sensor proxies used to estimate nutrient status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub ndvi: f64,
    pub evi: f64,
    pub moisture: f64,
    pub leaf_chlorophyll: f64,
    pub reflectance: Reflectance,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            ndvi: 0.88,
            evi: 0.82,
            moisture: 42.0,
            leaf_chlorophyll: 45.0,
            reflectance: Reflectance {
                red: 0.05,
                nir: 0.45,
                green: 0.12,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NutrientLevel {
    Optimal,
    Low,
}

impl NutrientLevel {
    fn from_check(ok: bool) -> Self {
        if ok {
            NutrientLevel::Optimal
        } else {
            NutrientLevel::Low
        }
    }

    pub fn is_optimal(self) -> bool {
        self == NutrientLevel::Optimal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutrientStatus {
    pub nitrogen: NutrientLevel,
    pub phosphorus: NutrientLevel,
    pub potassium: NutrientLevel,
    pub overall: NutrientLevel,
}

/// Green/NIR ratio used as the phosphorus proxy.
pub fn phosphorus_index(reflectance: &Reflectance) -> f64 {
    let denominator = reflectance.green * 10.0;
    if denominator <= 0.0 {
        return 0.0;
    }
    reflectance.nir / denominator
}

pub fn assess(telemetry: &Telemetry) -> NutrientStatus {
    let nitrogen = NutrientLevel::from_check(telemetry.leaf_chlorophyll > NITROGEN_CHLOROPHYLL_FLOOR);
    let phosphorus =
        NutrientLevel::from_check(phosphorus_index(&telemetry.reflectance) > PHOSPHORUS_INDEX_FLOOR);
    let potassium = NutrientLevel::from_check(telemetry.moisture > POTASSIUM_MOISTURE_FLOOR);

    // potassium is reported but does not gate the overall status
    let overall = NutrientLevel::from_check(nitrogen.is_optimal() && phosphorus.is_optimal());

    NutrientStatus {
        nitrogen,
        phosphorus,
        potassium,
        overall,
    }
}
