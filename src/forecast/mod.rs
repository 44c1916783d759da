pub mod nutrients;
pub mod yield_engine;

pub use nutrients::{assess, NutrientLevel, NutrientStatus, Telemetry};
pub use yield_engine::{default_history, forecast, HistoricalYield, YieldForecast};
