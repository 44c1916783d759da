pub mod analysis;
pub mod zone;

pub use analysis::{AnalysisReport, AnalysisResult, ResultSource, Severity};
pub use zone::{FieldZone, ZoneBand, ZoneStatus};
