pub mod controller;
pub mod state;

pub use controller::{PipelineController, BASELINE_RISK};
pub use state::{PipelineState, PipelineStatus};
