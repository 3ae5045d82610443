pub mod config;
pub mod gate;
pub mod pipeline;
pub mod prompt;

pub use config::SummaryConfig;
pub use gate::{GateOutcome, SingleflightGate, SingleflightState};
pub use pipeline::{SummaryOutcome, SummaryPipeline};
