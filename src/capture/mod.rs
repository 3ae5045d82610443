pub mod config;
pub mod sampling;
pub mod scheduler;

pub use config::CaptureConfig;
pub use scheduler::{CaptureOutcome, OcrScheduler, OnDemandOutcome, SettleOutcome};
