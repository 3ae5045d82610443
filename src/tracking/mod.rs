pub mod config;
pub mod tracker;

pub use config::TrackingConfig;
pub use tracker::{merge_activity, IntervalTracker, MergeAction};
