pub mod activity_entry;
pub mod frame;
pub mod interval;
pub mod ocr_sample;

pub use activity_entry::ActivitySummaryEntry;
pub use frame::FrameMark;
pub use interval::ActivityInterval;
pub use ocr_sample::{OcrSample, PendingBatch};
