pub mod log;
pub mod presenter;
pub mod render;
pub mod window;

pub use log::ActivityLog;
pub use presenter::ActivityPresenter;
pub use render::{ActivityRow, ActivityView};
pub use window::{WindowConfig, WindowManager};
