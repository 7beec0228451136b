mod pipeline;
mod scheduler;

pub use pipeline::{run_refresh, RefreshOutcome};
pub use scheduler::{Monitor, MonitorEvent};
