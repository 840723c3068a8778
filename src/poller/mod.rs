pub mod controller;
pub mod monitor;

pub use controller::{PollerSettings, PollingController, ResumeStyle};
pub use monitor::{JobMonitor, PollDecision};
