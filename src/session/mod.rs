pub mod events;
pub mod inflight;
pub mod monitor;

pub use events::{EventBus, MonitorEvent};
pub use inflight::{InflightGuard, InflightSlot};
pub use monitor::MonitorSession;
