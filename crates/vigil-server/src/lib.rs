pub mod api;
pub mod metrics;
pub mod scheduler;
pub mod shutdown;

use std::sync::Arc;

pub use api::create_router;
pub use scheduler::{HealthMonitor, MonitorSettings, SourceKind, Sources};
pub use shutdown::{ShutdownSignal, SignalHandler};

/// HTTP 层共享状态
pub struct AppState {
    pub monitor: Arc<HealthMonitor>,
}

impl AppState {
    pub fn new(monitor: Arc<HealthMonitor>) -> Arc<Self> {
        Arc::new(Self { monitor })
    }
}
