pub mod alert;
pub mod health;
pub mod snapshot;

pub use alert::{Alert, AlertRequest, AlertSeverity, AlertType};
pub use health::{
    AlertSummary, ContainerStats, DashboardSummary, DockerSummary, OverallStatus, RunnerStats,
    SystemHealth, SystemSummary,
};
pub use snapshot::{
    ContainerState, ResourceSnapshot, RunnerSnapshot, RunnerState, RuntimeSnapshot,
    NOT_FOUND_STATE,
};
