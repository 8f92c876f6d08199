use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::{Alert, AlertSeverity};
use crate::snapshot::{ContainerState, ResourceSnapshot, RunnerState, RuntimeSnapshot};

/// 整体健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Healthy,
    Warning,
    Critical,
    Unknown,
}

/// 当前健康视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub system: Option<ResourceSnapshot>,
    pub docker: Option<RuntimeSnapshot>,
    pub runners: Vec<RunnerState>,
    pub recent_alerts: Vec<Alert>,
    pub overall_status: OverallStatus,
    pub timestamp: DateTime<Utc>,
}

/// 仪表盘摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub overall_status: OverallStatus,
    pub system: Option<SystemSummary>,
    pub docker: DockerSummary,
    pub runners: RunnerStats,
    pub alerts: AlertSummary,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSummary {
    pub cpu_usage_pct: f64,
    pub ram_usage_pct: f64,
    pub disk_usage_pct: f64,
    pub battery_pct: Option<u8>,
    pub power_connected: Option<bool>,
}

impl From<&ResourceSnapshot> for SystemSummary {
    fn from(snapshot: &ResourceSnapshot) -> Self {
        Self {
            cpu_usage_pct: snapshot.cpu_usage_pct,
            ram_usage_pct: snapshot.ram_usage_pct,
            disk_usage_pct: snapshot.disk_usage_pct,
            battery_pct: snapshot.battery_pct,
            power_connected: snapshot.power_connected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockerSummary {
    pub daemon_running: bool,
    pub containers: Option<ContainerStats>,
}

impl DockerSummary {
    pub fn from_snapshot(snapshot: Option<&RuntimeSnapshot>) -> Self {
        Self {
            daemon_running: snapshot.map(|s| s.daemon_reachable).unwrap_or(false),
            containers: snapshot.map(|s| ContainerStats::from_containers(&s.containers)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerStats {
    pub total: usize,
    pub running: usize,
    pub stopped: usize,
    pub not_found: usize,
}

impl ContainerStats {
    pub fn from_containers(containers: &[ContainerState]) -> Self {
        Self {
            total: containers.len(),
            running: containers.iter().filter(|c| c.is_running).count(),
            stopped: containers.iter().filter(|c| c.is_stopped()).count(),
            not_found: containers.iter().filter(|c| c.is_missing()).count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunnerStats {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub busy: usize,
}

impl RunnerStats {
    pub fn from_runners(runners: &[RunnerState]) -> Self {
        Self {
            total: runners.len(),
            online: runners.iter().filter(|r| r.is_online).count(),
            offline: runners.iter().filter(|r| !r.is_online).count(),
            busy: runners.iter().filter(|r| r.is_busy).count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertSummary {
    /// 未确认的 CRITICAL 告警数
    pub critical: usize,
    /// 未确认的 WARNING 告警数
    pub warning: usize,
    pub total: usize,
}

impl AlertSummary {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let open = |severity: AlertSeverity| {
            alerts
                .iter()
                .filter(|a| a.severity == severity && !a.acknowledged)
                .count()
        };

        Self {
            critical: open(AlertSeverity::Critical),
            warning: open(AlertSeverity::Warning),
            total: alerts.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertRequest, AlertType};

    #[test]
    fn test_container_stats() {
        let mut running = ContainerState::not_found("api");
        running.runtime_state = "running".to_string();
        running.is_running = true;

        let mut exited = ContainerState::not_found("db");
        exited.runtime_state = "exited".to_string();

        let stats =
            ContainerStats::from_containers(&[running, exited, ContainerState::not_found("nginx")]);

        assert_eq!(
            stats,
            ContainerStats {
                total: 3,
                running: 1,
                stopped: 1,
                not_found: 1,
            }
        );
    }

    #[test]
    fn test_alert_summary_skips_acknowledged() {
        let critical = Alert::from_request(
            AlertRequest::new(AlertType::RuntimeDown, AlertSeverity::Critical, "down"),
            Utc::now(),
        );
        let mut acked = Alert::from_request(
            AlertRequest::new(AlertType::ContainerDown, AlertSeverity::Critical, "db down"),
            Utc::now(),
        );
        acked.acknowledged = true;
        let warning = Alert::from_request(
            AlertRequest::new(AlertType::CpuHigh, AlertSeverity::Warning, "cpu"),
            Utc::now(),
        );

        let summary = AlertSummary::from_alerts(&[critical, acked, warning]);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.warning, 1);
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn test_docker_summary_without_snapshot() {
        let summary = DockerSummary::from_snapshot(None);
        assert!(!summary.daemon_running);
        assert!(summary.containers.is_none());
    }
}
