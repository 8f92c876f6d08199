//! 阈值与状态规则，纯函数，不持有任何状态。

use serde::{Deserialize, Serialize};
use vigil_types::{
    AlertRequest, AlertSeverity, AlertType, ResourceSnapshot, RunnerSnapshot, RuntimeSnapshot,
};

const BYTES_PER_GB: f64 = 1_073_741_824.0;

/// 告警阈值（百分比）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_usage_threshold")]
    pub cpu: f64,
    #[serde(default = "default_usage_threshold")]
    pub ram: f64,
    #[serde(default = "default_usage_threshold")]
    pub disk: f64,
    #[serde(default = "default_battery_threshold")]
    pub battery: f64,
}

fn default_usage_threshold() -> f64 {
    80.0
}

fn default_battery_threshold() -> f64 {
    20.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu: default_usage_threshold(),
            ram: default_usage_threshold(),
            disk: default_usage_threshold(),
            battery: default_battery_threshold(),
        }
    }
}

fn gb(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / BYTES_PER_GB)
}

pub fn evaluate_resources(snapshot: &ResourceSnapshot, thresholds: &Thresholds) -> Vec<AlertRequest> {
    let mut requests = Vec::new();

    if snapshot.cpu_usage_pct > thresholds.cpu {
        requests.push(
            AlertRequest::new(
                AlertType::CpuHigh,
                AlertSeverity::Warning,
                format!(
                    "CPU usage exceeded {}%: {:.1}%",
                    thresholds.cpu, snapshot.cpu_usage_pct
                ),
            )
            .with_detail("current", snapshot.cpu_usage_pct)
            .with_detail("threshold", thresholds.cpu),
        );
    }

    if snapshot.ram_usage_pct > thresholds.ram {
        requests.push(
            AlertRequest::new(
                AlertType::RamHigh,
                AlertSeverity::Warning,
                format!(
                    "Memory usage exceeded {}%: {:.1}%",
                    thresholds.ram, snapshot.ram_usage_pct
                ),
            )
            .with_detail("current", snapshot.ram_usage_pct)
            .with_detail("threshold", thresholds.ram)
            .with_detail("used_gb", gb(snapshot.ram_used_bytes))
            .with_detail("total_gb", gb(snapshot.ram_total_bytes)),
        );
    }

    if snapshot.disk_usage_pct > thresholds.disk {
        requests.push(
            AlertRequest::new(
                AlertType::DiskHigh,
                AlertSeverity::Warning,
                format!(
                    "Disk usage exceeded {}%: {:.1}%",
                    thresholds.disk, snapshot.disk_usage_pct
                ),
            )
            .with_detail("current", snapshot.disk_usage_pct)
            .with_detail("threshold", thresholds.disk)
            .with_detail("used_gb", gb(snapshot.disk_used_bytes))
            .with_detail("total_gb", gb(snapshot.disk_total_bytes)),
        );
    }

    // 仅在未接电源时检查电量
    if let Some((battery, false)) = snapshot.battery() {
        if f64::from(battery) < thresholds.battery {
            requests.push(
                AlertRequest::new(
                    AlertType::BatteryLow,
                    AlertSeverity::Warning,
                    format!(
                        "Battery below {}%: {}% (not on power)",
                        thresholds.battery, battery
                    ),
                )
                .with_detail("current", battery)
                .with_detail("threshold", thresholds.battery)
                .with_detail("power_connected", false),
            );
        }
    }

    requests
}

pub fn evaluate_runtime(snapshot: &RuntimeSnapshot) -> Vec<AlertRequest> {
    if !snapshot.daemon_reachable {
        return vec![AlertRequest::new(
            AlertType::RuntimeDown,
            AlertSeverity::Critical,
            "Container runtime daemon is not responding",
        )
        .with_detail("status", "down")];
    }

    let mut requests = Vec::new();

    for container in &snapshot.containers {
        // not-found 的容器只展示，不告警
        if container.is_stopped() {
            requests.push(
                AlertRequest::new(
                    AlertType::ContainerDown,
                    AlertSeverity::Critical,
                    format!("Container '{}' is stopped", container.name),
                )
                .with_detail("container", container.name.as_str())
                .with_detail("state", container.runtime_state.as_str())
                .with_detail("status", container.status_text.as_str()),
            );
        }

        if container.is_restarting {
            requests.push(
                AlertRequest::new(
                    AlertType::ContainerRestarting,
                    AlertSeverity::Critical,
                    format!("Container '{}' is restarting", container.name),
                )
                .with_detail("container", container.name.as_str())
                .with_detail("restart_count", container.restart_count),
            );
        }
    }

    requests
}

pub fn evaluate_runners(snapshot: &RunnerSnapshot) -> Vec<AlertRequest> {
    snapshot
        .runners
        .iter()
        .filter(|runner| !runner.is_online)
        .map(|runner| {
            AlertRequest::new(
                AlertType::RunnerOffline,
                AlertSeverity::Critical,
                format!("CI runner '{}' is offline", runner.name),
            )
            .with_detail("runner", runner.name.as_str())
            .with_detail("status", runner.status_text.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_types::{ContainerState, RunnerState};

    const GB: u64 = 1_073_741_824;

    fn resources(cpu: f64, ram_used_gb: u64, disk_used_gb: u64) -> ResourceSnapshot {
        ResourceSnapshot::new(cpu, (ram_used_gb * GB, 100 * GB), (disk_used_gb * GB, 100 * GB))
    }

    fn container(name: &str, state: &str) -> ContainerState {
        ContainerState {
            name: name.to_string(),
            id: "0123456789ab".to_string(),
            runtime_state: state.to_string(),
            status_text: format!("{} (0) 2 minutes ago", state),
            is_running: state == "running",
            is_restarting: state == "restarting",
            restart_count: 0,
        }
    }

    fn runner(name: &str, online: bool) -> RunnerState {
        RunnerState {
            id: 1,
            name: name.to_string(),
            status_text: if online { "online" } else { "offline" }.to_string(),
            is_online: online,
            is_busy: false,
            labels: vec!["self-hosted".to_string()],
        }
    }

    #[test]
    fn test_cpu_breach() {
        let thresholds = Thresholds {
            cpu: 80.0,
            ..Thresholds::default()
        };

        let requests = evaluate_resources(&resources(85.0, 10, 10), &thresholds);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].alert_type, AlertType::CpuHigh);
        assert_eq!(requests[0].severity, AlertSeverity::Warning);
        assert_eq!(requests[0].details["current"], 85.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let requests = evaluate_resources(&resources(80.0, 80, 80), &Thresholds::default());
        assert!(requests.is_empty());
    }

    #[test]
    fn test_multiple_breaches_raise_independently() {
        let requests = evaluate_resources(&resources(95.0, 90, 91), &Thresholds::default());
        let types: Vec<AlertType> = requests.iter().map(|r| r.alert_type).collect();
        assert_eq!(
            types,
            vec![AlertType::CpuHigh, AlertType::RamHigh, AlertType::DiskHigh]
        );
        assert_eq!(requests[1].details["used_gb"], "90.0");
        assert_eq!(requests[2].details["total_gb"], "100.0");
    }

    #[test]
    fn test_battery_only_when_unplugged() {
        let thresholds = Thresholds::default();

        let unplugged = resources(10.0, 10, 10).with_battery(15, false);
        let requests = evaluate_resources(&unplugged, &thresholds);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].alert_type, AlertType::BatteryLow);
        assert_eq!(requests[0].details["power_connected"], false);

        let plugged = resources(10.0, 10, 10).with_battery(15, true);
        assert!(evaluate_resources(&plugged, &thresholds).is_empty());

        let charged = resources(10.0, 10, 10).with_battery(50, false);
        assert!(evaluate_resources(&charged, &thresholds).is_empty());

        assert!(evaluate_resources(&resources(10.0, 10, 10), &thresholds).is_empty());
    }

    #[test]
    fn test_daemon_down_stops_evaluation() {
        let requests = evaluate_runtime(&RuntimeSnapshot::unreachable());
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].alert_type, AlertType::RuntimeDown);
        assert_eq!(requests[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_stopped_container() {
        let snapshot = RuntimeSnapshot::reachable(vec![
            container("api", "running"),
            container("db", "exited"),
        ]);

        let requests = evaluate_runtime(&snapshot);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].alert_type, AlertType::ContainerDown);
        assert_eq!(requests[0].severity, AlertSeverity::Critical);
        assert_eq!(requests[0].details["container"], "db");
        assert!(requests[0].message.contains("db"));
    }

    #[test]
    fn test_not_found_container_is_silent() {
        let snapshot = RuntimeSnapshot::reachable(vec![ContainerState::not_found("db")]);
        assert!(evaluate_runtime(&snapshot).is_empty());
    }

    #[test]
    fn test_restarting_container_raises_both() {
        let mut restarting = container("worker", "restarting");
        restarting.restart_count = 4;
        let snapshot = RuntimeSnapshot::reachable(vec![restarting]);

        let requests = evaluate_runtime(&snapshot);
        let types: Vec<AlertType> = requests.iter().map(|r| r.alert_type).collect();
        assert_eq!(
            types,
            vec![AlertType::ContainerDown, AlertType::ContainerRestarting]
        );
        assert_eq!(requests[1].details["restart_count"], 4);
    }

    #[test]
    fn test_offline_runners() {
        let snapshot = RunnerSnapshot::new(vec![runner("ci-1", true), runner("ci-2", false)]);

        let requests = evaluate_runners(&snapshot);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].alert_type, AlertType::RunnerOffline);
        assert_eq!(requests[0].details["runner"], "ci-2");

        assert!(evaluate_runners(&RunnerSnapshot::empty()).is_empty());
    }
}
