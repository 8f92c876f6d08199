use chrono::{DateTime, Utc};
use std::time::Duration;
use vigil_types::{
    Alert, AlertSeverity, OverallStatus, ResourceSnapshot, RunnerSnapshot, RuntimeSnapshot,
};

/// 聚合所需的输入视图
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthInputs<'a> {
    pub resources: Option<&'a ResourceSnapshot>,
    pub runtime: Option<&'a RuntimeSnapshot>,
    pub runners: Option<&'a RunnerSnapshot>,
    pub alerts: &'a [Alert],
}

/// 健康状态聚合器，每次查询重新计算
#[derive(Debug, Clone, Copy)]
pub struct HealthAggregator {
    recency_window: chrono::Duration,
}

impl HealthAggregator {
    pub fn new(recency_window: Duration) -> Self {
        Self {
            recency_window: chrono::Duration::from_std(recency_window)
                .unwrap_or(chrono::Duration::MAX),
        }
    }

    /// 自上而下，首个命中的规则生效
    pub fn evaluate(&self, inputs: &HealthInputs<'_>, now: DateTime<Utc>) -> OverallStatus {
        let since = now
            .checked_sub_signed(self.recency_window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let recent = |severity: AlertSeverity| {
            inputs
                .alerts
                .iter()
                .any(|a| a.severity == severity && a.timestamp > since)
        };

        if recent(AlertSeverity::Critical) {
            return OverallStatus::Critical;
        }

        if let Some(runtime) = inputs.runtime {
            if !runtime.daemon_reachable {
                return OverallStatus::Critical;
            }
            if runtime.containers.iter().any(|c| c.is_stopped()) {
                return OverallStatus::Critical;
            }
        }

        if let Some(runners) = inputs.runners {
            if runners.runners.iter().any(|r| !r.is_online) {
                return OverallStatus::Critical;
            }
        }

        if recent(AlertSeverity::Warning) {
            return OverallStatus::Warning;
        }

        if inputs.resources.is_none() && inputs.runtime.is_none() {
            return OverallStatus::Unknown;
        }

        OverallStatus::Healthy
    }
}

impl Default for HealthAggregator {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}
