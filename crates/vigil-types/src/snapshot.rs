use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 被监控但运行时中不存在的容器所使用的状态值
pub const NOT_FOUND_STATE: &str = "not-found";

/// 主机资源快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub cpu_usage_pct: f64,
    pub ram_usage_pct: f64,
    pub ram_used_bytes: u64,
    pub ram_total_bytes: u64,
    pub disk_usage_pct: f64,
    pub disk_used_bytes: u64,
    pub disk_total_bytes: u64,
    /// 电池电量，与 `power_connected` 同时存在或同时缺失
    pub battery_pct: Option<u8>,
    pub power_connected: Option<bool>,
    pub timestamp: DateTime<Utc>,
}

impl ResourceSnapshot {
    /// 不含电池信息的快照
    pub fn new(
        cpu_usage_pct: f64,
        (ram_used_bytes, ram_total_bytes): (u64, u64),
        (disk_used_bytes, disk_total_bytes): (u64, u64),
    ) -> Self {
        Self {
            cpu_usage_pct: clamp_pct(cpu_usage_pct),
            ram_usage_pct: usage_pct(ram_used_bytes, ram_total_bytes),
            ram_used_bytes,
            ram_total_bytes,
            disk_usage_pct: usage_pct(disk_used_bytes, disk_total_bytes),
            disk_used_bytes,
            disk_total_bytes,
            battery_pct: None,
            power_connected: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_battery(mut self, pct: u8, power_connected: bool) -> Self {
        self.battery_pct = Some(pct.min(100));
        self.power_connected = Some(power_connected);
        self
    }

    /// 电池电量与供电状态
    pub fn battery(&self) -> Option<(u8, bool)> {
        match (self.battery_pct, self.power_connected) {
            (Some(pct), Some(connected)) => Some((pct, connected)),
            _ => None,
        }
    }
}

fn clamp_pct(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

fn usage_pct(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    clamp_pct(used as f64 / total as f64 * 100.0)
}

/// 单个容器状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerState {
    pub name: String,
    pub id: String,
    pub runtime_state: String,
    pub status_text: String,
    pub is_running: bool,
    pub is_restarting: bool,
    pub restart_count: u32,
}

impl ContainerState {
    /// 期望存在但运行时从未创建的容器
    pub fn not_found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: NOT_FOUND_STATE.to_string(),
            runtime_state: NOT_FOUND_STATE.to_string(),
            status_text: "Container not found".to_string(),
            is_running: false,
            is_restarting: false,
            restart_count: 0,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.runtime_state == NOT_FOUND_STATE
    }

    /// 已被创建但当前未运行
    pub fn is_stopped(&self) -> bool {
        !self.is_running && !self.is_missing()
    }
}

/// 容器运行时快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSnapshot {
    pub daemon_reachable: bool,
    pub containers: Vec<ContainerState>,
    pub timestamp: DateTime<Utc>,
}

impl RuntimeSnapshot {
    pub fn reachable(containers: Vec<ContainerState>) -> Self {
        Self {
            daemon_reachable: true,
            containers,
            timestamp: Utc::now(),
        }
    }

    /// 守护进程不可达时容器列表恒为空
    pub fn unreachable() -> Self {
        Self {
            daemon_reachable: false,
            containers: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

/// CI Runner 状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerState {
    pub id: u64,
    pub name: String,
    pub status_text: String,
    pub is_online: bool,
    pub is_busy: bool,
    pub labels: Vec<String>,
}

/// CI Runner 快照，空列表表示“无数据”
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSnapshot {
    pub runners: Vec<RunnerState>,
    pub timestamp: DateTime<Utc>,
}

impl RunnerSnapshot {
    pub fn new(runners: Vec<RunnerState>) -> Self {
        Self {
            runners,
            timestamp: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}
