use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 告警级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Warning => "WARNING",
            AlertSeverity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 告警类型，冷却期按类型计算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    CpuHigh,
    RamHigh,
    DiskHigh,
    BatteryLow,
    RuntimeDown,
    ContainerDown,
    ContainerRestarting,
    RunnerOffline,
}

impl AlertType {
    pub const ALL: [AlertType; 8] = [
        AlertType::CpuHigh,
        AlertType::RamHigh,
        AlertType::DiskHigh,
        AlertType::BatteryLow,
        AlertType::RuntimeDown,
        AlertType::ContainerDown,
        AlertType::ContainerRestarting,
        AlertType::RunnerOffline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::CpuHigh => "CPU_HIGH",
            AlertType::RamHigh => "RAM_HIGH",
            AlertType::DiskHigh => "DISK_HIGH",
            AlertType::BatteryLow => "BATTERY_LOW",
            AlertType::RuntimeDown => "RUNTIME_DOWN",
            AlertType::ContainerDown => "CONTAINER_DOWN",
            AlertType::ContainerRestarting => "CONTAINER_RESTARTING",
            AlertType::RunnerOffline => "RUNNER_OFFLINE",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 评估器产出的告警请求，尚未分配 ID 与时间戳
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub details: BTreeMap<String, serde_json::Value>,
}

impl AlertRequest {
    pub fn new(alert_type: AlertType, severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            alert_type,
            severity,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// 告警实例
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub details: BTreeMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
}

impl Alert {
    pub fn from_request(request: AlertRequest, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            alert_type: request.alert_type,
            severity: request.severity,
            message: request.message,
            details: request.details,
            timestamp,
            acknowledged: false,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity == AlertSeverity::Critical
    }
}
