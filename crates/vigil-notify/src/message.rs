use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vigil_types::{Alert, AlertSeverity};

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyLevel {
    Warning,
    Critical,
}

impl From<AlertSeverity> for NotifyLevel {
    fn from(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Warning => NotifyLevel::Warning,
            AlertSeverity::Critical => NotifyLevel::Critical,
        }
    }
}

/// 通知消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyMessage {
    pub alert_id: String,
    /// 告警类型名，如 `CPU_HIGH`
    pub title: String,
    pub content: String,
    pub level: NotifyLevel,
    pub timestamp: DateTime<Utc>,
    pub fields: BTreeMap<String, String>,
}

impl From<&Alert> for NotifyMessage {
    fn from(alert: &Alert) -> Self {
        let fields = alert
            .details
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect();

        Self {
            alert_id: alert.id.clone(),
            title: alert.alert_type.to_string(),
            content: alert.message.clone(),
            level: alert.severity.into(),
            timestamp: alert.timestamp,
            fields,
        }
    }
}
