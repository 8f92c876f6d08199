use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use vigil_metrics::Thresholds;
pub use vigil_notify::{SlackConfig, WebhookConfig};
pub use vigil_sources::{DockerConfig, GitHubConfig};

/// 全局配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VigilConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub telemetry: TelemetryConfig,
    pub intervals: IntervalConfig,
    pub alerts: AlertConfig,
    pub retention: RetentionConfig,
    pub thresholds: Thresholds,
    pub slack: SlackConfig,
    pub webhook: Option<WebhookConfig>,
    pub github: GitHubConfig,
    pub docker: DockerConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `text` 或 `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Prometheus 导出配置，未设置监听地址时不启动
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub listen: Option<String>,
}

/// 采集周期（秒）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntervalConfig {
    #[serde(default = "default_resource_secs")]
    pub resource_secs: u64,
    #[serde(default = "default_runtime_secs")]
    pub runtime_secs: u64,
    #[serde(default = "default_runner_secs")]
    pub runner_secs: u64,
    /// 单次调用外部数据源的超时
    #[serde(default = "default_collaborator_timeout_secs")]
    pub collaborator_timeout_secs: u64,
}

fn default_resource_secs() -> u64 {
    60
}

fn default_runtime_secs() -> u64 {
    30
}

fn default_runner_secs() -> u64 {
    300
}

fn default_collaborator_timeout_secs() -> u64 {
    10
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            resource_secs: default_resource_secs(),
            runtime_secs: default_runtime_secs(),
            runner_secs: default_runner_secs(),
            collaborator_timeout_secs: default_collaborator_timeout_secs(),
        }
    }
}

impl IntervalConfig {
    pub fn resource(&self) -> Duration {
        Duration::from_secs(self.resource_secs)
    }

    pub fn runtime(&self) -> Duration {
        Duration::from_secs(self.runtime_secs)
    }

    pub fn runner(&self) -> Duration {
        Duration::from_secs(self.runner_secs)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborator_timeout_secs)
    }
}

/// 告警配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertConfig {
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default = "default_recency_window_secs")]
    pub recency_window_secs: u64,
    #[serde(default = "default_notify_queue")]
    pub notify_queue: usize,
}

fn default_cooldown_secs() -> u64 {
    300
}

fn default_history_size() -> usize {
    100
}

fn default_recency_window_secs() -> u64 {
    300
}

fn default_notify_queue() -> usize {
    64
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            history_size: default_history_size(),
            recency_window_secs: default_recency_window_secs(),
            notify_queue: default_notify_queue(),
        }
    }
}

impl AlertConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn recency_window(&self) -> Duration {
        Duration::from_secs(self.recency_window_secs)
    }
}

/// 历史保留
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    #[serde(default = "default_retention_minutes")]
    pub minutes: u64,
    /// 容量计算时额外预留的条数
    #[serde(default = "default_retention_buffer")]
    pub buffer: usize,
}

fn default_retention_minutes() -> u64 {
    10
}

fn default_retention_buffer() -> usize {
    10
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            minutes: default_retention_minutes(),
            buffer: default_retention_buffer(),
        }
    }
}

impl RetentionConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.minutes * 60)
    }
}
