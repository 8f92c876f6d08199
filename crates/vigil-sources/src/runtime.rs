use async_trait::async_trait;
use bollard::container::ListContainersOptions;
use bollard::models::ContainerSummary;
use bollard::{Docker, API_DEFAULT_VERSION};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use vigil_types::{ContainerState, RuntimeSnapshot};

use crate::SourceError;

lazy_static! {
    static ref RESTART_COUNT: Regex = Regex::new(r"Restart.*?(\d+)").expect("valid regex");
}

/// 容器运行时客户端
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    async fn inspect(&self) -> Result<RuntimeSnapshot, SourceError>;
}

/// Docker 连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerConfig {
    /// `auto` 使用本地默认连接（含 DOCKER_HOST），否则为 socket 路径或 tcp/http 地址
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub monitored_containers: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "auto".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            monitored_containers: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub struct DockerRuntimeClient {
    docker: Docker,
    monitored: Vec<String>,
}

impl DockerRuntimeClient {
    /// 建立客户端，此时不会发起任何请求
    pub fn connect(config: &DockerConfig) -> Result<Self, SourceError> {
        let host = config.host.trim();
        let docker = if host.is_empty() || host.eq_ignore_ascii_case("auto") {
            Docker::connect_with_local_defaults()?
        } else if host.starts_with("tcp://") || host.starts_with("http://") {
            Docker::connect_with_http(host, config.timeout_secs, API_DEFAULT_VERSION)?
        } else {
            Docker::connect_with_socket(host, config.timeout_secs, API_DEFAULT_VERSION)?
        };

        Ok(Self {
            docker,
            monitored: config.monitored_containers.clone(),
        })
    }
}

#[async_trait]
impl RuntimeClient for DockerRuntimeClient {
    async fn inspect(&self) -> Result<RuntimeSnapshot, SourceError> {
        if let Err(e) = self.docker.ping().await {
            error!("Docker daemon is not accessible: {}", e);
            return Ok(RuntimeSnapshot::unreachable());
        }

        let summaries = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                ..Default::default()
            }))
            .await?;

        let snapshot = build_snapshot(&summaries, &self.monitored);
        debug!(
            "Docker health check: daemon=running, containers={}",
            snapshot.containers.len()
        );
        Ok(snapshot)
    }
}

/// 按监控名单筛选容器，缺失的名称追加 not-found 条目
pub fn build_snapshot(summaries: &[ContainerSummary], monitored: &[String]) -> RuntimeSnapshot {
    let monitored_lower: Vec<String> = monitored.iter().map(|m| m.to_lowercase()).collect();

    let mut containers: Vec<ContainerState> = summaries
        .iter()
        .filter(|summary| {
            summary.names.as_ref().map_or(false, |names| {
                names.iter().any(|name| {
                    let name = name.to_lowercase();
                    monitored_lower.iter().any(|m| name.contains(m.as_str()))
                })
            })
        })
        .map(to_container_state)
        .collect();

    let found: Vec<String> = containers.iter().map(|c| c.name.to_lowercase()).collect();
    let missing: Vec<ContainerState> = monitored
        .iter()
        .zip(&monitored_lower)
        .filter(|(_, lower)| !found.iter().any(|f| f.contains(lower.as_str())))
        .map(|(name, _)| ContainerState::not_found(name.clone()))
        .collect();
    containers.extend(missing);

    RuntimeSnapshot::reachable(containers)
}

fn to_container_state(summary: &ContainerSummary) -> ContainerState {
    let name = summary
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let id = summary
        .id
        .as_deref()
        .map(|id| id.chars().take(12).collect())
        .unwrap_or_else(|| "unknown".to_string());
    let state = summary.state.clone().unwrap_or_else(|| "unknown".to_string());
    let status = summary.status.clone().unwrap_or_else(|| "unknown".to_string());

    ContainerState {
        is_running: state == "running",
        is_restarting: state == "restarting",
        restart_count: parse_restart_count(&status),
        name,
        id,
        runtime_state: state,
        status_text: status,
    }
}

/// 从状态文本中解析重启次数，缺失时为 0
pub fn parse_restart_count(status: &str) -> u32 {
    RESTART_COUNT
        .captures(status)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str, id: &str, state: &str, status: &str) -> ContainerSummary {
        ContainerSummary {
            names: Some(vec![format!("/{}", name)]),
            id: Some(id.to_string()),
            state: Some(state.to_string()),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_restart_count() {
        assert_eq!(parse_restart_count("Restarting (1) 5 seconds ago"), 1);
        assert_eq!(parse_restart_count("Up 2 hours (Restarts: 7)"), 7);
        assert_eq!(parse_restart_count("Up 2 hours"), 0);
        assert_eq!(parse_restart_count(""), 0);
    }

    #[test]
    fn test_build_snapshot_filters_and_maps() {
        let summaries = vec![
            summary("api-server", "0123456789abcdef", "running", "Up 3 hours"),
            summary("unrelated", "fedcba9876543210", "running", "Up 1 hour"),
            summary("Worker-1", "aaaaaaaaaaaaaaaa", "restarting", "Restarting (3) 2 seconds ago"),
        ];
        let monitored = vec!["api".to_string(), "worker".to_string()];

        let snapshot = build_snapshot(&summaries, &monitored);

        assert!(snapshot.daemon_reachable);
        assert_eq!(snapshot.containers.len(), 2);

        let api = &snapshot.containers[0];
        assert_eq!(api.name, "api-server");
        assert_eq!(api.id, "0123456789ab");
        assert!(api.is_running);
        assert!(!api.is_restarting);

        let worker = &snapshot.containers[1];
        assert_eq!(worker.name, "Worker-1");
        assert!(worker.is_restarting);
        assert_eq!(worker.restart_count, 3);
    }

    #[test]
    fn test_build_snapshot_appends_missing() {
        let summaries = vec![summary("db", "1111111111111111", "exited", "Exited (0) 1 hour ago")];
        let monitored = vec!["db".to_string(), "cache".to_string()];

        let snapshot = build_snapshot(&summaries, &monitored);

        assert_eq!(snapshot.containers.len(), 2);
        assert!(snapshot.containers[0].is_stopped());
        let missing = &snapshot.containers[1];
        assert_eq!(missing.name, "cache");
        assert!(missing.is_missing());
        assert_eq!(missing.status_text, "Container not found");
    }

    #[test]
    fn test_build_snapshot_without_monitored_names() {
        let summaries = vec![summary("db", "1111111111111111", "running", "Up")];
        let snapshot = build_snapshot(&summaries, &[]);
        assert!(snapshot.daemon_reachable);
        assert!(snapshot.containers.is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = DockerConfig::default();
        assert_eq!(config.host, "auto");
        assert!(config.monitored_containers.is_empty());
    }
}
