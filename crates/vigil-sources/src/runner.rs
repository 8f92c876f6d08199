use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use vigil_types::RunnerState;

use crate::SourceError;

/// CI runner 目录
#[async_trait]
pub trait RunnerDirectory: Send + Sync {
    async fn list_runners(&self) -> Result<Vec<RunnerState>, SourceError>;
}

/// GitHub 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub repo: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner: String::new(),
            repo: String::new(),
            api_base: default_api_base(),
        }
    }
}

impl GitHubConfig {
    pub fn is_configured(&self) -> bool {
        !self.token.trim().is_empty()
            && !self.owner.trim().is_empty()
            && !self.repo.trim().is_empty()
    }

    fn runners_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/actions/runners",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

#[derive(Debug, Deserialize)]
struct RunnersResponse {
    #[serde(default)]
    runners: Vec<GitHubRunner>,
}

#[derive(Debug, Deserialize)]
struct GitHubRunner {
    id: u64,
    name: String,
    status: String,
    #[serde(default)]
    busy: bool,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
}

#[derive(Debug, Deserialize)]
struct GitHubLabel {
    name: String,
}

impl From<GitHubRunner> for RunnerState {
    fn from(runner: GitHubRunner) -> Self {
        RunnerState {
            id: runner.id,
            is_online: runner.status == "online",
            is_busy: runner.busy,
            labels: runner.labels.into_iter().map(|l| l.name).collect(),
            name: runner.name,
            status_text: runner.status,
        }
    }
}

/// GitHub Actions 自托管 runner 目录
pub struct GitHubRunnerDirectory {
    config: GitHubConfig,
    client: Client,
}

impl GitHubRunnerDirectory {
    pub fn new(config: GitHubConfig, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vigil/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl RunnerDirectory for GitHubRunnerDirectory {
    async fn list_runners(&self) -> Result<Vec<RunnerState>, SourceError> {
        if !self.config.is_configured() {
            warn!("GitHub configuration is incomplete, skipping runner check");
            return Ok(Vec::new());
        }

        let response = self
            .client
            .get(self.config.runners_url())
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("GitHub API error: {}", status);
            return Err(SourceError::Status(status.as_u16()));
        }

        let body: RunnersResponse = response.json().await?;
        let runners: Vec<RunnerState> = body.runners.into_iter().map(RunnerState::from).collect();

        debug!("GitHub runner check: found {} runners", runners.len());
        Ok(runners)
    }
}
