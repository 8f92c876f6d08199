use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

use crate::VigilConfig;

const DEFAULT_ENV_PREFIX: &str = "VIGIL";

/// 冷却期与近期窗口的上限（30 天）
const MAX_WINDOW_SECS: u64 = 30 * 24 * 60 * 60;

/// 配置加载器
///
/// 优先级：内置默认值 < TOML 文件 < 环境变量（`VIGIL__SECTION__KEY`）
pub struct ConfigLoader {
    path: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// 创建配置加载器，文件不存在时只使用默认值和环境变量
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载配置
    pub fn load(&self) -> Result<VigilConfig> {
        let path = self
            .path
            .to_str()
            .ok_or_else(|| anyhow!("Invalid config path: {}", self.path.display()))?;

        let config = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("docker.monitored_containers")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// 加载并验证
    pub fn load_validated(&self) -> Result<VigilConfig> {
        let config = self.load()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// 验证配置
    pub fn validate(config: &VigilConfig) -> Result<()> {
        let intervals = [
            ("intervals.resource_secs", config.intervals.resource_secs),
            ("intervals.runtime_secs", config.intervals.runtime_secs),
            ("intervals.runner_secs", config.intervals.runner_secs),
            (
                "intervals.collaborator_timeout_secs",
                config.intervals.collaborator_timeout_secs,
            ),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(anyhow!("{} must be greater than 0", name));
            }
        }

        if config.alerts.history_size == 0 {
            return Err(anyhow!("alerts.history_size must be greater than 0"));
        }

        let windows = [
            ("alerts.cooldown_secs", config.alerts.cooldown_secs),
            ("alerts.recency_window_secs", config.alerts.recency_window_secs),
        ];
        for (name, value) in windows {
            if value > MAX_WINDOW_SECS {
                return Err(anyhow!(
                    "{} ({}) must not exceed {}",
                    name,
                    value,
                    MAX_WINDOW_SECS
                ));
            }
        }

        if config.retention.minutes == 0 {
            return Err(anyhow!("retention.minutes must be greater than 0"));
        }

        let thresholds = [
            ("thresholds.cpu", config.thresholds.cpu),
            ("thresholds.ram", config.thresholds.ram),
            ("thresholds.disk", config.thresholds.disk),
            ("thresholds.battery", config.thresholds.battery),
        ];
        for (name, value) in thresholds {
            if !(0.0..=100.0).contains(&value) {
                return Err(anyhow!("{} ({}) must be within [0, 100]", name, value));
            }
        }

        Ok(())
    }
}
