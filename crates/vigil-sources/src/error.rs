use std::time::Duration;
use thiserror::Error;

/// 数据源错误，调度器据此跳过本次采集
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Container runtime error: {0}")]
    Runtime(#[from] bollard::errors::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response status: {0}")]
    Status(u16),

    #[error("Sampling task failed: {0}")]
    Task(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<tokio::task::JoinError> for SourceError {
    fn from(err: tokio::task::JoinError) -> Self {
        SourceError::Task(err.to_string())
    }
}
