use crate::message::NotifyMessage;
use async_trait::async_trait;

/// 通知错误
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response status: {0}")]
    Status(u16),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// 通知渠道接口
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &NotifyMessage) -> Result<(), NotifierError>;

    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool {
        true
    }
}
