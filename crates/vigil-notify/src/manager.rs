use crate::message::NotifyMessage;
use crate::notifier::Notifier;
use tracing::{debug, error, info};

/// 通知管理器
pub struct NotifyManager {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifyManager {
    pub fn new() -> Self {
        Self {
            notifiers: Vec::new(),
        }
    }

    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        info!(
            "Registered notifier: {} (enabled: {})",
            notifier.name(),
            notifier.is_enabled()
        );
        self.notifiers.push(notifier);
    }

    /// 发送到所有启用的渠道，失败只记录日志，返回成功数
    pub async fn broadcast(&self, message: &NotifyMessage) -> usize {
        let mut delivered = 0;

        for notifier in self.notifiers.iter().filter(|n| n.is_enabled()) {
            match notifier.send(message).await {
                Ok(()) => {
                    delivered += 1;
                    debug!("Notification sent via {}: {}", notifier.name(), message.title);
                }
                Err(e) => {
                    error!(
                        "Failed to send notification via {} for alert {}: {}",
                        notifier.name(),
                        message.alert_id,
                        e
                    );
                }
            }
        }

        delivered
    }

    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }

    pub fn enabled_count(&self) -> usize {
        self.notifiers.iter().filter(|n| n.is_enabled()).count()
    }
}

impl Default for NotifyManager {
    fn default() -> Self {
        Self::new()
    }
}
