use crate::manager::NotifyManager;
use crate::message::NotifyMessage;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

/// 创建通知队列与消费者
pub fn notify_channel(capacity: usize, manager: Arc<NotifyManager>) -> (NotifyQueue, NotifyWorker) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (NotifyQueue { tx: Some(tx) }, NotifyWorker { rx, manager })
}

/// 通知投递句柄，入队永不阻塞
#[derive(Clone, Debug)]
pub struct NotifyQueue {
    tx: Option<mpsc::Sender<NotifyMessage>>,
}

impl NotifyQueue {
    /// 不投递任何通知的队列
    pub fn detached() -> Self {
        Self { tx: None }
    }

    /// 返回消息是否进入队列
    pub fn enqueue(&self, message: NotifyMessage) -> bool {
        let Some(tx) = &self.tx else {
            debug!("Notification skipped (no sink attached): {}", message.title);
            return false;
        };

        match tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                warn!(
                    "Notification queue full, dropping notification for alert {}",
                    message.alert_id
                );
                false
            }
            Err(TrySendError::Closed(message)) => {
                warn!(
                    "Notification worker stopped, dropping notification for alert {}",
                    message.alert_id
                );
                false
            }
        }
    }
}

/// 通知队列消费者
pub struct NotifyWorker {
    rx: mpsc::Receiver<NotifyMessage>,
    manager: Arc<NotifyManager>,
}

impl NotifyWorker {
    /// 消费直到所有队列句柄被释放
    pub async fn run(self) {
        self.run_until(std::future::pending()).await
    }

    /// 消费直到 `shutdown` 完成或队列关闭
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Notification worker started with {} enabled notifier(s)",
            self.manager.enabled_count()
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                message = self.rx.recv() => {
                    let Some(message) = message else { break };
                    self.manager.broadcast(&message).await;
                }
                _ = &mut shutdown => {
                    info!("Notification worker received shutdown");
                    break;
                }
            }
        }

        info!("Notification worker stopped");
    }
}
