use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use vigil_notify::{NotifyMessage, NotifyQueue};
use vigil_types::{Alert, AlertRequest, AlertType};

use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// 同类型告警的最小间隔
    pub cooldown: Duration,
    pub history_size: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(300),
            history_size: 100,
        }
    }
}

struct DispatcherState {
    history: VecDeque<Alert>,
    last_accepted: HashMap<AlertType, DateTime<Utc>>,
}

/// 告警分发器
///
/// 冷却判断、冷却记录与历史写入在同一把锁内完成，
/// 并发的同类型 `raise` 最多只有一个被接受。
pub struct AlertDispatcher {
    state: Mutex<DispatcherState>,
    cooldown: chrono::Duration,
    history_size: usize,
    clock: Arc<dyn Clock>,
    notify: NotifyQueue,
}

impl AlertDispatcher {
    pub fn new(config: DispatcherConfig, notify: NotifyQueue) -> Self {
        let history_size = config.history_size.max(1);
        Self {
            state: Mutex::new(DispatcherState {
                history: VecDeque::with_capacity(history_size),
                last_accepted: HashMap::new(),
            }),
            cooldown: chrono::Duration::from_std(config.cooldown).unwrap_or(chrono::Duration::MAX),
            history_size,
            clock: Arc::new(SystemClock),
            notify,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 冷却期内返回 `None`
    pub async fn raise(&self, request: AlertRequest) -> Option<Alert> {
        let alert = {
            let mut state = self.state.lock().await;
            let now = self.clock.now();

            if let Some(last) = state.last_accepted.get(&request.alert_type) {
                if now.signed_duration_since(*last) < self.cooldown {
                    debug!("Alert suppressed (cooldown): {}", request.alert_type);
                    return None;
                }
            }

            let alert = Alert::from_request(request, now);
            state.history.push_front(alert.clone());
            state.history.truncate(self.history_size);
            state.last_accepted.insert(alert.alert_type, now);
            alert
        };

        info!(
            "Alert raised: [{}] {} - {}",
            alert.severity, alert.alert_type, alert.message
        );
        self.notify.enqueue(NotifyMessage::from(&alert));

        Some(alert)
    }

    /// 确认告警，不影响历史顺序与冷却
    pub async fn acknowledge(&self, alert_id: &str) -> bool {
        let mut state = self.state.lock().await;

        match state.history.iter_mut().find(|a| a.id == alert_id) {
            Some(alert) => {
                if !alert.acknowledged {
                    alert.acknowledged = true;
                    info!("Alert acknowledged: {} ({})", alert.id, alert.alert_type);
                }
                true
            }
            None => {
                debug!("Acknowledge requested for unknown alert: {}", alert_id);
                false
            }
        }
    }

    /// 最新的在前
    pub async fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        let state = self.state.lock().await;
        state.history.iter().take(limit).cloned().collect()
    }

    pub async fn all_alerts(&self) -> Vec<Alert> {
        let state = self.state.lock().await;
        state.history.iter().cloned().collect()
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }

    /// 分发器所用时钟的当前时间
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use vigil_notify::{notify_channel, NotifyManager};
    use vigil_types::AlertSeverity;

    fn dispatcher(cooldown_secs: u64, history_size: usize) -> (AlertDispatcher, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let dispatcher = AlertDispatcher::new(
            DispatcherConfig {
                cooldown: Duration::from_secs(cooldown_secs),
                history_size,
            },
            NotifyQueue::detached(),
        )
        .with_clock(clock.clone());
        (dispatcher, clock)
    }

    fn request(alert_type: AlertType) -> AlertRequest {
        AlertRequest::new(alert_type, AlertSeverity::Warning, format!("{} fired", alert_type))
    }

    #[tokio::test]
    async fn test_cooldown_suppresses_same_type() {
        let (dispatcher, clock) = dispatcher(300, 100);

        assert!(dispatcher.raise(request(AlertType::CpuHigh)).await.is_some());
        clock.advance(Duration::from_secs(299));
        assert!(dispatcher.raise(request(AlertType::CpuHigh)).await.is_none());

        assert_eq!(dispatcher.all_alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cooldown_expires() {
        let (dispatcher, clock) = dispatcher(300, 100);

        assert!(dispatcher.raise(request(AlertType::CpuHigh)).await.is_some());
        clock.advance(Duration::from_secs(301));
        assert!(dispatcher.raise(request(AlertType::CpuHigh)).await.is_some());

        assert_eq!(dispatcher.all_alerts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_oversized_cooldown_still_suppresses() {
        let clock = Arc::new(ManualClock::default());
        let dispatcher = AlertDispatcher::new(
            DispatcherConfig {
                cooldown: Duration::from_secs(u64::MAX),
                history_size: 10,
            },
            NotifyQueue::detached(),
        )
        .with_clock(clock.clone());

        assert!(dispatcher.raise(request(AlertType::CpuHigh)).await.is_some());
        clock.advance(Duration::from_secs(365 * 24 * 60 * 60));
        assert!(dispatcher.raise(request(AlertType::CpuHigh)).await.is_none());
        assert_eq!(dispatcher.all_alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cooldown_is_per_type() {
        let (dispatcher, _clock) = dispatcher(300, 100);

        assert!(dispatcher.raise(request(AlertType::CpuHigh)).await.is_some());
        assert!(dispatcher.raise(request(AlertType::RamHigh)).await.is_some());

        // 不同容器共享同一类型的冷却
        let db = AlertRequest::new(AlertType::ContainerDown, AlertSeverity::Critical, "db")
            .with_detail("container", "db");
        let api = AlertRequest::new(AlertType::ContainerDown, AlertSeverity::Critical, "api")
            .with_detail("container", "api");
        assert!(dispatcher.raise(db).await.is_some());
        assert!(dispatcher.raise(api).await.is_none());

        assert_eq!(dispatcher.all_alerts().await.len(), 3);
    }

    #[tokio::test]
    async fn test_suppressed_raise_does_not_extend_cooldown() {
        let (dispatcher, clock) = dispatcher(300, 100);

        dispatcher.raise(request(AlertType::DiskHigh)).await;
        clock.advance(Duration::from_secs(200));
        assert!(dispatcher.raise(request(AlertType::DiskHigh)).await.is_none());
        clock.advance(Duration::from_secs(101));
        assert!(dispatcher.raise(request(AlertType::DiskHigh)).await.is_some());
    }

    #[tokio::test]
    async fn test_history_is_bounded_newest_first() {
        let (dispatcher, clock) = dispatcher(1, 3);

        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(dispatcher.raise(request(AlertType::CpuHigh)).await.unwrap().id);
            clock.advance(Duration::from_secs(2));
        }

        let alerts = dispatcher.all_alerts().await;
        let stored: Vec<String> = alerts.iter().map(|a| a.id.clone()).collect();
        assert_eq!(stored, vec![ids[4].clone(), ids[3].clone(), ids[2].clone()]);

        let recent = dispatcher.recent_alerts(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, ids[4]);
    }

    #[tokio::test]
    async fn test_acknowledge() {
        let (dispatcher, _clock) = dispatcher(300, 100);
        let first = dispatcher.raise(request(AlertType::CpuHigh)).await.unwrap();
        let second = dispatcher.raise(request(AlertType::RamHigh)).await.unwrap();

        assert!(dispatcher.acknowledge(&first.id).await);
        assert!(dispatcher.acknowledge(&first.id).await);

        let alerts = dispatcher.all_alerts().await;
        assert_eq!(alerts[0].id, second.id);
        assert_eq!(alerts[1].id, first.id);
        assert!(alerts[1].acknowledged);
        assert!(!alerts[0].acknowledged);

        // 确认不影响冷却
        assert!(dispatcher.raise(request(AlertType::CpuHigh)).await.is_none());
    }

    #[tokio::test]
    async fn test_acknowledge_unknown_id() {
        let (dispatcher, _clock) = dispatcher(300, 100);
        dispatcher.raise(request(AlertType::CpuHigh)).await;
        dispatcher.raise(request(AlertType::RamHigh)).await;
        let before = dispatcher.all_alerts().await;

        assert!(!dispatcher.acknowledge("does-not-exist").await);
        assert_eq!(dispatcher.all_alerts().await, before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_raise_accepts_once() {
        let (dispatcher, _clock) = dispatcher(300, 100);
        let dispatcher = Arc::new(dispatcher);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.raise(request(AlertType::RunnerOffline)).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(dispatcher.all_alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_accepted_alert_is_enqueued() {
        let (queue, worker) = notify_channel(1, Arc::new(NotifyManager::new()));
        let dispatcher = AlertDispatcher::new(DispatcherConfig::default(), queue);

        assert!(dispatcher.raise(request(AlertType::CpuHigh)).await.is_some());
        // 队列已满也不影响记录
        assert!(dispatcher.raise(request(AlertType::RamHigh)).await.is_some());
        assert_eq!(dispatcher.all_alerts().await.len(), 2);
        drop(worker);
    }
}
