use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use vigil_config::VigilConfig;
use vigil_metrics::{
    evaluate_resources, evaluate_runners, evaluate_runtime, AlertDispatcher, HealthAggregator,
    HealthInputs, MetricHistory, Thresholds,
};
use vigil_sources::{ResourceSampler, RunnerDirectory, RuntimeClient, SourceError};
use vigil_types::{
    Alert, AlertRequest, AlertSummary, DashboardSummary, DockerSummary, OverallStatus,
    ResourceSnapshot, RunnerSnapshot, RunnerStats, RuntimeSnapshot, SystemHealth, SystemSummary,
};

use crate::metrics;
use crate::shutdown::SignalHandler;

/// `/health` 返回的最近告警数
pub const HEALTH_RECENT_ALERTS: usize = 10;
/// 摘要统计的告警窗口
pub const SUMMARY_ALERT_WINDOW: usize = 100;

/// 数据源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Resources,
    Runtime,
    Runners,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Resources => "resources",
            SourceKind::Runtime => "runtime",
            SourceKind::Runners => "runners",
        }
    }
}

/// 外部数据源
#[derive(Clone)]
pub struct Sources {
    pub resources: Arc<dyn ResourceSampler>,
    pub runtime: Arc<dyn RuntimeClient>,
    pub runners: Arc<dyn RunnerDirectory>,
}

/// 调度参数
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub resource_interval: Duration,
    pub runtime_interval: Duration,
    pub runner_interval: Duration,
    pub collaborator_timeout: Duration,
    pub retention: Duration,
    pub history_buffer: usize,
    pub recency_window: Duration,
    pub thresholds: Thresholds,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&VigilConfig::default())
    }
}

impl From<&VigilConfig> for MonitorSettings {
    fn from(config: &VigilConfig) -> Self {
        Self {
            resource_interval: config.intervals.resource(),
            runtime_interval: config.intervals.runtime(),
            runner_interval: config.intervals.runner(),
            collaborator_timeout: config.intervals.collaborator_timeout(),
            retention: config.retention.window(),
            history_buffer: config.retention.buffer,
            recency_window: config.alerts.recency_window(),
            thresholds: config.thresholds,
        }
    }
}

impl MonitorSettings {
    fn interval(&self, kind: SourceKind) -> Duration {
        match kind {
            SourceKind::Resources => self.resource_interval,
            SourceKind::Runtime => self.runtime_interval,
            SourceKind::Runners => self.runner_interval,
        }
    }
}

/// 健康监控调度器
///
/// 每个数据源一个独立循环，只写入自己的最新快照与历史，互不加锁。
pub struct HealthMonitor {
    sources: Sources,
    settings: MonitorSettings,
    dispatcher: Arc<AlertDispatcher>,
    aggregator: HealthAggregator,

    latest_resources: ArcSwapOption<ResourceSnapshot>,
    latest_runtime: ArcSwapOption<RuntimeSnapshot>,
    latest_runners: ArcSwapOption<RunnerSnapshot>,

    resource_history: MetricHistory<Arc<ResourceSnapshot>>,
    runtime_history: MetricHistory<Arc<RuntimeSnapshot>>,
    runner_history: MetricHistory<Arc<RunnerSnapshot>>,
}

impl HealthMonitor {
    pub fn new(sources: Sources, settings: MonitorSettings, dispatcher: Arc<AlertDispatcher>) -> Self {
        let (retention, buffer) = (settings.retention, settings.history_buffer);

        Self {
            resource_history: MetricHistory::for_retention(retention, settings.resource_interval, buffer),
            runtime_history: MetricHistory::for_retention(retention, settings.runtime_interval, buffer),
            runner_history: MetricHistory::for_retention(retention, settings.runner_interval, buffer),
            latest_resources: ArcSwapOption::empty(),
            latest_runtime: ArcSwapOption::empty(),
            latest_runners: ArcSwapOption::empty(),
            aggregator: HealthAggregator::new(settings.recency_window),
            sources,
            settings,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Arc<AlertDispatcher> {
        &self.dispatcher
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// 执行一次采集，失败时保留原有状态
    pub async fn poll(&self, kind: SourceKind) -> Result<(), SourceError> {
        match kind {
            SourceKind::Resources => self.poll_resources().await,
            SourceKind::Runtime => self.poll_runtime().await,
            SourceKind::Runners => self.poll_runners().await,
        }
    }

    pub async fn poll_resources(&self) -> Result<(), SourceError> {
        let snapshot = self
            .fetch(SourceKind::Resources, self.sources.resources.sample())
            .await?;
        let snapshot = Arc::new(snapshot);

        self.latest_resources.store(Some(snapshot.clone()));
        self.resource_history.push(snapshot.clone());
        metrics::set_resource_usage(&snapshot);

        self.raise_all(evaluate_resources(&snapshot, &self.settings.thresholds))
            .await;
        Ok(())
    }

    pub async fn poll_runtime(&self) -> Result<(), SourceError> {
        let snapshot = self
            .fetch(SourceKind::Runtime, self.sources.runtime.inspect())
            .await?;
        let snapshot = Arc::new(snapshot);

        self.latest_runtime.store(Some(snapshot.clone()));
        self.runtime_history.push(snapshot.clone());

        self.raise_all(evaluate_runtime(&snapshot)).await;
        Ok(())
    }

    pub async fn poll_runners(&self) -> Result<(), SourceError> {
        let runners = self
            .fetch(SourceKind::Runners, self.sources.runners.list_runners())
            .await?;
        let snapshot = Arc::new(RunnerSnapshot::new(runners));

        self.latest_runners.store(Some(snapshot.clone()));
        self.runner_history.push(snapshot.clone());

        self.raise_all(evaluate_runners(&snapshot)).await;
        Ok(())
    }

    async fn fetch<T, F>(&self, kind: SourceKind, call: F) -> Result<T, SourceError>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        let started = Instant::now();
        let timeout = self.settings.collaborator_timeout;

        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(timeout)),
        };
        metrics::record_poll(kind.as_str(), started.elapsed().as_secs_f64());

        match &result {
            Ok(_) => debug!("Polled {} in {:?}", kind.as_str(), started.elapsed()),
            Err(e) => {
                metrics::record_poll_failure(kind.as_str());
                warn!("Skipping {} poll: {}", kind.as_str(), e);
            }
        }
        result
    }

    async fn raise_all(&self, requests: Vec<AlertRequest>) {
        for request in requests {
            let alert_type = request.alert_type;
            match self.dispatcher.raise(request).await {
                Some(_) => metrics::record_alert_raised(alert_type),
                None => metrics::record_alert_suppressed(alert_type),
            }
        }
    }

    pub fn latest_resources(&self) -> Option<Arc<ResourceSnapshot>> {
        self.latest_resources.load_full()
    }

    pub fn latest_runtime(&self) -> Option<Arc<RuntimeSnapshot>> {
        self.latest_runtime.load_full()
    }

    pub fn latest_runners(&self) -> Option<Arc<RunnerSnapshot>> {
        self.latest_runners.load_full()
    }

    /// 最新的在前
    pub fn resource_history(&self) -> Vec<Arc<ResourceSnapshot>> {
        self.resource_history.snapshot_all()
    }

    pub fn runtime_history(&self) -> Vec<Arc<RuntimeSnapshot>> {
        self.runtime_history.snapshot_all()
    }

    pub fn runner_history(&self) -> Vec<Arc<RunnerSnapshot>> {
        self.runner_history.snapshot_all()
    }

    pub fn history_capacity(&self, kind: SourceKind) -> usize {
        match kind {
            SourceKind::Resources => self.resource_history.capacity(),
            SourceKind::Runtime => self.runtime_history.capacity(),
            SourceKind::Runners => self.runner_history.capacity(),
        }
    }

    fn overall_status(
        &self,
        resources: Option<&ResourceSnapshot>,
        runtime: Option<&RuntimeSnapshot>,
        runners: Option<&RunnerSnapshot>,
        alerts: &[Alert],
    ) -> OverallStatus {
        let inputs = HealthInputs {
            resources,
            runtime,
            runners,
            alerts,
        };
        self.aggregator.evaluate(&inputs, self.dispatcher.now())
    }

    /// 当前健康视图
    pub async fn current_health(&self) -> SystemHealth {
        let resources = self.latest_resources();
        let runtime = self.latest_runtime();
        let runners = self.latest_runners();
        let alerts = self.dispatcher.all_alerts().await;

        let overall_status = self.overall_status(
            resources.as_deref(),
            runtime.as_deref(),
            runners.as_deref(),
            &alerts,
        );

        SystemHealth {
            system: resources.as_deref().cloned(),
            docker: runtime.as_deref().cloned(),
            runners: runners.map(|r| r.runners.clone()).unwrap_or_default(),
            recent_alerts: alerts.into_iter().take(HEALTH_RECENT_ALERTS).collect(),
            overall_status,
            timestamp: self.dispatcher.now(),
        }
    }

    /// 仪表盘摘要
    pub async fn summary(&self) -> DashboardSummary {
        let resources = self.latest_resources();
        let runtime = self.latest_runtime();
        let runners = self.latest_runners();
        let alerts = self.dispatcher.all_alerts().await;

        let overall_status = self.overall_status(
            resources.as_deref(),
            runtime.as_deref(),
            runners.as_deref(),
            &alerts,
        );
        let window = &alerts[..alerts.len().min(SUMMARY_ALERT_WINDOW)];

        DashboardSummary {
            overall_status,
            system: resources.as_deref().map(SystemSummary::from),
            docker: DockerSummary::from_snapshot(runtime.as_deref()),
            runners: runners
                .as_deref()
                .map(|r| RunnerStats::from_runners(&r.runners))
                .unwrap_or_default(),
            alerts: AlertSummary::from_alerts(window),
            timestamp: self.dispatcher.now(),
        }
    }

    /// 启动三个采集循环，收到关闭信号后退出
    pub fn spawn(self: &Arc<Self>, shutdown: &SignalHandler) -> Vec<JoinHandle<()>> {
        [SourceKind::Resources, SourceKind::Runtime, SourceKind::Runners]
            .into_iter()
            .map(|kind| {
                let monitor = Arc::clone(self);
                let stop = shutdown.cancelled();
                tokio::spawn(async move { monitor.run_loop(kind, stop).await })
            })
            .collect()
    }

    async fn run_loop<F>(&self, kind: SourceKind, stop: F)
    where
        F: Future<Output = ()>,
    {
        let period = self.settings.interval(kind).max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(stop);

        info!("Started {} poller (interval {:?})", kind.as_str(), period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut stop => break,
            }
            // 进行中的采集同样响应关闭
            tokio::select! {
                _ = self.poll(kind) => {}
                _ = &mut stop => break,
            }
        }
        info!("Stopped {} poller", kind.as_str());
    }
}
