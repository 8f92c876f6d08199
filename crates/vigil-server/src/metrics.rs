use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use vigil_types::{AlertType, ResourceSnapshot};

/// 初始化 Prometheus metrics exporter
pub fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_metrics();

    tracing::info!("Metrics exporter started on http://{}/metrics", addr);
    Ok(())
}

fn describe_metrics() {
    // 采集
    describe_counter!("vigil_polls_total", "Total number of source polls");
    describe_counter!(
        "vigil_poll_failures_total",
        "Polls skipped because the source failed or timed out"
    );
    describe_histogram!(
        "vigil_poll_duration_seconds",
        "Source poll duration in seconds"
    );

    // 告警
    describe_counter!("vigil_alerts_raised_total", "Total number of accepted alerts");
    describe_counter!(
        "vigil_alerts_suppressed_total",
        "Alerts dropped by the per-type cooldown"
    );

    // 主机资源
    describe_gauge!("vigil_cpu_usage_pct", "Latest sampled CPU usage percent");
    describe_gauge!("vigil_ram_usage_pct", "Latest sampled RAM usage percent");
    describe_gauge!("vigil_disk_usage_pct", "Latest sampled disk usage percent");
}

/// 记录一次采集
pub fn record_poll(source: &'static str, duration_secs: f64) {
    counter!("vigil_polls_total", 1, "source" => source);
    histogram!("vigil_poll_duration_seconds", duration_secs, "source" => source);
}

/// 记录采集失败
pub fn record_poll_failure(source: &'static str) {
    counter!("vigil_poll_failures_total", 1, "source" => source);
}

pub fn record_alert_raised(alert_type: AlertType) {
    counter!("vigil_alerts_raised_total", 1, "type" => alert_type.as_str());
}

pub fn record_alert_suppressed(alert_type: AlertType) {
    counter!("vigil_alerts_suppressed_total", 1, "type" => alert_type.as_str());
}

/// 更新主机资源 gauge
pub fn set_resource_usage(snapshot: &ResourceSnapshot) {
    gauge!("vigil_cpu_usage_pct", snapshot.cpu_usage_pct);
    gauge!("vigil_ram_usage_pct", snapshot.ram_usage_pct);
    gauge!("vigil_disk_usage_pct", snapshot.disk_usage_pct);
}
