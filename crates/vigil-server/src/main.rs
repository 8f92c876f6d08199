use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vigil_config::{ConfigLoader, LoggingConfig, VigilConfig};
use vigil_metrics::{AlertDispatcher, DispatcherConfig};
use vigil_notify::{notify_channel, NotifyManager, SlackNotifier, WebhookNotifier};
use vigil_server::{
    create_router, metrics, AppState, HealthMonitor, MonitorSettings, SignalHandler, Sources,
};
use vigil_sources::{DockerRuntimeClient, GitHubRunnerDirectory, SysinfoSampler};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "vigil.toml")]
    config: String,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_notify_manager(config: &VigilConfig) -> anyhow::Result<NotifyManager> {
    let mut manager = NotifyManager::new();
    manager.register(Box::new(SlackNotifier::new(config.slack.clone())?));
    if let Some(webhook) = &config.webhook {
        manager.register(Box::new(WebhookNotifier::new(webhook.clone())?));
    }
    Ok(manager)
}

fn build_sources(config: &VigilConfig) -> anyhow::Result<Sources> {
    let runtime = DockerRuntimeClient::connect(&config.docker)
        .context("Failed to create Docker client")?;
    let runners =
        GitHubRunnerDirectory::new(config.github.clone(), config.intervals.collaborator_timeout())
            .context("Failed to create GitHub client")?;

    Ok(Sources {
        resources: Arc::new(SysinfoSampler::new()),
        runtime: Arc::new(runtime),
        runners: Arc::new(runners),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = ConfigLoader::new(&args.config);
    let config = loader
        .load_validated()
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    init_tracing(&config.logging);

    if args.check {
        info!("Configuration {} is valid", loader.path().display());
        return Ok(());
    }

    info!("Starting vigil with config: {}", args.config);

    if let Some(listen) = &config.telemetry.listen {
        let addr: SocketAddr = listen
            .parse()
            .with_context(|| format!("Invalid telemetry.listen address: {}", listen))?;
        metrics::init_metrics(addr)?;
    }

    let manager = Arc::new(build_notify_manager(&config)?);
    let (queue, worker) = notify_channel(config.alerts.notify_queue, manager);

    let dispatcher = Arc::new(AlertDispatcher::new(
        DispatcherConfig {
            cooldown: config.alerts.cooldown(),
            history_size: config.alerts.history_size,
        },
        queue,
    ));

    let monitor = Arc::new(HealthMonitor::new(
        build_sources(&config)?,
        MonitorSettings::from(&config),
        dispatcher,
    ));

    let shutdown = SignalHandler::new();
    let worker_handle = tokio::spawn(worker.run_until(shutdown.cancelled()));
    let pollers = monitor.spawn(&shutdown);

    let signals = shutdown.clone();
    tokio::spawn(async move {
        signals.wait_for_system_signal().await;
    });

    let addr: SocketAddr = config
        .server
        .bind_addr()
        .parse()
        .with_context(|| format!("Invalid server address: {}", config.server.bind_addr()))?;
    let app = create_router(AppState::new(monitor));

    info!("Listening on {}", addr);
    axum::Server::try_bind(&addr)
        .with_context(|| format!("Failed to bind {}", addr))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown.cancelled())
        .await?;

    for poller in pollers {
        let _ = poller.await;
    }
    let _ = worker_handle.await;

    info!("vigil stopped");
    Ok(())
}
