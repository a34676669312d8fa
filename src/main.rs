use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast;

use fridgewatch::api::{Classify, ClassifierClient};
use fridgewatch::camera::{DirectoryCamera, FakeCamera, FrameSource};
use fridgewatch::core::config::CameraSourceKind;
use fridgewatch::core::{logging, Config, HealthChecker};
use fridgewatch::monitoring::VerdictReporter;
use fridgewatch::session::{MonitorEvent, MonitorSession};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    logging::init_logging(&config.monitoring.log_level);

    tracing::info!("🧊 Fridgewatch monitor starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Classifier endpoint: {}", config.classifier.base_url);

    // Initialize health checker
    let health_checker = Arc::new(HealthChecker::new());

    // Start health check endpoint
    let health_clone = health_checker.clone();
    let health_port = config.monitoring.health_port;
    tokio::spawn(async move { start_health_server(health_clone, health_port).await });

    tracing::info!("✅ Health endpoint running on port {}", health_port);

    // Classifier client + reachability probe
    let classifier = Arc::new(ClassifierClient::new(config.classifier.clone())?);
    match classifier.ping().await {
        Ok(reachable) => {
            health_checker
                .update_component("classifier_api", reachable)
                .await;
        }
        Err(e) => {
            tracing::warn!("Classifier API unreachable: {}", e);
            health_checker.update_component("classifier_api", false).await;
        }
    }

    // Frame source
    let camera: Arc<dyn FrameSource> = match config.camera.source {
        CameraSourceKind::Fake => Arc::new(FakeCamera::new()),
        CameraSourceKind::Directory => {
            Arc::new(DirectoryCamera::new(config.camera.frame_dir.clone()))
        }
    };
    health_checker.update_component("camera", true).await;

    let classify: Arc<dyn Classify> = classifier.clone();
    let mut session = MonitorSession::new(config.clone(), camera, classify);

    start_presenter(&session);

    session.start().await?;
    health_checker.update_component("session_active", true).await;

    // Periodic status line
    let status_checker = health_checker.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            let status = status_checker.get_status().await;
            tracing::info!(
                "Monitor status: {} (uptime: {}s)",
                status.status,
                status.uptime_seconds
            );
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    session.stop().await?;
    health_checker
        .update_component("session_active", false)
        .await;

    Ok(())
}

/// Subscribes to the session's event bus and renders live samples,
/// failures, and window verdicts to the log.
fn start_presenter(session: &MonitorSession) {
    let reporter = VerdictReporter::new();
    let mut events = session.events().subscribe();
    let history = session.history();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(MonitorEvent::SampleRecorded {
                    label, confidence, ..
                }) => {
                    tracing::info!("🔎 Live: {} ({:.1}%)", label, confidence * 100.0);
                }
                Ok(MonitorEvent::ClassificationFailed { reason, .. }) => {
                    tracing::warn!("⚠️  Tick failed: {}", reason);
                }
                Ok(MonitorEvent::VerdictReady { verdict }) => {
                    tracing::info!("{}", reporter.format_verdict(&verdict));
                    tracing::info!("{}", reporter.format_history(&*history.read().await));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Presenter lagged, {} events skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

async fn start_health_server(health_checker: Arc<HealthChecker>, port: u16) {
    use warp::Filter;

    let health = warp::path("health")
        .and(warp::any().map(move || health_checker.clone()))
        .and_then(|checker: Arc<HealthChecker>| async move {
            let status = checker.get_status().await;
            Ok::<_, warp::Rejection>(warp::reply::json(&status))
        });

    warp::serve(health).run(([0, 0, 0, 0], port)).await;
}
