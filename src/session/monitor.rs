use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::events::{EventBus, MonitorEvent};
use super::inflight::{InflightGuard, InflightSlot};
use crate::api::classifier::Classify;
use crate::api::types::Prediction;
use crate::camera::FrameSource;
use crate::core::config::{Config, SamplingConfig};
use crate::monitoring::VerdictHistory;
use crate::verdict::{VoteAggregator, WindowPolicy};

const EVENT_BUS_CAPACITY: usize = 64;

/// One monitoring run: owns the frame source, the classifier client, the
/// vote aggregator and its window lifecycle, the verdict history, and the
/// sampling timers. Explicit `start`/`stop`; nothing here is process-wide.
pub struct MonitorSession {
    session_id: Uuid,
    config: Config,
    ctx: SamplerContext,
    cancel_token: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

/// Shared state cloned into the sampling loop and per-tick tasks.
#[derive(Clone)]
struct SamplerContext {
    session_id: Uuid,
    camera: Arc<dyn FrameSource>,
    classifier: Arc<dyn Classify>,
    aggregator: Arc<RwLock<VoteAggregator>>,
    history: Arc<RwLock<VerdictHistory>>,
    events: Arc<EventBus>,
    inflight: InflightSlot,
    top_k: usize,
    request_timeout_ms: u64,
}

impl MonitorSession {
    pub fn new(
        config: Config,
        camera: Arc<dyn FrameSource>,
        classifier: Arc<dyn Classify>,
    ) -> Self {
        let session_id = Uuid::new_v4();
        let policy = WindowPolicy::from_config(&config.sampling);

        let ctx = SamplerContext {
            session_id,
            camera,
            classifier,
            aggregator: Arc::new(RwLock::new(VoteAggregator::new(policy))),
            history: Arc::new(RwLock::new(VerdictHistory::new(
                config.monitoring.history_capacity,
            ))),
            events: Arc::new(EventBus::new(EVENT_BUS_CAPACITY)),
            inflight: InflightSlot::new(),
            top_k: config.classifier.top_k,
            request_timeout_ms: config.classifier.request_timeout_ms,
        };

        Self {
            session_id,
            config,
            ctx,
            cancel_token: None,
            handle: None,
        }
    }

    /// Starts the sampling and window-check loops. The first window opens
    /// immediately.
    pub async fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            bail!("monitoring already active");
        }

        tracing::info!("📸 Monitor session {} starting...", self.session_id);

        self.ctx.aggregator.write().await.open(Utc::now());

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            self.ctx.clone(),
            self.config.sampling.clone(),
            cancel_token.clone(),
        ));

        self.cancel_token = Some(cancel_token);
        self.handle = Some(handle);

        tracing::info!(
            "✅ Monitor session started (1 frame per {}ms)",
            self.config.sampling.interval_ms
        );
        Ok(())
    }

    /// Idempotent. An in-flight classification finishes or times out on its
    /// own; its result lands in a window nobody will close, harmlessly.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("monitor loop task failed to join")?;
            tracing::info!("Monitor session {} stopped", self.session_id);
        }

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn events(&self) -> &EventBus {
        &self.ctx.events
    }

    pub fn history(&self) -> Arc<RwLock<VerdictHistory>> {
        self.ctx.history.clone()
    }

    /// Samples recorded in the currently open window.
    pub async fn current_window_samples(&self) -> u64 {
        self.ctx.aggregator.read().await.total_samples()
    }
}

async fn run_loop(ctx: SamplerContext, sampling: SamplingConfig, cancel: CancellationToken) {
    let mut sample_ticker =
        tokio::time::interval(Duration::from_millis(sampling.interval_ms.max(1)));
    sample_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut check_ticker =
        tokio::time::interval(Duration::from_millis(sampling.check_interval_ms.max(1)));
    check_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = sample_ticker.tick() => {
                let Some(guard) = ctx.inflight.try_acquire() else {
                    tracing::debug!("⏭️  Previous request still in flight, skipping tick");
                    continue;
                };
                tokio::spawn(sample_once(ctx.clone(), guard));
            }
            _ = check_ticker.tick() => {
                finalize_if_complete(&ctx).await;
            }
            _ = cancel.cancelled() => {
                tracing::info!("Monitor loop shutting down for session {}", ctx.session_id);
                break;
            }
        }
    }
}

/// One sampling tick: capture, classify, record. Every failure is caught
/// here; a failed tick contributes no sample and the next tick retries
/// independently.
async fn sample_once(ctx: SamplerContext, _guard: InflightGuard) {
    match classify_frame(&ctx).await {
        Ok(prediction) => {
            let now = Utc::now();
            let label = prediction.label().to_string();
            let confidence = prediction.confidence_or_zero();

            if label.is_empty() {
                tracing::debug!("Unlabeled prediction, dropping sample");
            } else {
                ctx.events.publish(MonitorEvent::SampleRecorded {
                    label: label.clone(),
                    confidence,
                    at: now,
                });
            }

            let mut aggregator = ctx.aggregator.write().await;
            aggregator.record_sample(&label, confidence, now);
            // count windows complete mid-tick, the moment the target is hit
            finalize_locked(&mut aggregator, &ctx).await;
        }
        Err(e) => {
            tracing::warn!(
                "Classification tick failed for session {}: {e:#}",
                ctx.session_id
            );
            ctx.events.publish(MonitorEvent::ClassificationFailed {
                reason: format!("{e:#}"),
                at: Utc::now(),
            });
        }
    }
}

async fn classify_frame(ctx: &SamplerContext) -> Result<Prediction> {
    let frame = ctx.camera.next_frame().await.context("frame capture failed")?;

    let request = ctx.classifier.classify(frame.bytes, ctx.top_k);
    let prediction =
        tokio::time::timeout(Duration::from_millis(ctx.request_timeout_ms), request)
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "classification timed out after {}ms",
                    ctx.request_timeout_ms
                )
            })?
            .context("classification request failed")?;

    Ok(prediction)
}

async fn finalize_if_complete(ctx: &SamplerContext) {
    let mut aggregator = ctx.aggregator.write().await;
    finalize_locked(&mut aggregator, ctx).await;
}

/// The single window-boundary path. Both completion triggers (the periodic
/// check and the inline count check) come through here while the write
/// lock is held, so a boundary can neither double-fire nor be lost.
async fn finalize_locked(aggregator: &mut VoteAggregator, ctx: &SamplerContext) {
    let now = Utc::now();
    if !aggregator.is_window_complete(now) {
        return;
    }

    let verdict = aggregator.close_window(now);
    aggregator.open(now);

    ctx.history.write().await.push(verdict.clone(), now);
    tracing::debug!("Window closed: {:?}", verdict.label);
    ctx.events.publish(MonitorEvent::VerdictReady { verdict });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::classifier::{ClassifierError, MockClassify};
    use crate::camera::FakeCamera;
    use crate::core::config::{
        CameraConfig, CameraSourceKind, ClassifierConfig, MonitoringConfig, SamplingConfig,
        WindowPolicyKind,
    };

    fn prediction(label: &str, confidence: f64) -> Prediction {
        Prediction {
            predicted_label: Some(label.to_string()),
            confidence: Some(confidence),
            top_k: Vec::new(),
        }
    }

    fn test_ctx(classifier: Arc<dyn Classify>, policy: WindowPolicy) -> SamplerContext {
        SamplerContext {
            session_id: Uuid::new_v4(),
            camera: Arc::new(FakeCamera::new()),
            classifier,
            aggregator: Arc::new(RwLock::new(VoteAggregator::new(policy))),
            history: Arc::new(RwLock::new(VerdictHistory::new(6))),
            events: Arc::new(EventBus::new(EVENT_BUS_CAPACITY)),
            inflight: InflightSlot::new(),
            top_k: 3,
            request_timeout_ms: 1000,
        }
    }

    fn test_config(interval_ms: u64, target: u64) -> Config {
        Config {
            classifier: ClassifierConfig {
                base_url: "http://localhost:0".to_string(),
                top_k: 3,
                request_timeout_ms: 1000,
            },
            sampling: SamplingConfig {
                interval_ms,
                window_policy: WindowPolicyKind::Count,
                window_duration_ms: 60_000,
                window_sample_target: target,
                check_interval_ms: 25,
            },
            camera: CameraConfig {
                source: CameraSourceKind::Fake,
                frame_dir: String::new(),
            },
            monitoring: MonitoringConfig {
                history_capacity: 6,
                health_port: 0,
                log_level: "debug".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn count_window_finalizes_the_moment_target_is_reached() {
        let mut mock = MockClassify::new();
        mock.expect_classify()
            .returning(|_, _| Ok(prediction("apple", 0.9)));

        let ctx = test_ctx(Arc::new(mock), WindowPolicy::Count { target: 2 });
        ctx.aggregator.write().await.open(Utc::now());
        let mut rx = ctx.events.subscribe();

        sample_once(ctx.clone(), ctx.inflight.try_acquire().unwrap()).await;
        assert!(ctx.history.read().await.is_empty());

        sample_once(ctx.clone(), ctx.inflight.try_acquire().unwrap()).await;
        let history = ctx.history.read().await;
        assert_eq!(history.len(), 1);

        let record = history.latest().unwrap();
        assert_eq!(record.verdict.label.as_deref(), Some("apple"));
        assert_eq!(record.verdict.count, 2);
        assert_eq!(record.verdict.total_samples, 2);

        // fresh window already open for the next samples
        assert_eq!(ctx.aggregator.read().await.total_samples(), 0);

        let mut verdicts = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, MonitorEvent::VerdictReady { .. }) {
                verdicts += 1;
            }
        }
        assert_eq!(verdicts, 1);
    }

    #[tokio::test]
    async fn failed_classification_contributes_no_sample() {
        let mut mock = MockClassify::new();
        mock.expect_classify()
            .returning(|_, _| Err(ClassifierError::Timeout));

        let ctx = test_ctx(Arc::new(mock), WindowPolicy::Count { target: 2 });
        ctx.aggregator.write().await.open(Utc::now());
        let mut rx = ctx.events.subscribe();

        sample_once(ctx.clone(), ctx.inflight.try_acquire().unwrap()).await;

        assert_eq!(ctx.aggregator.read().await.total_samples(), 0);
        assert!(ctx.history.read().await.is_empty());
        assert!(matches!(
            rx.try_recv().unwrap(),
            MonitorEvent::ClassificationFailed { .. }
        ));
    }

    #[tokio::test]
    async fn unlabeled_prediction_is_dropped_without_an_event() {
        let mut mock = MockClassify::new();
        mock.expect_classify().returning(|_, _| {
            Ok(Prediction {
                predicted_label: None,
                confidence: Some(0.9),
                top_k: Vec::new(),
            })
        });

        let ctx = test_ctx(Arc::new(mock), WindowPolicy::Count { target: 1 });
        ctx.aggregator.write().await.open(Utc::now());
        let mut rx = ctx.events.subscribe();

        sample_once(ctx.clone(), ctx.inflight.try_acquire().unwrap()).await;

        assert_eq!(ctx.aggregator.read().await.total_samples(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn duration_window_finalizes_via_the_check_path() {
        let mock = MockClassify::new();
        let ctx = test_ctx(Arc::new(mock), WindowPolicy::Duration { window_ms: 0 });
        ctx.aggregator.write().await.open(Utc::now());
        ctx.aggregator
            .write()
            .await
            .record_sample("banana", 0.8, Utc::now());

        finalize_if_complete(&ctx).await;

        let history = ctx.history.read().await;
        assert_eq!(history.len(), 1);
        assert_eq!(
            history.latest().unwrap().verdict.label.as_deref(),
            Some("banana")
        );
    }

    #[tokio::test]
    async fn session_lifecycle_produces_verdicts_and_stops_cleanly() {
        let mut mock = MockClassify::new();
        mock.expect_classify()
            .returning(|_, _| Ok(prediction("apple", 0.9)));

        let mut session = MonitorSession::new(
            test_config(10, 3),
            Arc::new(FakeCamera::new()),
            Arc::new(mock),
        );

        session.start().await.unwrap();
        assert!(session.is_running());
        assert!(session.start().await.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        session.stop().await.unwrap();
        assert!(!session.is_running());

        let history = session.history();
        let history = history.read().await;
        assert!(!history.is_empty());
        assert_eq!(
            history.latest().unwrap().verdict.label.as_deref(),
            Some("apple")
        );

        // stop is idempotent
        session.stop().await.unwrap();
    }
}
