use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use tracing::info;

use crate::application::cache_gate::{CacheGate, Freshness};
use crate::application::orchestrator::TargetOrchestrator;
use crate::config::SpeedtestEnvConfig;
use crate::domain::ports::SpeedtestRunner;
use crate::infrastructure::observability::Metrics;

/// The measurement-and-cache pipeline behind the scrape endpoint
pub struct Exporter {
    gate: CacheGate,
    orchestrator: TargetOrchestrator,
    metrics: Metrics,
}

impl Exporter {
    pub fn build(config: &SpeedtestEnvConfig, runner: Arc<dyn SpeedtestRunner>) -> anyhow::Result<Self> {
        info!(
            "Building exporter (targets: {}, cache: {}s, timeout: {}s)",
            config.targets,
            config.cache_ttl.as_secs(),
            config.timeout.as_secs()
        );

        let metrics = Metrics::new()?;
        let orchestrator = TargetOrchestrator::new(
            runner,
            metrics.clone(),
            config.targets.clone(),
            config.timeout,
        );

        Ok(Self {
            gate: CacheGate::new(config.cache_ttl),
            orchestrator,
            metrics,
        })
    }

    /// Re-measure if the cached snapshot has expired.
    ///
    /// The cycle runs on its own task, so a caller that stops waiting (a
    /// scraper that disconnected) never cuts a measurement short.
    pub async fn ensure_fresh(self: &Arc<Self>) -> anyhow::Result<Freshness> {
        let exporter = Arc::clone(self);
        let cycle = tokio::spawn(async move {
            let orchestrator = &exporter.orchestrator;
            exporter
                .gate
                .ensure_fresh(|| async move {
                    orchestrator.refresh().await;
                })
                .await
        });

        cycle.await.context("Refresh task failed")
    }

    /// Time since the last completed refresh, if any
    pub async fn age(&self) -> Option<Duration> {
        self.gate.age().await
    }

    /// Current snapshot in the Prometheus text format
    pub fn render(&self) -> String {
        self.metrics.render()
    }

    /// Freshen, then render. A failed refresh still serves the last snapshot.
    pub async fn scrape(self: &Arc<Self>) -> String {
        let _ = self.ensure_fresh().await;
        self.render()
    }
}
