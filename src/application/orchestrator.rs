use crate::domain::errors::AttemptFailure;
use crate::domain::measurement::Outcome;
use crate::domain::payload::{ParsedOutput, ResultParser};
use crate::domain::ports::SpeedtestRunner;
use crate::domain::target::TargetSet;
use crate::infrastructure::observability::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Result of one target's attempt within a refresh cycle
#[derive(Debug)]
pub enum TargetReport {
    /// Published as up or down
    Published(Outcome),
    /// The tool only printed a log notice; published values were left alone
    Notice,
}

/// Per-cycle tally, for logging
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub up: usize,
    pub down: usize,
    pub notices: usize,
}

/// Drives one run → parse → publish cycle per configured target
pub struct TargetOrchestrator {
    runner: Arc<dyn SpeedtestRunner>,
    metrics: Metrics,
    targets: TargetSet,
    timeout: Duration,
}

impl TargetOrchestrator {
    pub fn new(
        runner: Arc<dyn SpeedtestRunner>,
        metrics: Metrics,
        targets: TargetSet,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            metrics,
            targets,
            timeout,
        }
    }

    /// Measure every target in order. A failing target never stops the rest.
    pub async fn refresh(&self) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        for server_id in self.targets.resolve() {
            match self.measure(server_id).await {
                TargetReport::Published(outcome) if outcome.is_up() => summary.up += 1,
                TargetReport::Published(_) => summary.down += 1,
                TargetReport::Notice => summary.notices += 1,
            }
        }

        info!(
            "Refresh complete: {} up, {} down, {} without result",
            summary.up, summary.down, summary.notices
        );
        summary
    }

    /// Run a single target and publish what came back
    pub async fn measure(&self, server_id: Option<u64>) -> TargetReport {
        let attempt = match self.runner.run(server_id, self.timeout).await {
            Ok(raw) => ResultParser::parse(&raw),
            Err(e) => {
                let failure = AttemptFailure::from(e);
                return self.publish_failure(server_id, failure);
            }
        };

        match attempt {
            ParsedOutput::Measurement(measurement) => {
                info!("{}", measurement);
                let outcome = Outcome::Measured(measurement);
                self.metrics.publish(&outcome);
                TargetReport::Published(outcome)
            }
            ParsedOutput::LogNotice(notice) => {
                info!(
                    server_id = ?server_id,
                    level = notice.level.as_deref().unwrap_or("info"),
                    "{} - {}",
                    notice.timestamp,
                    notice.message
                );
                TargetReport::Notice
            }
            ParsedOutput::ExplicitError(message) => {
                self.publish_failure(server_id, AttemptFailure::Tool { message })
            }
            ParsedOutput::Invalid(reason) => {
                self.publish_failure(server_id, AttemptFailure::Malformed { reason })
            }
        }
    }

    fn publish_failure(&self, server_id: Option<u64>, failure: AttemptFailure) -> TargetReport {
        let outcome = Outcome::unreachable(server_id);
        match &failure {
            AttemptFailure::Tool { .. } => warn!(
                server_id = %outcome.label(),
                kind = failure.kind(),
                "Something went wrong: {}",
                failure
            ),
            _ => error!(
                server_id = %outcome.label(),
                kind = failure.kind(),
                "Speedtest attempt failed: {}",
                failure
            ),
        }
        self.metrics.publish(&outcome);
        TargetReport::Published(outcome)
    }
}
