use crate::domain::errors::ExecutorError;
use crate::domain::payload::RawOutput;
use async_trait::async_trait;
use std::time::Duration;

/// Runs one speedtest against a server (or an automatically chosen one) and
/// returns the tool's raw output.
///
/// Implementations must give up after `timeout` and terminate whatever they
/// started. A non-zero exit that still printed JSON is returned as output.
#[async_trait]
pub trait SpeedtestRunner: Send + Sync {
    async fn run(
        &self,
        server_id: Option<u64>,
        timeout: Duration,
    ) -> Result<RawOutput, ExecutorError>;
}
