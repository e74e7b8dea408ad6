use crate::domain::errors::ExecutorError;
use crate::domain::payload::RawOutput;
use crate::domain::ports::SpeedtestRunner;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

/// Flags that make the tool non-interactive and machine readable
const BASE_ARGS: [&str; 4] = [
    "--format=json-pretty",
    "--progress=no",
    "--accept-license",
    "--accept-gdpr",
];

/// Arguments for one invocation, pinning the server when one is given
pub fn build_args(server_id: Option<u64>) -> Vec<String> {
    let mut args: Vec<String> = BASE_ARGS.iter().map(|a| a.to_string()).collect();
    if let Some(id) = server_id {
        args.push(format!("--server-id={}", id));
    }
    args
}

/// Runs the Ookla speedtest CLI as a child process
#[derive(Debug, Clone)]
pub struct SpeedtestCli {
    binary: PathBuf,
}

impl SpeedtestCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl SpeedtestRunner for SpeedtestCli {
    async fn run(
        &self,
        server_id: Option<u64>,
        timeout: Duration,
    ) -> Result<RawOutput, ExecutorError> {
        let args = build_args(server_id);
        debug!("SpeedtestCli: running {} {}", self.binary.display(), args.join(" "));

        // Dropping the child on timeout kills it.
        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(ExecutorError::Wait)?,
            Err(_) => {
                error!("Speedtest CLI process took too long to complete and was killed.");
                return Err(ExecutorError::TimedOut { timeout });
            }
        };

        let raw = RawOutput(output.stdout);
        if output.status.success() || raw.is_structured() {
            return Ok(raw);
        }

        if !raw.is_empty() {
            error!("Speedtest CLI Error occurred that was not in JSON format");
        }
        Err(ExecutorError::NonZeroExit {
            status: output.status.to_string(),
            output_len: raw.0.len(),
        })
    }
}
