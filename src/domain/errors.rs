use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while invoking the external speedtest tool
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Failed to launch {}: {}", .binary.display(), .source)]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Speedtest CLI process took longer than {}s to complete and was killed", .timeout.as_secs())]
    TimedOut { timeout: Duration },

    #[error("Failed to collect speedtest output: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Speedtest CLI exited with {status} and output that was not in JSON format")]
    NonZeroExit { status: String, output_len: usize },
}

/// Reasons a single measurement attempt did not yield a result.
///
/// Every variant is recoverable: it is logged and the target is published
/// as unreachable until the next refresh.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("Malformed speedtest output: {reason}")]
    Malformed { reason: String },

    #[error("Speedtest reported an error: {message}")]
    Tool { message: String },
}

impl AttemptFailure {
    /// Short failure kind used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptFailure::Executor(ExecutorError::TimedOut { .. }) => "timeout",
            AttemptFailure::Executor(_) => "process",
            AttemptFailure::Malformed { .. } => "malformed",
            AttemptFailure::Tool { .. } => "tool_error",
        }
    }
}

/// Startup precondition failures. These are the only errors allowed to stop
/// the process.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Speedtest CLI binary '{binary}' not found")]
    BinaryNotFound { binary: String },

    #[error("Speedtest CLI at {} is not the official one (reported: {:?})", .binary.display(), .reported)]
    WrongVendor { binary: PathBuf, reported: String },

    #[error("Failed to query the version of {}: {}", .binary.display(), .source)]
    VersionProbe {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_formatting() {
        let error = ExecutorError::TimedOut {
            timeout: Duration::from_secs(90),
        };

        let msg = error.to_string();
        assert!(msg.contains("90s"));
        assert!(msg.contains("killed"));
    }

    #[test]
    fn test_failure_kinds() {
        let timeout = AttemptFailure::from(ExecutorError::TimedOut {
            timeout: Duration::from_secs(1),
        });
        assert_eq!(timeout.kind(), "timeout");

        let exit = AttemptFailure::from(ExecutorError::NonZeroExit {
            status: "exit status: 2".to_string(),
            output_len: 12,
        });
        assert_eq!(exit.kind(), "process");

        let tool = AttemptFailure::Tool {
            message: "Cannot read from socket".to_string(),
        };
        assert_eq!(tool.kind(), "tool_error");
        assert!(tool.to_string().contains("Cannot read from socket"));
    }

    #[test]
    fn test_wrong_vendor_formatting() {
        let error = StartupError::WrongVendor {
            binary: PathBuf::from("/usr/bin/speedtest"),
            reported: "speedtest-cli 2.1.3".to_string(),
        };

        let msg = error.to_string();
        assert!(msg.contains("/usr/bin/speedtest"));
        assert!(msg.contains("speedtest-cli 2.1.3"));
    }
}
