//! Startup precondition: the official Ookla CLI must be installed.
//!
//! The checks here only classify; terminating the process is left to the
//! binary's `main`.

use crate::domain::errors::StartupError;
use std::env;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

/// Marker printed by `speedtest --version` for the official client
pub const VENDOR_MARKER: &str = "Speedtest by Ookla";

/// Where to send users whose installation is missing or wrong
pub const INSTALL_URL: &str = "https://www.speedtest.net/apps/cli";

/// Exit status used when the precondition fails
pub const EXIT_BINARY_UNAVAILABLE: i32 = 2;

/// Result of inspecting `--version` output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorCheck {
    Official,
    Foreign,
}

pub fn classify_version_output(stdout: &str) -> VendorCheck {
    if stdout.contains(VENDOR_MARKER) {
        VendorCheck::Official
    } else {
        VendorCheck::Foreign
    }
}

/// Resolve `binary` the way a shell would: paths with a separator are taken
/// as-is, bare names are searched on `PATH`.
pub fn locate_binary(binary: &Path) -> Option<PathBuf> {
    if binary.components().count() > 1 {
        return binary.is_file().then(|| binary.to_path_buf());
    }

    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// Verify the tool is present and self-identifies as the official client.
/// Returns the resolved path on success.
pub async fn check_binary(binary: &Path) -> Result<PathBuf, StartupError> {
    let resolved = locate_binary(binary).ok_or_else(|| StartupError::BinaryNotFound {
        binary: binary.display().to_string(),
    })?;

    let output = Command::new(&resolved)
        .arg("--version")
        .output()
        .await
        .map_err(|source| StartupError::VersionProbe {
            binary: resolved.clone(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    match classify_version_output(&stdout) {
        VendorCheck::Official => {
            info!(
                "Found {} at {}",
                stdout.lines().next().unwrap_or(VENDOR_MARKER).trim(),
                resolved.display()
            );
            Ok(resolved)
        }
        VendorCheck::Foreign => Err(StartupError::WrongVendor {
            binary: resolved,
            reported: stdout.lines().next().unwrap_or_default().trim().to_string(),
        }),
    }
}

/// Human readable guidance for a failed precondition
pub fn remediation(error: &StartupError) -> String {
    match error {
        StartupError::BinaryNotFound { .. } => format!(
            "Speedtest CLI binary not found. Please install it by going to the official website.\n{}",
            INSTALL_URL
        ),
        StartupError::WrongVendor { .. } | StartupError::VersionProbe { .. } => format!(
            "Speedtest CLI that is installed is not the official one. Please install it by going to the official website.\n{}",
            INSTALL_URL
        ),
    }
}
