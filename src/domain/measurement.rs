//! Measurement values republished by the exporter.
//!
//! A [`Measurement`] can only be built by the payload decoder from a
//! validated `result` document. Rates arrive in bytes/s and are held in
//! bits/s.

use std::fmt;

/// Convert a throughput in bytes per second to bits per second
pub fn bytes_to_bits(bytes_per_sec: f64) -> f64 {
    bytes_per_sec * 8.0
}

/// Render a bits-per-second rate as megabits with exactly two decimals,
/// e.g. `94.21Mbps`. Independent of locale.
pub fn format_megabits(bits_per_sec: f64) -> String {
    format!("{:.2}Mbps", bits_per_sec / 1_000_000.0)
}

/// Identity of the server the tool measured against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub id: u64,
    pub name: String,
    pub location: String,
    pub country: String,
}

/// A successful speedtest run
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    server: ServerInfo,
    latency_ms: f64,
    jitter_ms: f64,
    download_bps: f64,
    upload_bps: f64,
}

impl Measurement {
    /// Only the payload decoder builds measurements; rates are given in the
    /// tool's bytes/s units.
    pub(crate) fn from_tool_units(
        server: ServerInfo,
        latency_ms: f64,
        jitter_ms: f64,
        download_bytes_per_sec: f64,
        upload_bytes_per_sec: f64,
    ) -> Self {
        Self {
            server,
            latency_ms,
            jitter_ms,
            download_bps: bytes_to_bits(download_bytes_per_sec),
            upload_bps: bytes_to_bits(upload_bytes_per_sec),
        }
    }

    pub fn server(&self) -> &ServerInfo {
        &self.server
    }

    pub fn server_id(&self) -> u64 {
        self.server.id
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    pub fn jitter_ms(&self) -> f64 {
        self.jitter_ms
    }

    /// Download rate in bits per second
    pub fn download_bps(&self) -> f64 {
        self.download_bps
    }

    /// Upload rate in bits per second
    pub fn upload_bps(&self) -> f64 {
        self.upload_bps
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Server={} Name={} Latency={}ms Jitter={}ms Download={} Upload={}",
            self.server.id,
            self.server.name,
            self.latency_ms,
            self.jitter_ms,
            format_megabits(self.download_bps),
            format_megabits(self.upload_bps)
        )
    }
}

/// Value of the `server_id` label a target is published under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetLabel {
    Server(u64),
    Unknown,
}

impl TargetLabel {
    /// Label for an attempt that produced no result: the requested id, or
    /// `unknown` when the tool was left to pick a server.
    pub fn requested(server_id: Option<u64>) -> Self {
        match server_id {
            Some(id) => TargetLabel::Server(id),
            None => TargetLabel::Unknown,
        }
    }
}

impl fmt::Display for TargetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetLabel::Server(id) => write!(f, "{}", id),
            TargetLabel::Unknown => write!(f, "unknown"),
        }
    }
}

/// Marks a target as currently unmeasurable. Carries no rate data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureSentinel {
    pub label: TargetLabel,
}

/// What gets published for one target after an attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Measured(Measurement),
    Unreachable(FailureSentinel),
}

impl Outcome {
    pub fn unreachable(requested: Option<u64>) -> Self {
        Outcome::Unreachable(FailureSentinel {
            label: TargetLabel::requested(requested),
        })
    }

    /// The label trusts the id reported by the tool over the requested one.
    pub fn label(&self) -> TargetLabel {
        match self {
            Outcome::Measured(m) => TargetLabel::Server(m.server_id()),
            Outcome::Unreachable(sentinel) => sentinel.label.clone(),
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, Outcome::Measured(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Measurement {
        Measurement::from_tool_units(
            ServerInfo {
                id: 12345,
                name: "Example ISP".to_string(),
                location: "Berlin".to_string(),
                country: "Germany".to_string(),
            },
            11.2,
            0.85,
            11_776_000.0,
            2_500_000.0,
        )
    }

    #[test]
    fn test_bytes_to_bits_is_exactly_eight_times() {
        for bytes in [0.0, 1.0, 125_000.0, 11_776_543.0, 1.5, 9.007_199_254_740_991e15] {
            assert_eq!(bytes_to_bits(bytes), 8.0 * bytes);
        }
    }

    #[test]
    fn test_format_megabits_two_decimals() {
        assert_eq!(format_megabits(94_208_000.0), "94.21Mbps");
        assert_eq!(format_megabits(0.0), "0.00Mbps");
        assert_eq!(format_megabits(12_500_000.0), "12.50Mbps");
        assert_eq!(format_megabits(1_000_000_000.0), "1000.00Mbps");
        // deterministic across calls
        assert_eq!(format_megabits(33_333_333.0), format_megabits(33_333_333.0));
    }

    #[test]
    fn test_measurement_stores_bits() {
        let m = sample();
        assert_eq!(m.download_bps(), 94_208_000.0);
        assert_eq!(m.upload_bps(), 20_000_000.0);
    }

    #[test]
    fn test_measurement_summary() {
        let summary = sample().to_string();
        assert_eq!(
            summary,
            "Server=12345 Name=Example ISP Latency=11.2ms Jitter=0.85ms Download=94.21Mbps Upload=20.00Mbps"
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(Outcome::unreachable(Some(7)).label().to_string(), "7");
        assert_eq!(Outcome::unreachable(None).label().to_string(), "unknown");

        let measured = Outcome::Measured(sample());
        assert!(measured.is_up());
        assert_eq!(measured.label(), TargetLabel::Server(12345));
    }
}
