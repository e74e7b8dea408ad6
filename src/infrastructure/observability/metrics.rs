//! Prometheus metrics definitions for the exporter
//!
//! All metrics use the `speedtest_` prefix and carry a `server_id` label.
//! Values stay in place between refreshes; a label is never removed once
//! it has been published.

use crate::domain::measurement::Outcome;
use prometheus::{GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

const SERVER_ID: &str = "server_id";

/// `id, name, location, country` labels of the info series for one target
type InfoLabels = [String; 4];

/// Prometheus gauges republishing the latest measurement per target
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Info labels currently published per `server_id`. The lock also
    /// serialises publishing against rendering.
    info_labels: Arc<RwLock<HashMap<String, InfoLabels>>>,
    /// Round trip latency in milliseconds
    pub ping_latency_ms: GaugeVec,
    /// Latency jitter in milliseconds
    pub jitter_latency_ms: GaugeVec,
    /// Download rate in bits per second
    pub download_bps: GaugeVec,
    /// Upload rate in bits per second
    pub upload_bps: GaugeVec,
    /// Whether the last attempt for the target succeeded (0/1)
    pub up: GaugeVec,
    /// Server identity, always 1
    pub server_info: GaugeVec,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let jitter_latency_ms = GaugeVec::new(
            Opts::new(
                "speedtest_jitter_latency_milliseconds",
                "Speedtest current Jitter in ms",
            ),
            &[SERVER_ID],
        )?;
        registry.register(Box::new(jitter_latency_ms.clone()))?;

        let ping_latency_ms = GaugeVec::new(
            Opts::new(
                "speedtest_ping_latency_milliseconds",
                "Speedtest current Ping in ms",
            ),
            &[SERVER_ID],
        )?;
        registry.register(Box::new(ping_latency_ms.clone()))?;

        let download_bps = GaugeVec::new(
            Opts::new(
                "speedtest_download_bits_per_second",
                "Speedtest current Download Speed in bit/s",
            ),
            &[SERVER_ID],
        )?;
        registry.register(Box::new(download_bps.clone()))?;

        let upload_bps = GaugeVec::new(
            Opts::new(
                "speedtest_upload_bits_per_second",
                "Speedtest current Upload speed in bits/s",
            ),
            &[SERVER_ID],
        )?;
        registry.register(Box::new(upload_bps.clone()))?;

        let up = GaugeVec::new(
            Opts::new("speedtest_up", "Speedtest status whether the scrape worked"),
            &[SERVER_ID],
        )?;
        registry.register(Box::new(up.clone()))?;

        let server_info = GaugeVec::new(
            Opts::new("speedtest_server_info", "Speedtest server information"),
            &[SERVER_ID, "id", "name", "location", "country"],
        )?;
        registry.register(Box::new(server_info.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            info_labels: Arc::new(RwLock::new(HashMap::new())),
            ping_latency_ms,
            jitter_latency_ms,
            download_bps,
            upload_bps,
            up,
            server_info,
        })
    }

    /// Overwrite every instrument of the outcome's target in one step.
    /// A failure zeroes the values and empties the info record.
    pub fn publish(&self, outcome: &Outcome) {
        let label = outcome.label().to_string();

        let (latency, jitter, download, upload, up, info) = match outcome {
            Outcome::Measured(m) => {
                let server = m.server();
                (
                    m.latency_ms(),
                    m.jitter_ms(),
                    m.download_bps(),
                    m.upload_bps(),
                    1.0,
                    [
                        server.id.to_string(),
                        server.name.clone(),
                        server.location.clone(),
                        server.country.clone(),
                    ],
                )
            }
            Outcome::Unreachable(_) => (0.0, 0.0, 0.0, 0.0, 0.0, InfoLabels::default()),
        };

        let mut published = self.write_lock();

        if let Some(previous) = published.get(&label) {
            if *previous != info {
                let values = info_values(&label, previous);
                if let Err(e) = self.server_info.remove_label_values(&values) {
                    warn!("Failed to drop stale server info for {}: {}", label, e);
                }
            }
        }
        self.server_info
            .with_label_values(&info_values(&label, &info))
            .set(1.0);
        published.insert(label.clone(), info);

        let target = [label.as_str()];
        self.ping_latency_ms.with_label_values(&target).set(latency);
        self.jitter_latency_ms.with_label_values(&target).set(jitter);
        self.download_bps.with_label_values(&target).set(download);
        self.upload_bps.with_label_values(&target).set(upload);
        self.up.with_label_values(&target).set(up);
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let _published = self.read_lock();
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// `server_id` labels published so far
    #[cfg(test)]
    pub fn targets(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.read_lock().keys().cloned().collect();
        labels.sort();
        labels
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, HashMap<String, InfoLabels>> {
        self.info_labels
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, HashMap<String, InfoLabels>> {
        self.info_labels
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn info_values<'a>(label: &'a str, info: &'a InfoLabels) -> [&'a str; 5] {
    [
        label,
        info[0].as_str(),
        info[1].as_str(),
        info[2].as_str(),
        info[3].as_str(),
    ]
}
