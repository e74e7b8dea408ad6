use crate::domain::errors::ExecutorError;
use crate::domain::payload::RawOutput;
use crate::domain::ports::SpeedtestRunner;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// Scripted reply of the mock runner
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Tool printed this text and exited
    Output(String),
    /// Tool ran past the timeout
    TimedOut,
    /// Tool exited non-zero with unstructured output
    Crashed,
}

impl MockResponse {
    /// A well-formed `result` document for `server_id`
    pub fn result(server_id: u64, latency_ms: f64, download_bytes: u64, upload_bytes: u64) -> Self {
        MockResponse::Output(
            serde_json::json!({
                "type": "result",
                "timestamp": "2024-03-01T10:00:00Z",
                "ping": { "latency": latency_ms, "jitter": 1.5 },
                "download": { "bandwidth": download_bytes },
                "upload": { "bandwidth": upload_bytes },
                "server": {
                    "id": server_id,
                    "name": format!("Mock Server {}", server_id),
                    "location": "Testville",
                    "country": "Nowhere"
                }
            })
            .to_string(),
        )
    }
}

#[derive(Default)]
struct MockState {
    responses: HashMap<Option<u64>, MockResponse>,
    in_flight: HashMap<Option<u64>, usize>,
}

/// In-process stand-in for the speedtest CLI.
///
/// Replies are scripted per requested server id. Every call is counted and
/// the highest number of overlapping calls for the same server is recorded.
#[derive(Clone)]
pub struct MockSpeedtestRunner {
    state: Arc<Mutex<MockState>>,
    fallback: MockResponse,
    delay: Duration,
    calls: Arc<AtomicUsize>,
    max_overlap: Arc<AtomicUsize>,
}

impl MockSpeedtestRunner {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            fallback: MockResponse::result(1000, 10.0, 12_500_000, 2_500_000),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            max_overlap: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Simulated run duration
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reply used for ids without a scripted response
    pub fn with_fallback(mut self, response: MockResponse) -> Self {
        self.fallback = response;
        self
    }

    pub fn respond(&self, server_id: Option<u64>, response: MockResponse) {
        self.lock().responses.insert(server_id, response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous runs seen for a single server id
    pub fn max_overlap(&self) -> usize {
        self.max_overlap.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockSpeedtestRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeedtestRunner for MockSpeedtestRunner {
    async fn run(
        &self,
        server_id: Option<u64>,
        timeout: Duration,
    ) -> Result<RawOutput, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let response = {
            let mut state = self.lock();
            let running = state.in_flight.entry(server_id).or_insert(0);
            *running += 1;
            self.max_overlap.fetch_max(*running, Ordering::SeqCst);
            state
                .responses
                .get(&server_id)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone())
        };

        info!("MockSpeedtestRunner: run for server {:?}", server_id);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay.min(timeout)).await;
        }

        if let Some(running) = self.lock().in_flight.get_mut(&server_id) {
            *running -= 1;
        }

        match response {
            MockResponse::Output(text) => Ok(RawOutput(text.into_bytes())),
            MockResponse::TimedOut => Err(ExecutorError::TimedOut { timeout }),
            MockResponse::Crashed => Err(ExecutorError::NonZeroExit {
                status: "exit status: 1".to_string(),
                output_len: 0,
            }),
        }
    }
}
