//! Decoding of the speedtest CLI's JSON output.
//!
//! The tool emits one of three document kinds, discriminated by `type`:
//! `log`, `result` and `error`. Socket failures come back as a bare
//! `{"error": "..."}` document without a `type`, which takes precedence.
//! Anything else is invalid.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::measurement::{Measurement, ServerInfo};

/// Raw bytes captured from the tool's stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutput(pub Vec<u8>);

impl RawOutput {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the bytes decode as a JSON document at all
    pub fn is_structured(&self) -> bool {
        serde_json::from_slice::<Value>(&self.0).is_ok()
    }
}

impl From<&str> for RawOutput {
    fn from(s: &str) -> Self {
        RawOutput(s.as_bytes().to_vec())
    }
}

/// Progress or diagnostic message printed by the tool during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogNotice {
    pub timestamp: String,
    pub message: String,
    pub level: Option<String>,
}

/// Classified output of one run
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedOutput {
    Measurement(Measurement),
    LogNotice(LogNotice),
    ExplicitError(String),
    Invalid(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Bare(BareError),
    Tagged(TaggedDocument),
}

#[derive(Deserialize)]
struct BareError {
    error: String,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TaggedDocument {
    Log(LogDocument),
    Result(ResultDocument),
    Error(ErrorDocument),
}

#[derive(Deserialize)]
struct LogDocument {
    #[serde(default)]
    timestamp: Value,
    #[serde(default)]
    message: String,
    level: Option<String>,
}

#[derive(Deserialize)]
struct ErrorDocument {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ResultDocument {
    server: ServerDocument,
    ping: PingDocument,
    download: BandwidthDocument,
    upload: BandwidthDocument,
}

#[derive(Deserialize)]
struct ServerDocument {
    #[serde(deserialize_with = "server_id")]
    id: u64,
    name: String,
    location: String,
    country: String,
}

#[derive(Deserialize)]
struct PingDocument {
    latency: f64,
    jitter: f64,
}

#[derive(Deserialize)]
struct BandwidthDocument {
    bandwidth: f64,
}

/// Server ids are integers but some tool versions quote them
fn server_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }

    match Id::deserialize(deserializer)? {
        Id::Number(id) => Ok(id),
        Id::Text(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid server id {:?}", text))),
    }
}

impl ResultDocument {
    fn into_measurement(self) -> Measurement {
        Measurement::from_tool_units(
            ServerInfo {
                id: self.server.id,
                name: self.server.name,
                location: self.server.location,
                country: self.server.country,
            },
            self.ping.latency,
            self.ping.jitter,
            self.download.bandwidth,
            self.upload.bandwidth,
        )
    }
}

/// Decodes tool output into a [`ParsedOutput`]
pub struct ResultParser;

impl ResultParser {
    pub fn parse(raw: &RawOutput) -> ParsedOutput {
        let value: Value = match serde_json::from_slice(raw.as_bytes()) {
            Ok(value) => value,
            Err(e) => return ParsedOutput::Invalid(format!("not JSON: {}", e)),
        };

        if !value.is_object() {
            return ParsedOutput::Invalid("expected a JSON object".to_string());
        }

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);

        match serde_json::from_value::<Document>(value) {
            Ok(Document::Bare(bare)) => ParsedOutput::ExplicitError(bare.error),
            Ok(Document::Tagged(TaggedDocument::Log(log))) => {
                ParsedOutput::LogNotice(LogNotice {
                    timestamp: match log.timestamp {
                        Value::String(s) => s,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    },
                    message: log.message,
                    level: log.level,
                })
            }
            Ok(Document::Tagged(TaggedDocument::Result(result))) => {
                ParsedOutput::Measurement(result.into_measurement())
            }
            Ok(Document::Tagged(TaggedDocument::Error(err))) => ParsedOutput::ExplicitError(
                err.message
                    .or(err.error)
                    .unwrap_or_else(|| "unspecified error".to_string()),
            ),
            Err(_) => ParsedOutput::Invalid(match kind {
                Some(kind) if matches!(kind.as_str(), "log" | "result" | "error") => {
                    format!("incomplete '{}' document", kind)
                }
                Some(kind) => format!("unrecognised document type '{}'", kind),
                None => "document has no type".to_string(),
            }),
        }
    }
}
