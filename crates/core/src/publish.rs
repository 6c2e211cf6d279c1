//! Publish capability consumed by the simulation loop
//!
//! The real message transport (broker connection, authentication,
//! acknowledgement) lives outside this crate. What the loop needs is a
//! fire-and-forget `publish(topic, payload)`; failures are reported back and
//! the loop logs them and keeps going.

use crate::error::PublishError;
use serde::Serialize;
use serde_json::value::RawValue;
use std::io::Write;
use tracing::info;

/// Sink for outbound messages
pub trait Publisher {
    /// Deliver `payload` on `topic`
    ///
    /// # Errors
    /// Any [`PublishError`]; callers treat it as non-fatal.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        (**self).publish(topic, payload)
    }
}

/// One JSON object per line: `{"topic": ..., "payload": {...}}`
#[derive(Debug)]
pub struct JsonLinesPublisher<W: Write> {
    writer: W,
}

#[derive(Serialize)]
struct Line<'a> {
    topic: &'a str,
    payload: &'a RawValue,
}

impl<W: Write> JsonLinesPublisher<W> {
    /// Write lines to `writer`
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Publisher for JsonLinesPublisher<W> {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let text = std::str::from_utf8(payload).map_err(|e| PublishError::Rejected {
            topic: topic.to_string(),
            reason: format!("payload is not UTF-8: {e}"),
        })?;
        let payload: &RawValue = serde_json::from_str(text)?;
        serde_json::to_writer(&mut self.writer, &Line { topic, payload })?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Emits each message as a `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        info!(topic, payload = %String::from_utf8_lossy(payload), "publish");
        Ok(())
    }
}

/// Keeps every message in memory
///
/// Topics registered with [`RecordingPublisher::fail_on`] are rejected
/// instead of stored.
#[derive(Debug, Default, Clone)]
pub struct RecordingPublisher {
    messages: Vec<(String, Vec<u8>)>,
    failing_topics: Vec<String>,
    rejected: usize,
}

impl RecordingPublisher {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message whose topic equals `topic`
    pub fn fail_on(mut self, topic: impl Into<String>) -> Self {
        self.failing_topics.push(topic.into());
        self
    }

    /// Stored `(topic, payload)` pairs in publish order
    pub fn messages(&self) -> &[(String, Vec<u8>)] {
        &self.messages
    }

    /// Stored payloads decoded as JSON, paired with their topics
    ///
    /// Payloads that are not valid JSON are skipped.
    pub fn json_messages(&self) -> Vec<(String, serde_json::Value)> {
        self.messages
            .iter()
            .filter_map(|(topic, payload)| {
                serde_json::from_slice(payload)
                    .ok()
                    .map(|value| (topic.clone(), value))
            })
            .collect()
    }

    /// Number of rejected messages
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if self.failing_topics.iter().any(|t| t == topic) {
            self.rejected += 1;
            return Err(PublishError::Rejected {
                topic: topic.to_string(),
                reason: "configured to fail".to_string(),
            });
        }
        self.messages.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}
