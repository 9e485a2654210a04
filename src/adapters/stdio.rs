//! Line-oriented stdio transport.
//!
//! Stands in for a broker session when the daemon runs under a bridge
//! process (or a shell).  Inbound messages arrive on stdin, outbound ones
//! leave on stdout, one per line:
//!
//! ```text
//!   <topic> <payload>\n
//! ```
//!
//! The payload is everything after the first run of whitespace.  QoS and
//! retain are not representable on a pipe; retained publishes are marked
//! with a trailing ` (retained)` only in the debug log.

use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::Mutex;

use log::debug;

use crate::app::ports::{QoS, Transport};
use crate::error::TransportError;

#[derive(Default)]
pub struct StdioTransport {
    subscriptions: Mutex<HashSet<String>>,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any module asked for messages on `topic`.
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions
            .lock()
            .map(|subs| subs.contains(topic))
            .unwrap_or(false)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().map(|subs| subs.len()).unwrap_or(0)
    }
}

impl Transport for StdioTransport {
    fn subscribe(&self, topic: &str, qos: QoS) -> Result<(), TransportError> {
        let mut subs = self
            .subscriptions
            .lock()
            .map_err(|_| TransportError::SubscribeFailed(topic.to_owned()))?;
        subs.insert(topic.to_owned());
        debug!("stdio: subscribed {topic} qos={}", qos as u8);
        Ok(())
    }

    fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError> {
        let mut out = io::stdout().lock();
        out.write_all(topic.as_bytes())
            .and_then(|()| out.write_all(b" "))
            .and_then(|()| out.write_all(payload))
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush())
            .map_err(|_| TransportError::PublishFailed(topic.to_owned()))?;

        debug!(
            "stdio: published {topic} qos={}{}",
            qos as u8,
            if retain { " (retained)" } else { "" }
        );
        Ok(())
    }
}

/// Split one inbound line into `(topic, payload)`.
///
/// Returns `None` for blank lines and lines without a payload.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (topic, payload) = line.trim_start().split_once(char::is_whitespace)?;
    if topic.is_empty() {
        return None;
    }
    Some((topic, payload.trim_start()))
}
