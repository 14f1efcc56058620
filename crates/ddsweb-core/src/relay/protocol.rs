//! Event envelopes exchanged with the browser
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};

/// Payload of every client event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub command: String,
}

/// Event sent by the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ClientEvent {
    /// Set the carrier frequency
    Freq(CommandPayload),
    /// Set the modulating tone
    Tone(CommandPayload),
    /// Set or clear the alternate tone
    Tone2(CommandPayload),
    /// Set the output level
    Power(CommandPayload),
    /// Trigger `dds` in the named mode
    Mode(CommandPayload),
}

impl ClientEvent {
    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Freq(_) => "freq",
            ClientEvent::Tone(_) => "tone",
            ClientEvent::Tone2(_) => "tone2",
            ClientEvent::Power(_) => "power",
            ClientEvent::Mode(_) => "mode",
        }
    }
}

/// Relay state label reported to the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Idle,
    Done,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub stat: Stat,
    /// Failure detail, only present for `error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Event sent to the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerEvent {
    Status(StatusPayload),
}

impl ServerEvent {
    /// Sent once when a client connects
    pub fn idle() -> Self {
        Self::status(Stat::Idle, None)
    }

    /// Sent after `dds` finished successfully
    pub fn done() -> Self {
        Self::status(Stat::Done, None)
    }

    /// Sent after `dds` could not be run or failed
    pub fn error(message: impl Into<String>) -> Self {
        Self::status(Stat::Error, Some(message.into()))
    }

    fn status(stat: Stat, message: Option<String>) -> Self {
        ServerEvent::Status(StatusPayload { stat, message })
    }
}
