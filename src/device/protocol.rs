//! Wire protocol for the bulb's control channel
//!
//! Yeelight-compatible devices speak newline-delimited JSON over TCP: each
//! request is `{"id":N,"method":...,"params":[...]}` terminated by CRLF, and
//! the device answers with a line carrying the same `id` and either a
//! `result` array or an `error` object. The device also pushes unsolicited
//! `props` notifications on the same channel.

use crate::error::DeviceError;
use serde::Deserialize;
use serde_json::{json, Value};

/// Transition style for brightness changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionMode {
    Smooth,
    Sudden,
}

impl TransitionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionMode::Smooth => "smooth",
            TransitionMode::Sudden => "sudden",
        }
    }
}

impl std::str::FromStr for TransitionMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smooth" => Ok(TransitionMode::Smooth),
            "sudden" => Ok(TransitionMode::Sudden),
            _ => Err(()),
        }
    }
}

/// An operation against the bound device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetBrightness {
        level: u8,
        mode: TransitionMode,
        duration_ms: u64,
    },
    Toggle,
}

impl Command {
    pub fn method(&self) -> &'static str {
        match self {
            Command::SetBrightness { .. } => "set_bright",
            Command::Toggle => "toggle",
        }
    }

    fn params(&self) -> Value {
        match *self {
            Command::SetBrightness {
                level,
                mode,
                duration_ms,
            } => json!([level, mode.as_str(), duration_ms]),
            Command::Toggle => json!([]),
        }
    }

    /// Encode as a CRLF-terminated request line with the given request id.
    pub fn encode(&self, id: u64) -> String {
        let request = json!({
            "id": id,
            "method": self.method(),
            "params": self.params(),
        });
        format!("{}\r\n", request)
    }
}

/// Error object in a device response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
}

/// One line received from the device: a command reply or a notification.
#[derive(Debug, Deserialize)]
pub struct ResponseLine {
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ResponseError>,
    /// Set on unsolicited notifications ("props")
    #[serde(default)]
    pub method: Option<String>,
}

impl ResponseLine {
    pub fn is_notification(&self) -> bool {
        self.method.is_some()
    }
}

pub fn parse_response(line: &str) -> Result<ResponseLine, DeviceError> {
    serde_json::from_str(line).map_err(|e| DeviceError::Protocol(e.to_string()))
}
