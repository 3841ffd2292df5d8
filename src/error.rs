//! Error taxonomy for discovery, connection, and command delivery

use std::io;
use thiserror::Error;

/// Failures on the device side of the bridge.
///
/// `DiscoveryTimeout` is fatal at startup (no device to control). Everything
/// else is recoverable: the session reconnects on its own and commands issued
/// meanwhile fail fast instead of buffering.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no device responded to discovery within the timeout")]
    DiscoveryTimeout,

    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    #[error("not connected to the device")]
    NotConnected,

    #[error("command failed: {0}")]
    CommandFailed(String),

    #[error("device rejected command (code {code}): {message}")]
    Device { code: i64, message: String },

    #[error("protocol error: {0}")]
    Protocol(String),
}
