//! Persistent control session with automatic reconnection
//!
//! The session is the one shared mutable resource in the process: a single
//! actor task owns the TCP channel and processes one command at a time, so
//! concurrent callers can never interleave partial protocol writes. Callers
//! hold cloneable [`SessionHandle`]s and observe the state through a watch
//! channel; only the actor mutates it.

use crate::config::{DiscoveryConfig, SessionConfig};
use crate::device::discovery::{self, DiscoveredDevice};
use crate::device::protocol::{self, Command};
use crate::error::DeviceError;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Lifecycle of the control session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Discovering,
    Connecting,
    Connected,
    Disconnected,
}

type CommandRequest = (Command, oneshot::Sender<Result<(), DeviceError>>);

/// Owns discovery of the target device and the control connection to it.
pub struct DeviceSession;

impl DeviceSession {
    /// Discover the first announcing device and open the control session.
    ///
    /// The first device wins and stays bound for the process lifetime;
    /// discovery never re-runs, even across reconnections.
    pub async fn establish(
        discovery: &DiscoveryConfig,
        config: SessionConfig,
    ) -> Result<SessionHandle, DeviceError> {
        let device: DiscoveredDevice = discovery::discover(discovery).await?;
        Ok(Self::connect(device.addr, config))
    }

    /// Open the control session to a known address and start the session
    /// actor. Returns immediately; the handle reports progress via its state.
    pub fn connect(addr: SocketAddr, config: SessionConfig) -> SessionHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel::<CommandRequest>(16);
        let (state_tx, state_rx) = watch::channel(SessionState::Discovering);

        tokio::spawn(async move {
            session_loop(addr, config, cmd_rx, state_tx).await;
        });

        SessionHandle { cmd_tx, state_rx }
    }
}

/// Cloneable handle for issuing ordered commands against the bound device.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<CommandRequest>,
    state_rx: watch::Receiver<SessionState>,
}

impl SessionHandle {
    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state transitions.
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Issue a command and wait for the device's acknowledgement.
    ///
    /// Fails fast with [`DeviceError::NotConnected`] while the link is down;
    /// nothing is buffered for later. A transport failure mid-command surfaces
    /// as [`DeviceError::CommandFailed`] and triggers reconnection, with no
    /// retry of the failed command.
    pub async fn command(&self, command: Command) -> Result<(), DeviceError> {
        if self.state() != SessionState::Connected {
            return Err(DeviceError::NotConnected);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send((command, reply_tx))
            .await
            .map_err(|_| DeviceError::NotConnected)?;
        reply_rx.await.map_err(|_| DeviceError::NotConnected)?
    }
}

/// Connect/reconnect loop with exponential backoff.
async fn session_loop(
    addr: SocketAddr,
    config: SessionConfig,
    mut cmd_rx: mpsc::Receiver<CommandRequest>,
    state_tx: watch::Sender<SessionState>,
) {
    let mut reconnect_delay = config.reconnect_delay;

    loop {
        let _ = state_tx.send(SessionState::Connecting);

        match timeout(config.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                info!(%addr, "control session established");
                reconnect_delay = config.reconnect_delay;
                let _ = state_tx.send(SessionState::Connected);

                match drive_session(stream, &config, &mut cmd_rx).await {
                    Ok(()) => {
                        // All handles dropped; nothing left to serve.
                        return;
                    }
                    Err(e) => warn!(%addr, error = %e, "control session lost"),
                }
                let _ = state_tx.send(SessionState::Disconnected);
            }
            Ok(Err(e)) => {
                warn!(%addr, error = %e, "connect failed");
                let _ = state_tx.send(SessionState::Disconnected);
            }
            Err(_) => {
                warn!(%addr, "connect timed out");
                let _ = state_tx.send(SessionState::Disconnected);
            }
        }

        // Fail fast while down: drain command requests instead of buffering
        // them across the outage. Missed actions are live signals that will
        // simply recur.
        let wait = tokio::time::sleep(reconnect_delay);
        tokio::pin!(wait);
        loop {
            tokio::select! {
                _ = &mut wait => break,
                request = cmd_rx.recv() => match request {
                    Some((_, reply_tx)) => {
                        let _ = reply_tx.send(Err(DeviceError::NotConnected));
                    }
                    None => return,
                },
            }
        }
        reconnect_delay = std::cmp::min(reconnect_delay * 2, config.max_reconnect_delay);
    }
}

/// Serve commands over an active connection until the link fails.
///
/// Returns `Ok(())` only when every handle has been dropped.
async fn drive_session(
    stream: TcpStream,
    config: &SessionConfig,
    cmd_rx: &mut mpsc::Receiver<CommandRequest>,
) -> Result<(), DeviceError> {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    let mut request_id: u64 = 0;

    while let Some((command, reply_tx)) = cmd_rx.recv().await {
        request_id += 1;

        match issue(&mut writer, &mut reader, &mut line, &command, request_id, config.command_timeout)
            .await
        {
            Ok(()) => {
                debug!(?command, request_id, "command acknowledged");
                let _ = reply_tx.send(Ok(()));
            }
            Err(DeviceError::Device { code, message }) => {
                // The link is fine; the device just refused the operation.
                warn!(?command, code, %message, "device rejected command");
                let _ = reply_tx.send(Err(DeviceError::Device { code, message }));
            }
            Err(e) => {
                let surfaced = match &e {
                    DeviceError::CommandFailed(msg) => DeviceError::CommandFailed(msg.clone()),
                    other => DeviceError::CommandFailed(other.to_string()),
                };
                let _ = reply_tx.send(Err(surfaced));
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Write one request and wait for the matching reply, skipping unsolicited
/// property notifications on the way.
async fn issue(
    writer: &mut OwnedWriteHalf,
    reader: &mut BufReader<OwnedReadHalf>,
    line: &mut String,
    command: &Command,
    request_id: u64,
    command_timeout: Duration,
) -> Result<(), DeviceError> {
    writer.write_all(command.encode(request_id).as_bytes()).await?;

    let read_reply = async {
        loop {
            line.clear();
            let n = reader.read_line(line).await?;
            if n == 0 {
                return Err(DeviceError::Connection(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "device closed connection",
                )));
            }

            let reply = protocol::parse_response(line.trim())?;
            if reply.is_notification() || reply.id != Some(request_id) {
                continue;
            }
            if let Some(error) = reply.error {
                return Err(DeviceError::Device {
                    code: error.code,
                    message: error.message,
                });
            }
            debug!(request_id, result = ?reply.result, "device reply");
            return Ok(());
        }
    };

    match timeout(command_timeout, read_reply).await {
        Ok(result) => result,
        Err(_) => Err(DeviceError::CommandFailed(
            "timed out waiting for device reply".into(),
        )),
    }
}
