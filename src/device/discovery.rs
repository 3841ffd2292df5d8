//! SSDP-style discovery of the light on the local network
//!
//! Sends an M-SEARCH probe for `wifi_bulb` to the discovery group and joins
//! that group, so both direct probe replies and unsolicited advertisements
//! resolve the search. Discovery is one-shot: once a device has been accepted
//! the socket is dropped and later announcements are never observed. The wait
//! is bounded; a silent network yields [`DeviceError::DiscoveryTimeout`]
//! instead of hanging startup forever.

use crate::config::DiscoveryConfig;
use crate::error::DeviceError;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info};

/// The first device that answered the search probe.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Control-channel address from the announcement's Location header
    pub addr: SocketAddr,
    pub id: Option<String>,
    pub model: Option<String>,
}

/// Broadcast a search probe and wait for the first announcement.
pub async fn discover(config: &DiscoveryConfig) -> Result<DiscoveredDevice, DeviceError> {
    // Listen on the discovery port itself when it is free, so unsolicited
    // advertisements reach us as well as direct replies to the probe. If
    // another process already holds the port, probe replies alone still work.
    let socket = match UdpSocket::bind(("0.0.0.0", config.port)).await {
        Ok(socket) => socket,
        Err(_) => UdpSocket::bind(("0.0.0.0", 0)).await?,
    };
    if config.group.is_multicast() {
        socket.join_multicast_v4(config.group, Ipv4Addr::UNSPECIFIED)?;
    }

    let probe = format!(
        "M-SEARCH * HTTP/1.1\r\nHOST: {}:{}\r\nMAN: \"ssdp:discover\"\r\nST: wifi_bulb\r\n\r\n",
        config.group, config.port
    );
    socket
        .send_to(probe.as_bytes(), (config.group, config.port))
        .await?;
    debug!(group = %config.group, port = config.port, "search probe sent");

    let device = timeout(config.timeout, wait_for_announcement(&socket))
        .await
        .map_err(|_| DeviceError::DiscoveryTimeout)??;

    info!(addr = %device.addr, id = ?device.id, model = ?device.model, "device discovered");
    Ok(device)
}

async fn wait_for_announcement(socket: &UdpSocket) -> Result<DiscoveredDevice, DeviceError> {
    let mut buf = [0u8; 2048];
    loop {
        let (n, from) = socket.recv_from(&mut buf).await?;
        let text = String::from_utf8_lossy(&buf[..n]);
        match parse_announcement(&text) {
            Some(device) => return Ok(device),
            None => debug!(%from, "ignoring non-announcement datagram"),
        }
    }
}

/// Parse an SSDP announcement into a device, if it carries a usable Location.
fn parse_announcement(text: &str) -> Option<DiscoveredDevice> {
    let mut addr = None;
    let mut id = None;
    let mut model = None;

    for line in text.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "location" => {
                addr = value
                    .strip_prefix("yeelight://")
                    .and_then(|rest| rest.parse().ok());
            }
            "id" => id = Some(value.to_string()),
            "model" => model = Some(value.to_string()),
            _ => {}
        }
    }

    addr.map(|addr| DiscoveredDevice { addr, id, model })
}
