//! Runtime configuration with defaults and environment overrides

use crate::device::TransitionMode;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Top-level configuration for the bridge process.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Bind address for the HTTP control surface
    pub http_bind: String,
    pub discovery: DiscoveryConfig,
    pub session: SessionConfig,
    pub gate: GateConfig,
    pub debounce: DebounceConfig,
    pub brightness: BrightnessPresets,
}

/// Configuration for SSDP-style device discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Multicast group the search probe is sent to
    pub group: Ipv4Addr,
    /// Discovery port (1982 for Yeelight-compatible bulbs)
    pub port: u16,
    /// How long to wait for the first announcement
    pub timeout: Duration,
}

/// Configuration for the persistent control session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// How long to wait for the device's reply to a command
    pub command_timeout: Duration,
    /// Reconnection delay (initial)
    pub reconnect_delay: Duration,
    /// Maximum reconnection delay
    pub max_reconnect_delay: Duration,
}

/// Per-category cooldown windows for the action gate.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub toggle_cooldown: Duration,
    pub brightness_cooldown: Duration,
}

/// Thresholds for gesture delta acceptance.
#[derive(Debug, Clone)]
pub struct DebounceConfig {
    /// Deltas at or below this are hand jitter
    pub min_delta: f64,
    /// Deltas at or above this are tracking glitches
    pub max_delta: f64,
}

/// Two-level brightness control presets.
#[derive(Debug, Clone)]
pub struct BrightnessPresets {
    pub high: u8,
    pub low: u8,
    /// Transition style passed to the device
    pub mode: TransitionMode,
    /// Transition duration passed to the device
    pub transition_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            http_bind: "0.0.0.0:3000".into(),
            discovery: DiscoveryConfig::default(),
            session: SessionConfig::default(),
            gate: GateConfig::default(),
            debounce: DebounceConfig::default(),
            brightness: BrightnessPresets::default(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(239, 255, 255, 250),
            port: 1982,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(2),
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            toggle_cooldown: Duration::from_millis(1000),
            brightness_cooldown: Duration::from_millis(1500),
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            min_delta: 0.1,
            max_delta: 0.6,
        }
    }
}

impl Default for BrightnessPresets {
    fn default() -> Self {
        Self {
            high: 95,
            low: 5,
            mode: TransitionMode::Smooth,
            transition_ms: 1000,
        }
    }
}

impl BridgeConfig {
    /// Load the configuration, applying environment overrides to the defaults.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("LIGHTBRIDGE_HTTP_BIND") {
            config.http_bind = v;
        }
        if let Ok(v) = std::env::var("LIGHTBRIDGE_DISCOVERY_PORT") {
            if let Ok(port) = v.parse() {
                config.discovery.port = port;
            }
        }
        if let Ok(v) = std::env::var("LIGHTBRIDGE_DISCOVERY_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() {
                config.discovery.timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(v) = std::env::var("LIGHTBRIDGE_TRANSITION_MODE") {
            if let Ok(mode) = v.parse() {
                config.brightness.mode = mode;
            }
        }

        config
    }
}
