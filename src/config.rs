//! Configuration: pin layout and gateway settings.
//!
//! The pin layout file is JSON with SCREAMING_SNAKE keys, so existing
//! `gpio.config.json` files from deployed hubs keep working unchanged:
//!
//! ```json
//! {
//!   "LED_PIN": 17,
//!   "LASER_PIN": 27,
//!   "RELAY_PIN": 22,
//!   "RGB_RED_PIN": 16,
//!   "RGB_GREEN_PIN": 20,
//!   "RGB_BLUE_PIN": 21
//! }
//! ```
//!
//! # Example
//!
//! ```rust
//! use gpio_hub::config::{Config, GatewayConfig, PinLayout};
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Or customize
//! let config = Config::default()
//!     .with_pins(PinLayout::default().with_led(5))
//!     .with_gateway(GatewayConfig::default().with_port(3000));
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HubError;
use crate::store::Switch;
use crate::traits::PinId;

// ============================================================================
// Pin Layout
// ============================================================================

/// Mapping from logical actuator to physical BCM pin.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PinLayout {
    /// LED pin.
    #[serde(rename = "LED_PIN")]
    pub led: PinId,
    /// Laser diode pin.
    #[serde(rename = "LASER_PIN")]
    pub laser: PinId,
    /// Relay pin.
    #[serde(rename = "RELAY_PIN")]
    pub relay: PinId,
    /// RGB red channel pin.
    #[serde(rename = "RGB_RED_PIN")]
    pub rgb_red: PinId,
    /// RGB green channel pin.
    #[serde(rename = "RGB_GREEN_PIN")]
    pub rgb_green: PinId,
    /// RGB blue channel pin.
    #[serde(rename = "RGB_BLUE_PIN")]
    pub rgb_blue: PinId,
}

impl Default for PinLayout {
    fn default() -> Self {
        Self {
            led: 17,
            laser: 27,
            relay: 22,
            rgb_red: 16,
            rgb_green: 20,
            rgb_blue: 21,
        }
    }
}

impl PinLayout {
    /// Load and validate a layout from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, HubError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HubError::config(format!("cannot read {}: {e}", path.display())))?;
        let layout: PinLayout = serde_json::from_str(&raw)
            .map_err(|e| HubError::config(format!("invalid pin config {}: {e}", path.display())))?;
        layout.validate()?;
        Ok(layout)
    }

    /// Reject layouts that assign one physical pin to two actuators.
    pub fn validate(&self) -> Result<(), HubError> {
        let mut pins = self.all_pins();
        pins.sort_unstable();
        for pair in pins.windows(2) {
            if pair[0] == pair[1] {
                return Err(HubError::config(format!(
                    "pin {} is assigned to more than one actuator",
                    pair[0]
                )));
            }
        }
        Ok(())
    }

    /// The digital pin behind a client-settable switch.
    #[inline]
    pub fn switch_pin(&self, which: Switch) -> PinId {
        match which {
            Switch::Led => self.led,
            Switch::Laser => self.laser,
        }
    }

    /// RGB channel pins in red, green, blue order.
    #[inline]
    pub fn rgb_pins(&self) -> [PinId; 3] {
        [self.rgb_red, self.rgb_green, self.rgb_blue]
    }

    /// Every configured pin.
    pub fn all_pins(&self) -> Vec<PinId> {
        vec![
            self.led,
            self.laser,
            self.relay,
            self.rgb_red,
            self.rgb_green,
            self.rgb_blue,
        ]
    }

    /// Set the LED pin.
    pub fn with_led(mut self, pin: PinId) -> Self {
        self.led = pin;
        self
    }

    /// Set the laser pin.
    pub fn with_laser(mut self, pin: PinId) -> Self {
        self.laser = pin;
        self
    }

    /// Set the relay pin.
    pub fn with_relay(mut self, pin: PinId) -> Self {
        self.relay = pin;
        self
    }

    /// Set the three RGB channel pins.
    pub fn with_rgb(mut self, red: PinId, green: PinId, blue: PinId) -> Self {
        self.rgb_red = red;
        self.rgb_green = green;
        self.rgb_blue = blue;
        self
    }
}

// ============================================================================
// Gateway Config
// ============================================================================

/// Connection gateway configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS for all origins.
    pub cors_permissive: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_permissive: true,
        }
    }
}

impl GatewayConfig {
    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode.
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Override the port from the `PORT` environment variable, if set.
    ///
    /// An unparsable value is ignored and logged rather than fatal.
    pub fn with_port_from_env(mut self) -> Self {
        if let Ok(raw) = std::env::var("PORT") {
            match raw.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(value = %raw, "ignoring unparsable PORT"),
            }
        }
        self
    }
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Actuator pin assignments.
    pub pins: PinLayout,
    /// Gateway settings.
    pub gateway: GatewayConfig,
}

impl Config {
    /// Set the pin layout.
    pub fn with_pins(mut self, pins: PinLayout) -> Self {
        self.pins = pins;
        self
    }

    /// Set the gateway config.
    pub fn with_gateway(mut self, gateway: GatewayConfig) -> Self {
        self.gateway = gateway;
        self
    }
}
