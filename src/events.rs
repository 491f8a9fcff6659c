//! Wire-format message types for the connection gateway.
//!
//! Both directions use internally tagged JSON (`{"type": "led", ...}`).
//! The outbound vocabulary is LED / LASER / RGB / TEMPERATURE; the inbound
//! vocabulary is the same minus TEMPERATURE and minus the relay, which no
//! client can address.
//!
//! RGB payloads deserialize into `u8` duty cycles, so an out-of-range
//! channel value (`"red": 300`) is a parse error, not a hardware write.

use serde::{Deserialize, Serialize};

use crate::store::RgbValue;
use crate::traits::SensorId;

/// A state-change request arriving from a client connection.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientRequest {
    /// Set the LED on or off.
    Led {
        /// Requested LED state.
        status: bool,
    },
    /// Set the laser on or off.
    Laser {
        /// Requested laser state.
        status: bool,
    },
    /// Set all three RGB duty cycles.
    Rgb {
        /// Red channel duty cycle.
        red: u8,
        /// Green channel duty cycle.
        green: u8,
        /// Blue channel duty cycle.
        blue: u8,
    },
}

impl ClientRequest {
    /// Parse a request from a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// An event fanned out to every connected client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireEvent {
    /// LED state changed (or connect-time announcement).
    Led {
        /// Current LED state.
        status: bool,
    },
    /// Laser state changed (or connect-time announcement).
    Laser {
        /// Current laser state.
        status: bool,
    },
    /// RGB state changed (or connect-time announcement). Always the full
    /// triple, never a partial delta.
    Rgb {
        /// Red channel duty cycle.
        red: u8,
        /// Green channel duty cycle.
        green: u8,
        /// Blue channel duty cycle.
        blue: u8,
    },
    /// Periodic temperature sample from one probe.
    Temperature {
        /// Reading in degrees Celsius.
        status: f64,
        /// Id of the probe that produced the reading.
        sensor: SensorId,
    },
}

impl WireEvent {
    /// Build an RGB event from a stored triple.
    pub fn rgb(value: RgbValue) -> Self {
        WireEvent::Rgb {
            red: value.red,
            green: value.green,
            blue: value.blue,
        }
    }

    /// Serialize for a WebSocket text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
