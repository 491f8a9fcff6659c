//! Error types for the hub.
//!
//! Three failure classes with different blast radii:
//!
//! - [`HubError::Config`] - invalid pin mapping or unreadable config file.
//!   Fatal: construction does not proceed.
//! - [`HubError::Hardware`] - a pin read/write failed at runtime. Scoped to
//!   the request or cycle tick that issued it; the process and the other
//!   cycles keep running.
//! - [`HubError::Sensor`] - probe enumeration or a temperature sample
//!   failed. Scoped to the current tick.

use core::fmt;

use crate::store::Actuator;
use crate::traits::PinId;

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Missing or invalid configuration. Startup-fatal.
    #[error("configuration error: {0}")]
    Config(String),

    /// A pin adapter operation failed.
    #[error("hardware fault on {actuator} (pin {pin}): {message}")]
    Hardware {
        /// The actuator whose pin was being driven or read.
        actuator: Actuator,
        /// The physical pin involved.
        pin: PinId,
        /// Adapter-reported failure description.
        message: String,
    },

    /// A sensor adapter operation failed.
    #[error("sensor fault: {0}")]
    Sensor(String),
}

impl HubError {
    /// Build a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        HubError::Config(message.into())
    }

    /// Map an adapter failure onto the actuator/pin it hit.
    pub fn hardware(actuator: Actuator, pin: PinId, err: impl fmt::Display) -> Self {
        HubError::Hardware {
            actuator,
            pin,
            message: err.to_string(),
        }
    }

    /// Map a sensor adapter failure.
    pub fn sensor(err: impl fmt::Display) -> Self {
        HubError::Sensor(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_error_names_actuator_and_pin() {
        let err = HubError::hardware(Actuator::Laser, 27, "pin busy");
        let msg = err.to_string();
        assert!(msg.contains("laser"));
        assert!(msg.contains("27"));
        assert!(msg.contains("pin busy"));
    }

    #[test]
    fn config_error_message() {
        let err = HubError::config("duplicate pin 17");
        assert_eq!(err.to_string(), "configuration error: duplicate pin 17");
    }
}
