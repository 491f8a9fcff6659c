//! In-memory record of the last-confirmed logical value of each actuator.
//!
//! The store is the single authoritative source for actuator state; the
//! physical pins are treated as eventually consistent with it and are
//! re-read before every write decision (see [`crate::engine`]). The store
//! itself carries no locking: it is owned by the [`SyncEngine`] and all
//! access is serialized one level up by [`SharedHub`].
//!
//! [`SyncEngine`]: crate::engine::SyncEngine
//! [`SharedHub`]: crate::hub::SharedHub

use serde::{Deserialize, Serialize};

/// A physical output controlled by the hub.
///
/// Used in diagnostics and error reporting; the client-facing request
/// vocabulary is narrower (see [`Switch`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actuator {
    /// Status LED (digital on/off).
    Led,
    /// Laser diode (digital on/off).
    Laser,
    /// Relay, driven only by the server's own timer cycle.
    Relay,
    /// RGB LED bank (three PWM channels).
    Rgb,
}

impl Actuator {
    /// Lowercase name, matching the wire event vocabulary.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Actuator::Led => "led",
            Actuator::Laser => "laser",
            Actuator::Relay => "relay",
            Actuator::Rgb => "rgb",
        }
    }
}

impl core::fmt::Display for Actuator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The binary actuators a client may set.
///
/// The relay is deliberately absent: relay state is owned by the server's
/// timer cycle, so "clients cannot switch the relay" holds at the type
/// level rather than by a runtime check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Switch {
    /// Status LED.
    Led,
    /// Laser diode.
    Laser,
}

impl Switch {
    /// The corresponding [`Actuator`], for diagnostics.
    #[inline]
    pub const fn actuator(&self) -> Actuator {
        match self {
            Switch::Led => Actuator::Led,
            Switch::Laser => Actuator::Laser,
        }
    }
}

/// Duty cycles for the three RGB channels.
///
/// `u8` makes the 0-255 duty range a type invariant: out-of-range JSON
/// payloads fail deserialization at the gateway and never reach hardware.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbValue {
    /// Red channel duty cycle.
    pub red: u8,
    /// Green channel duty cycle.
    pub green: u8,
    /// Blue channel duty cycle.
    pub blue: u8,
}

impl RgbValue {
    /// All channels at zero duty.
    pub const OFF: RgbValue = RgbValue {
        red: 0,
        green: 0,
        blue: 0,
    };

    /// Construct from the three channel duties.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Channel duties in red, green, blue order.
    pub const fn channels(&self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

/// Last-confirmed logical value of every actuator.
///
/// Created at service start with everything off; mutated only by the
/// engine (LED/LASER/RGB via client requests, relay via the timer cycle);
/// dropped at process exit.
#[derive(Clone, Debug, Default)]
pub struct ActuatorStore {
    led: bool,
    laser: bool,
    relay: bool,
    rgb: RgbValue,
}

impl ActuatorStore {
    /// New store with all actuators off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a client-settable switch.
    #[inline]
    pub fn switch(&self, which: Switch) -> bool {
        match which {
            Switch::Led => self.led,
            Switch::Laser => self.laser,
        }
    }

    /// Record a confirmed switch value.
    #[inline]
    pub fn set_switch(&mut self, which: Switch, on: bool) {
        match which {
            Switch::Led => self.led = on,
            Switch::Laser => self.laser = on,
        }
    }

    /// Current relay value.
    #[inline]
    pub fn relay(&self) -> bool {
        self.relay
    }

    /// Record a confirmed relay value.
    #[inline]
    pub fn set_relay(&mut self, on: bool) {
        self.relay = on;
    }

    /// Current RGB duty cycles.
    #[inline]
    pub fn rgb(&self) -> RgbValue {
        self.rgb
    }

    /// Record a confirmed RGB triple.
    #[inline]
    pub fn set_rgb(&mut self, rgb: RgbValue) {
        self.rgb = rgb;
    }

    /// Copy of the whole store for the state endpoint.
    pub fn snapshot(&self) -> ActuatorSnapshot {
        ActuatorSnapshot {
            led: self.led,
            laser: self.laser,
            relay: self.relay,
            rgb: self.rgb,
        }
    }
}

/// Serializable copy of the store, returned by `GET /api/state`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorSnapshot {
    /// LED on/off.
    pub led: bool,
    /// Laser on/off.
    pub laser: bool,
    /// Relay on/off (server-driven).
    pub relay: bool,
    /// RGB duty cycles.
    pub rgb: RgbValue,
}
