//! Raspberry Pi adapters: rppal GPIO and sysfs 1-Wire.
//!
//! [`RpiPins`] claims pins lazily on first use and keeps them claimed until
//! [`release`](crate::traits::PinAdapter::release). RGB channels use
//! rppal's software PWM; the applied duty is tracked adapter-side because
//! soft PWM has no hardware readback.
//!
//! [`W1Sensors`] reads DS18B20-class probes through the kernel's 1-Wire
//! sysfs interface (`/sys/bus/w1/devices/<id>/w1_slave`); the `w1-gpio`
//! and `w1-therm` overlays must be enabled.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use rppal::gpio::{Gpio, OutputPin};

use crate::traits::{PinAdapter, PinId, SensorAdapter, SensorId};

/// Software PWM frequency for the RGB channels, in hertz.
///
/// High enough that the LEDs show no visible flicker, low enough to keep
/// soft-PWM CPU cost negligible.
const PWM_FREQUENCY_HZ: f64 = 800.0;

// ============================================================================
// Pins
// ============================================================================

/// [`PinAdapter`] backed by rppal.
pub struct RpiPins {
    gpio: Gpio,
    outputs: HashMap<PinId, OutputPin>,
    // Applied soft-PWM duty per pin; rppal cannot read it back.
    duty: HashMap<PinId, u8>,
}

impl RpiPins {
    /// Open the GPIO peripheral.
    ///
    /// Fails when not running on a Raspberry Pi or when `/dev/gpiomem` is
    /// inaccessible.
    pub fn open() -> Result<Self, rppal::gpio::Error> {
        Ok(Self {
            gpio: Gpio::new()?,
            outputs: HashMap::new(),
            duty: HashMap::new(),
        })
    }

    fn output(&mut self, pin: PinId) -> Result<&mut OutputPin, rppal::gpio::Error> {
        match self.outputs.entry(pin) {
            Entry::Occupied(claimed) => Ok(claimed.into_mut()),
            Entry::Vacant(slot) => Ok(slot.insert(self.gpio.get(pin)?.into_output_low())),
        }
    }
}

impl PinAdapter for RpiPins {
    type Error = rppal::gpio::Error;

    fn write_digital(&mut self, pin: PinId, level: bool) -> Result<(), Self::Error> {
        let output = self.output(pin)?;
        if level {
            output.set_high();
        } else {
            output.set_low();
        }
        Ok(())
    }

    fn read_digital(&mut self, pin: PinId) -> Result<bool, Self::Error> {
        Ok(self.output(pin)?.is_set_high())
    }

    fn write_pwm(&mut self, pin: PinId, duty: u8) -> Result<(), Self::Error> {
        let output = self.output(pin)?;
        output.set_pwm_frequency(PWM_FREQUENCY_HZ, f64::from(duty) / 255.0)?;
        self.duty.insert(pin, duty);
        Ok(())
    }

    fn read_pwm(&mut self, pin: PinId) -> Result<u8, Self::Error> {
        Ok(self.duty.get(&pin).copied().unwrap_or(0))
    }

    fn release(&mut self, pin: PinId) -> Result<(), Self::Error> {
        if let Some(mut output) = self.outputs.remove(&pin) {
            // Stop soft PWM before the pin reverts to an input on drop.
            if self.duty.remove(&pin).is_some() {
                output.clear_pwm()?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Sensors
// ============================================================================

/// [`SensorAdapter`] over the kernel 1-Wire sysfs tree.
pub struct W1Sensors {
    devices_dir: PathBuf,
}

impl W1Sensors {
    /// Use the standard sysfs location.
    pub fn new() -> Self {
        Self {
            devices_dir: PathBuf::from("/sys/bus/w1/devices"),
        }
    }

    /// Use an alternate devices directory (tests, chroots).
    pub fn with_devices_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            devices_dir: dir.into(),
        }
    }

    fn parse_w1_slave(raw: &str) -> Result<f64, io::Error> {
        // Second line ends in "t=<milli-degrees>"; first line must end in
        // "YES" (CRC ok) or the sample is discarded.
        let mut lines = raw.lines();
        let crc_line = lines
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "empty w1_slave"))?;
        if !crc_line.trim_end().ends_with("YES") {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "CRC check failed"));
        }
        let temp_line = lines
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing temperature line"))?;
        let milli: i32 = temp_line
            .rsplit("t=")
            .next()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing t= field"))?;
        Ok(f64::from(milli) / 1000.0)
    }
}

impl Default for W1Sensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorAdapter for W1Sensors {
    type Error = io::Error;

    fn list_sensors(&mut self) -> Result<Vec<SensorId>, Self::Error> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.devices_dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            // The bus master itself shows up alongside the probes.
            if !name.starts_with("w1_bus_master") {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn read_celsius(&mut self, id: &SensorId) -> Result<f64, Self::Error> {
        let raw = std::fs::read_to_string(self.devices_dir.join(id).join("w1_slave"))?;
        Self::parse_w1_slave(&raw)
    }
}
