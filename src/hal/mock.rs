//! Mock adapters for testing without hardware.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPins`] | [`PinAdapter`] | In-memory pin bank with write history |
//! | [`MockSensors`] | [`SensorAdapter`] | Scripted probe bus |
//!
//! Both record every operation in public fields so tests can assert on what
//! the hub actually did, not just on the resulting state.
//!
//! # Example
//!
//! ```rust
//! use gpio_hub::hal::MockPins;
//! use gpio_hub::traits::PinAdapter;
//!
//! let mut pins = MockPins::new();
//! pins.write_digital(17, true).unwrap();
//!
//! assert!(pins.read_digital(17).unwrap());
//! assert_eq!(pins.digital_writes, vec![(17, true)]);
//! ```
//!
//! [`PinAdapter`]: crate::traits::PinAdapter
//! [`SensorAdapter`]: crate::traits::SensorAdapter

use std::collections::HashMap;

use crate::traits::{PinAdapter, PinId, SensorAdapter, SensorId};

/// Error produced by the mock adapters when a failure is injected or a
/// released pin is touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockHalError(pub String);

impl core::fmt::Display for MockHalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Pin Mock
// ============================================================================

/// Mock pin bank for testing.
///
/// Tracks the level/duty applied to every pin, the full write history, and
/// which pins have been released. Physical state can be pre-loaded with
/// [`set_digital`](Self::set_digital) / [`set_pwm`](Self::set_pwm) to
/// simulate hardware that is already in some state (the readback the
/// engine's debounce compares against).
///
/// # Example
///
/// ```rust
/// use gpio_hub::hal::MockPins;
/// use gpio_hub::traits::PinAdapter;
///
/// let mut pins = MockPins::new();
/// pins.set_digital(17, true); // hardware already on, no write recorded
///
/// assert!(pins.read_digital(17).unwrap());
/// assert!(pins.digital_writes.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MockPins {
    digital: HashMap<PinId, bool>,
    pwm: HashMap<PinId, u8>,
    /// Every digital write issued, in order.
    pub digital_writes: Vec<(PinId, bool)>,
    /// Every PWM write issued, in order.
    pub pwm_writes: Vec<(PinId, u8)>,
    /// Pins released so far, in order.
    pub released: Vec<PinId>,
    fail_next: Option<String>,
}

impl MockPins {
    /// Creates a new mock pin bank with every pin reading low / zero duty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a digital pin's physical level without recording a write.
    pub fn set_digital(&mut self, pin: PinId, level: bool) {
        self.digital.insert(pin, level);
    }

    /// Pre-load a PWM channel's physical duty without recording a write.
    pub fn set_pwm(&mut self, pin: PinId, duty: u8) {
        self.pwm.insert(pin, duty);
    }

    /// Make the next operation fail with the given message.
    pub fn fail_next(&mut self, message: impl Into<String>) {
        self.fail_next = Some(message.into());
    }

    /// Number of digital writes issued to one pin.
    pub fn digital_write_count(&self, pin: PinId) -> usize {
        self.digital_writes.iter().filter(|(p, _)| *p == pin).count()
    }

    /// Number of PWM writes issued to one pin.
    pub fn pwm_write_count(&self, pin: PinId) -> usize {
        self.pwm_writes.iter().filter(|(p, _)| *p == pin).count()
    }

    fn take_failure(&mut self) -> Result<(), MockHalError> {
        match self.fail_next.take() {
            Some(message) => Err(MockHalError(message)),
            None => Ok(()),
        }
    }
}

impl PinAdapter for MockPins {
    type Error = MockHalError;

    fn write_digital(&mut self, pin: PinId, level: bool) -> Result<(), Self::Error> {
        self.take_failure()?;
        self.digital.insert(pin, level);
        self.digital_writes.push((pin, level));
        Ok(())
    }

    fn read_digital(&mut self, pin: PinId) -> Result<bool, Self::Error> {
        self.take_failure()?;
        Ok(self.digital.get(&pin).copied().unwrap_or(false))
    }

    fn write_pwm(&mut self, pin: PinId, duty: u8) -> Result<(), Self::Error> {
        self.take_failure()?;
        self.pwm.insert(pin, duty);
        self.pwm_writes.push((pin, duty));
        Ok(())
    }

    fn read_pwm(&mut self, pin: PinId) -> Result<u8, Self::Error> {
        self.take_failure()?;
        Ok(self.pwm.get(&pin).copied().unwrap_or(0))
    }

    fn release(&mut self, pin: PinId) -> Result<(), Self::Error> {
        self.take_failure()?;
        self.digital.remove(&pin);
        self.pwm.remove(&pin);
        self.released.push(pin);
        Ok(())
    }
}

// ============================================================================
// Sensor Mock
// ============================================================================

/// Mock temperature probe bus.
///
/// Probes are registered with [`with_sensor`](Self::with_sensor); each read
/// returns the registered value and bumps [`read_count`](Self::read_count).
///
/// # Example
///
/// ```rust
/// use gpio_hub::hal::MockSensors;
/// use gpio_hub::traits::SensorAdapter;
///
/// let mut sensors = MockSensors::new().with_sensor("28-000005e2fdc3", 21.5);
///
/// let ids = sensors.list_sensors().unwrap();
/// assert_eq!(ids, vec!["28-000005e2fdc3".to_string()]);
/// assert_eq!(sensors.read_celsius(&ids[0]).unwrap(), 21.5);
/// ```
#[derive(Debug, Default)]
pub struct MockSensors {
    ids: Vec<SensorId>,
    readings: HashMap<SensorId, f64>,
    /// Total number of successful reads.
    pub read_count: usize,
}

impl MockSensors {
    /// Creates a mock bus with no probes attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a probe and the value every read of it returns.
    pub fn with_sensor(mut self, id: impl Into<SensorId>, celsius: f64) -> Self {
        let id = id.into();
        self.ids.push(id.clone());
        self.readings.insert(id, celsius);
        self
    }
}

impl SensorAdapter for MockSensors {
    type Error = MockHalError;

    fn list_sensors(&mut self) -> Result<Vec<SensorId>, Self::Error> {
        Ok(self.ids.clone())
    }

    fn read_celsius(&mut self, id: &SensorId) -> Result<f64, Self::Error> {
        match self.readings.get(id) {
            Some(value) => {
                self.read_count += 1;
                Ok(*value)
            }
            None => Err(MockHalError(format!("unknown sensor {id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_pins_read_low() {
        let mut pins = MockPins::new();
        assert!(!pins.read_digital(4).unwrap());
        assert_eq!(pins.read_pwm(4).unwrap(), 0);
    }

    #[test]
    fn writes_are_recorded_in_order() {
        let mut pins = MockPins::new();
        pins.write_digital(17, true).unwrap();
        pins.write_digital(17, false).unwrap();
        pins.write_pwm(16, 128).unwrap();

        assert_eq!(pins.digital_writes, vec![(17, true), (17, false)]);
        assert_eq!(pins.pwm_writes, vec![(16, 128)]);
        assert_eq!(pins.digital_write_count(17), 2);
        assert_eq!(pins.pwm_write_count(16), 1);
    }

    #[test]
    fn readback_follows_writes() {
        let mut pins = MockPins::new();
        pins.write_digital(22, true).unwrap();
        assert!(pins.read_digital(22).unwrap());

        pins.write_pwm(20, 42).unwrap();
        assert_eq!(pins.read_pwm(20).unwrap(), 42);
    }

    #[test]
    fn release_clears_state() {
        let mut pins = MockPins::new();
        pins.write_digital(17, true).unwrap();
        pins.release(17).unwrap();

        assert_eq!(pins.released, vec![17]);
        assert!(!pins.read_digital(17).unwrap());
    }

    #[test]
    fn injected_failure_fires_once() {
        let mut pins = MockPins::new();
        pins.fail_next("pin busy");

        assert!(pins.write_digital(17, true).is_err());
        assert!(pins.write_digital(17, true).is_ok());
    }

    #[test]
    fn sensor_reads_are_counted() {
        let mut sensors = MockSensors::new().with_sensor("28-abc", 19.0);
        let id = "28-abc".to_string();
        sensors.read_celsius(&id).unwrap();
        sensors.read_celsius(&id).unwrap();
        assert_eq!(sensors.read_count, 2);
    }

    #[test]
    fn unknown_sensor_read_fails() {
        let mut sensors = MockSensors::new();
        assert!(sensors.read_celsius(&"28-missing".to_string()).is_err());
    }
}
