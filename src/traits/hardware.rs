//! Hardware abstraction traits for pin control and temperature sensing.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`PinAdapter`] | Digital on/off and PWM duty-cycle control with readback |
//! | [`SensorAdapter`] | Temperature probe enumeration and on-demand sampling |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mocks from
//! [`crate::hal::mock`]. On a Raspberry Pi, use the implementations from
//! `hal::rpi` (requires the `rpi` feature).
//!
//! All operations are synchronous and expected to complete in the time of a
//! single register access or bus read; callers issue them while holding the
//! hub lock and never across an await point.

/// BCM pin number.
pub type PinId = u8;

/// Temperature probe identifier as reported by the bus
/// (e.g. `28-000005e2fdc3` for a DS18B20).
pub type SensorId = String;

/// Pin driver trait - abstracts digital and PWM output control.
///
/// Implement this for your GPIO stack. The hub drives three digital pins
/// (LED, laser, relay) and three PWM channels (RGB), addressed by the pin
/// numbers from the pin layout config.
///
/// # Implementation Notes
///
/// - `read_digital`/`read_pwm` must report the value currently applied to
///   the pin; the engine's write coalescing relies on this readback.
/// - `release` returns the pin to an unclaimed state. Operations on a
///   released pin may fail.
/// - Duty cycles are 0-255, where 0 is fully off.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use gpio_hub::traits::{PinAdapter, PinId};
///
/// struct MyPins { /* driver handles */ }
///
/// impl PinAdapter for MyPins {
///     type Error = std::io::Error;
///
///     fn write_digital(&mut self, pin: PinId, level: bool) -> Result<(), Self::Error> {
///         // Drive the pin high or low...
///         Ok(())
///     }
///     // ...
/// }
/// ```
pub trait PinAdapter {
    /// Error type for pin operations.
    type Error: core::fmt::Display;

    /// Drive a digital pin high (`true`) or low (`false`).
    fn write_digital(&mut self, pin: PinId, level: bool) -> Result<(), Self::Error>;

    /// Read back the level currently applied to a digital pin.
    fn read_digital(&mut self, pin: PinId) -> Result<bool, Self::Error>;

    /// Set a PWM channel's duty cycle (0-255).
    fn write_pwm(&mut self, pin: PinId, duty: u8) -> Result<(), Self::Error>;

    /// Read back the duty cycle currently applied to a PWM channel.
    fn read_pwm(&mut self, pin: PinId) -> Result<u8, Self::Error>;

    /// Release the pin binding and any driver resources behind it.
    fn release(&mut self, pin: PinId) -> Result<(), Self::Error>;
}

/// Temperature probe bus trait.
///
/// Abstracts a 1-Wire-style bus: enumerate attached probe ids once, then
/// sample any probe on demand. Filtering by device family (the hub only
/// samples DS18B20-class probes) is the caller's concern, not the bus's.
pub trait SensorAdapter {
    /// Error type for sensor operations.
    type Error: core::fmt::Display;

    /// List the ids of all probes currently on the bus.
    fn list_sensors(&mut self) -> Result<Vec<SensorId>, Self::Error>;

    /// Sample one probe, returning degrees Celsius.
    fn read_celsius(&mut self, id: &SensorId) -> Result<f64, Self::Error>;
}
