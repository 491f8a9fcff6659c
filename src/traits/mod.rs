//! Capability traits for the external hardware collaborators.
//!
//! The hub core never talks to GPIO or the 1-Wire bus directly; it goes
//! through these traits, which allows the whole system to run on desktop
//! with the mocks from [`crate::hal::mock`] and on a Raspberry Pi with the
//! `rpi`-feature implementations.
//!
//! - [`PinAdapter`]: digital and PWM pin control with readback
//! - [`SensorAdapter`]: temperature probe enumeration and sampling

pub mod hardware;

pub use hardware::*;
