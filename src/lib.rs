//! # gpio-hub
//!
//! A Raspberry Pi actuator hub: an LED, a laser diode, an RGB LED bank and
//! a relay, plus DS18B20 temperature probes, exposed to remote clients over
//! a persistent WebSocket connection with every state change fanned out to
//! every client in real time.
//!
//! ## Features
//!
//! - **Write coalescing**: a request matching observed hardware state
//!   issues no write and no broadcast
//! - **Atomic RGB updates**: any channel change rewrites all three and
//!   broadcasts the full triple
//! - **Autonomous relay**: toggled by a server timer, out of client reach
//! - **Periodic temperature broadcasts**: one sampling loop per probe
//! - **Deterministic teardown**: outputs safe, pins released, cycles
//!   stopped, exactly once, on exit or interrupt
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - pin and sensor capability abstractions
//! - `store` - last-confirmed logical value per actuator
//! - `engine` - the state-sync core: validate, coalesce, write, broadcast
//! - `hub` - shared access for gateway and cycles
//! - `cycles` - the relay and temperature background loops
//! - `lifecycle` - exactly-once teardown and exit codes
//! - `hal` - concrete adapters (mock for testing, `rpi` for hardware)
//! - `services` - the WebSocket/REST gateway (feature `web`)
//!
//! ## Example
//!
//! ```rust
//! use gpio_hub::config::PinLayout;
//! use gpio_hub::engine::{ApplyOutcome, SyncEngine};
//! use gpio_hub::hal::MockPins;
//! use gpio_hub::store::{RgbValue, Switch};
//!
//! let mut engine = SyncEngine::new(MockPins::new(), PinLayout::default()).unwrap();
//!
//! // Turn the LED on: written to hardware and broadcast.
//! assert_eq!(engine.apply_switch(Switch::Led, true).unwrap(), ApplyOutcome::Written);
//!
//! // A second identical request is coalesced.
//! assert_eq!(engine.apply_switch(Switch::Led, true).unwrap(), ApplyOutcome::Skipped);
//!
//! // RGB updates are all-or-nothing.
//! assert_eq!(
//!     engine.apply_rgb(RgbValue::new(10, 10, 10)).unwrap(),
//!     ApplyOutcome::Written,
//! );
//! ```

#![warn(missing_docs)]

/// Pin layout and gateway configuration.
pub mod config;
/// The relay toggle and temperature sampling background loops.
pub mod cycles;
/// The state-synchronization engine.
pub mod engine;
/// Error taxonomy.
pub mod error;
/// Wire-format message types.
pub mod events;
/// Concrete hardware adapters (mock, and `rpi` behind its feature).
pub mod hal;
/// Shared engine access for gateway and cycles.
pub mod hub;
/// Exactly-once teardown and exit codes.
pub mod lifecycle;
/// The actuator state store.
pub mod store;
/// Hardware capability traits.
pub mod traits;

/// The WebSocket/REST connection gateway (feature-gated).
#[cfg(feature = "web")]
pub mod services;

// Re-exports for convenience
pub use config::{Config, GatewayConfig, PinLayout};
pub use cycles::{Cycles, RelayCycle, TemperatureCycle, CYCLE_PERIOD, DS18B20_FAMILY_PREFIX};
pub use engine::{ApplyOutcome, SyncEngine};
pub use error::HubError;
pub use events::{ClientRequest, WireEvent};
pub use hub::SharedHub;
pub use lifecycle::{ExitReason, Lifecycle};
pub use store::{Actuator, ActuatorSnapshot, ActuatorStore, RgbValue, Switch};
pub use traits::{PinAdapter, PinId, SensorAdapter, SensorId};

#[cfg(feature = "web")]
pub use services::{build_router, run_gateway, ApiResponse};
