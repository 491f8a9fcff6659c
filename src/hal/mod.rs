//! Hardware adapter implementations.
//!
//! Concrete implementations of the traits defined in [`crate::traits`]:
//!
//! - `mock`: inspectable test doubles for desktop development
//! - `rpi`: Raspberry Pi GPIO via rppal and sysfs 1-Wire (requires the
//!   `rpi` feature)

pub mod mock;

#[cfg(feature = "rpi")]
pub mod rpi;

pub use mock::*;

#[cfg(feature = "rpi")]
pub use rpi::*;
