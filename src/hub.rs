//! Shared access to a single [`SyncEngine`] for all services.
//!
//! The gateway's connection handlers and the relay cycle all mutate the
//! same engine; `SharedHub` wraps it in a single `Mutex` (request volume
//! is low and every hardware call is fast, so one global lock is simpler
//! than per-actuator locking and costs nothing in practice).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gpio_hub::hub::SharedHub;
//!
//! let hub = Arc::new(SharedHub::new(engine));
//!
//! // Gateway applies a request
//! hub.with_engine(|engine| engine.apply_switch(Switch::Led, true));
//!
//! // Relay cycle ticks
//! hub.with_engine(|engine| engine.toggle_relay());
//!
//! // Connections listen for fan-out
//! let mut rx = hub.subscribe();
//! ```

use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::engine::SyncEngine;
use crate::events::WireEvent;
use crate::store::ActuatorSnapshot;
use crate::traits::PinAdapter;

/// Thread-safe wrapper around the engine plus the event fan-out channel.
///
/// The sender is kept outside the lock so subscribing never contends with
/// request handling.
pub struct SharedHub<P: PinAdapter> {
    engine: Mutex<SyncEngine<P>>,
    events: broadcast::Sender<WireEvent>,
}

impl<P: PinAdapter> SharedHub<P> {
    /// Wrap an engine for sharing.
    pub fn new(engine: SyncEngine<P>) -> Self {
        let events = engine.sender();
        Self {
            engine: Mutex::new(engine),
            events,
        }
    }

    /// Access the engine under the lock.
    ///
    /// The closure pattern keeps the lock from being held across await
    /// points; hardware calls inside are synchronous and fast.
    pub fn with_engine<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut SyncEngine<P>) -> R,
    {
        let mut guard = self.engine.lock().unwrap();
        f(&mut guard)
    }

    /// Subscribe to the broadcast event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<WireEvent> {
        self.events.subscribe()
    }

    /// Sender half of the event stream (for the temperature cycle).
    pub fn sender(&self) -> broadcast::Sender<WireEvent> {
        self.events.clone()
    }

    /// Current logical state of every actuator (brief lock).
    pub fn snapshot(&self) -> ActuatorSnapshot {
        self.engine.lock().unwrap().snapshot()
    }
}
