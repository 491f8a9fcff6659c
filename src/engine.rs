//! The state-synchronization engine.
//!
//! [`SyncEngine`] owns the pin adapter, the [`ActuatorStore`] and the
//! broadcast sender, and is the only component that writes either. Every
//! state-change request funnels through here, as do the relay cycle's
//! toggles and the lifecycle manager's teardown.
//!
//! # Write coalescing
//!
//! Before any physical write, the engine reads the pin back and compares
//! against the requested value. A request that matches observed hardware
//! state is absorbed: no write is issued and no event is broadcast, so two
//! clients flipping the same switch produce exactly one write and one
//! fan-out. The store is updated only once physical state is confirmed
//! (the readback already matched, or the write went through), so the
//! store cannot drift from hardware on a failed write.
//!
//! RGB is all-or-nothing: if any of the three requested duty cycles
//! differs from the store or from the live readback, all three channels
//! are rewritten and the broadcast carries the full triple.
//!
//! # Example
//!
//! ```rust
//! use gpio_hub::config::PinLayout;
//! use gpio_hub::engine::{ApplyOutcome, SyncEngine};
//! use gpio_hub::hal::MockPins;
//! use gpio_hub::store::Switch;
//!
//! let mut engine = SyncEngine::new(MockPins::new(), PinLayout::default()).unwrap();
//!
//! let outcome = engine.apply_switch(Switch::Led, true).unwrap();
//! assert_eq!(outcome, ApplyOutcome::Written);
//!
//! // Same request again: coalesced, nothing written or broadcast.
//! let outcome = engine.apply_switch(Switch::Led, true).unwrap();
//! assert_eq!(outcome, ApplyOutcome::Skipped);
//! ```

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::PinLayout;
use crate::error::HubError;
use crate::events::WireEvent;
use crate::store::{Actuator, ActuatorSnapshot, ActuatorStore, RgbValue, Switch};
use crate::traits::{PinAdapter, PinId};

/// Broadcast channel capacity. Slow clients past this many undelivered
/// events see a lag error and skip ahead rather than stalling the engine.
const EVENT_BUFFER: usize = 64;

/// What the engine did with a state-change request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Hardware was written and the change was broadcast.
    Written,
    /// Observed hardware already matched; no write, no broadcast.
    Skipped,
}

impl ApplyOutcome {
    /// True if hardware was written.
    #[inline]
    pub const fn is_written(&self) -> bool {
        matches!(self, ApplyOutcome::Written)
    }
}

/// The core state-sync engine.
///
/// # Type Parameter
///
/// - `P`: the pin adapter implementation ([`PinAdapter`] trait)
///
/// # Thread Safety
///
/// The engine itself is not thread-safe; wrap it in
/// [`SharedHub`](crate::hub::SharedHub) to share it between the gateway
/// and the background cycles.
pub struct SyncEngine<P: PinAdapter> {
    pins: P,
    layout: PinLayout,
    store: ActuatorStore,
    events: broadcast::Sender<WireEvent>,
}

impl<P: PinAdapter> SyncEngine<P> {
    /// Create an engine and drive every configured pin to its default.
    ///
    /// All binary outputs start low and all RGB channels start at zero
    /// duty, mirroring the store defaults. A failing adapter here is
    /// startup-fatal: the error propagates and the engine is never built.
    pub fn new(pins: P, layout: PinLayout) -> Result<Self, HubError> {
        layout.validate()?;
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let mut engine = Self {
            pins,
            layout,
            store: ActuatorStore::new(),
            events,
        };
        engine.write_defaults()?;
        Ok(engine)
    }

    fn write_defaults(&mut self) -> Result<(), HubError> {
        for (actuator, pin) in [
            (Actuator::Led, self.layout.led),
            (Actuator::Laser, self.layout.laser),
            (Actuator::Relay, self.layout.relay),
        ] {
            self.pins
                .write_digital(pin, false)
                .map_err(|e| HubError::hardware(actuator, pin, e))?;
        }
        for pin in self.layout.rgb_pins() {
            self.pins
                .write_pwm(pin, 0)
                .map_err(|e| HubError::hardware(Actuator::Rgb, pin, e))?;
        }
        Ok(())
    }

    /// Apply a client request for a binary actuator.
    ///
    /// Reads the pin back first; a request matching observed hardware is
    /// coalesced ([`ApplyOutcome::Skipped`]). Otherwise the pin is
    /// written, the store updated, and the change broadcast to every
    /// connected client.
    pub fn apply_switch(&mut self, which: Switch, requested: bool) -> Result<ApplyOutcome, HubError> {
        let actuator = which.actuator();
        let pin = self.layout.switch_pin(which);

        let observed = self.read_digital(actuator, pin)?;
        if observed == requested {
            self.store.set_switch(which, requested);
            debug!(%actuator, requested, "request coalesced");
            return Ok(ApplyOutcome::Skipped);
        }

        self.pins
            .write_digital(pin, requested)
            .map_err(|e| HubError::hardware(actuator, pin, e))?;
        self.store.set_switch(which, requested);

        let event = match which {
            Switch::Led => WireEvent::Led { status: requested },
            Switch::Laser => WireEvent::Laser { status: requested },
        };
        let _ = self.events.send(event);
        debug!(%actuator, requested, "state written and broadcast");
        Ok(ApplyOutcome::Written)
    }

    /// Apply a client request for the RGB bank.
    ///
    /// Compares each requested channel against both the store and the
    /// live PWM readback. Any difference rewrites all three channels and
    /// broadcasts the full triple; full agreement is coalesced.
    pub fn apply_rgb(&mut self, requested: RgbValue) -> Result<ApplyOutcome, HubError> {
        let pins = self.layout.rgb_pins();
        let stored = self.store.rgb();

        let mut observed = [0u8; 3];
        for (slot, pin) in observed.iter_mut().zip(pins) {
            *slot = self.read_pwm(pin)?;
        }

        let all_match = stored == requested && observed == requested.channels();
        if all_match {
            debug!(?requested, "rgb request coalesced");
            return Ok(ApplyOutcome::Skipped);
        }

        // All-or-nothing: channels that did not change are rewritten too.
        for (pin, duty) in pins.into_iter().zip(requested.channels()) {
            self.pins
                .write_pwm(pin, duty)
                .map_err(|e| HubError::hardware(Actuator::Rgb, pin, e))?;
        }
        self.store.set_rgb(requested);

        let _ = self.events.send(WireEvent::rgb(requested));
        debug!(?requested, "rgb written and broadcast");
        Ok(ApplyOutcome::Written)
    }

    /// Flip the relay and write it, unconditionally.
    ///
    /// Called only by the relay cycle: no debounce, no broadcast, no
    /// client involvement. Returns the new relay state.
    pub fn toggle_relay(&mut self) -> Result<bool, HubError> {
        let next = !self.store.relay();
        let pin = self.layout.relay;
        self.pins
            .write_digital(pin, next)
            .map_err(|e| HubError::hardware(Actuator::Relay, pin, e))?;
        self.store.set_relay(next);
        Ok(next)
    }

    /// Announce the current LED, LASER and RGB state on the broadcast
    /// channel.
    ///
    /// Invoked once per new connection. The values come from the store,
    /// not from hardware, and go to *every* connected client: existing
    /// clients get a state refresh whenever anyone joins, and clients
    /// depend on that refresh.
    pub fn broadcast_snapshot(&self) {
        let snap = self.store.snapshot();
        debug!(
            led = snap.led,
            laser = snap.laser,
            rgb = ?snap.rgb,
            "announcing current state"
        );
        let _ = self.events.send(WireEvent::Led { status: snap.led });
        let _ = self.events.send(WireEvent::Laser { status: snap.laser });
        let _ = self.events.send(WireEvent::rgb(snap.rgb));
    }

    /// Current logical state of every actuator.
    pub fn snapshot(&self) -> ActuatorSnapshot {
        self.store.snapshot()
    }

    /// Sender half of the event channel (for the temperature cycle).
    pub fn sender(&self) -> broadcast::Sender<WireEvent> {
        self.events.clone()
    }

    /// Subscribe to the event channel.
    pub fn subscribe(&self) -> broadcast::Receiver<WireEvent> {
        self.events.subscribe()
    }

    /// The underlying pin adapter.
    pub fn pins(&self) -> &P {
        &self.pins
    }

    /// Mutable access to the underlying pin adapter.
    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    /// Drive every output to its safe value and release the pins.
    ///
    /// LED, laser and relay are driven low and released; the RGB channels
    /// are driven to zero duty and released. Every step is attempted even
    /// if an earlier one fails; the first failure is reported after the
    /// sweep completes.
    pub fn safe_shutdown(&mut self) -> Result<(), HubError> {
        let mut first_err: Option<HubError> = None;

        for (actuator, pin, switch) in [
            (Actuator::Led, self.layout.led, Some(Switch::Led)),
            (Actuator::Laser, self.layout.laser, Some(Switch::Laser)),
            (Actuator::Relay, self.layout.relay, None),
        ] {
            match self.pins.write_digital(pin, false) {
                Ok(()) => match switch {
                    Some(s) => self.store.set_switch(s, false),
                    None => self.store.set_relay(false),
                },
                Err(e) => {
                    let e = HubError::hardware(actuator, pin, e);
                    warn!(%e, "failed to drive output low during shutdown");
                    first_err.get_or_insert(e);
                }
            }
            if let Err(e) = self.pins.release(pin) {
                let e = HubError::hardware(actuator, pin, e);
                warn!(%e, "failed to release pin during shutdown");
                first_err.get_or_insert(e);
            }
        }

        let mut rgb_ok = true;
        for pin in self.layout.rgb_pins() {
            if let Err(e) = self.pins.write_pwm(pin, 0) {
                rgb_ok = false;
                let e = HubError::hardware(Actuator::Rgb, pin, e);
                warn!(%e, "failed to zero pwm channel during shutdown");
                first_err.get_or_insert(e);
            }
            if let Err(e) = self.pins.release(pin) {
                let e = HubError::hardware(Actuator::Rgb, pin, e);
                warn!(%e, "failed to release pwm pin during shutdown");
                first_err.get_or_insert(e);
            }
        }
        if rgb_ok {
            self.store.set_rgb(RgbValue::OFF);
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn read_digital(&mut self, actuator: Actuator, pin: PinId) -> Result<bool, HubError> {
        self.pins
            .read_digital(pin)
            .map_err(|e| HubError::hardware(actuator, pin, e))
    }

    fn read_pwm(&mut self, pin: PinId) -> Result<u8, HubError> {
        self.pins
            .read_pwm(pin)
            .map_err(|e| HubError::hardware(Actuator::Rgb, pin, e))
    }
}
