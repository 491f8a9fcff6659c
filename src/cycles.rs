//! The two periodic background tasks.
//!
//! - [`RelayCycle`]: toggles the relay every five seconds, unconditionally.
//!   No debounce, no broadcast, no client control.
//! - [`TemperatureCycle`]: enumerates the probe bus once at start, then
//!   samples every qualifying probe on its own five-second loop and
//!   broadcasts each reading.
//!
//! Both are explicit `start()`/`stop()` components rather than timers
//! wired into a constructor, so the lifecycle manager owns when they run
//! and tests can inject short periods. The first tick of each cycle fires
//! one full period after `start()`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, warn};

use crate::error::HubError;
use crate::events::WireEvent;
use crate::hub::SharedHub;
use crate::traits::{PinAdapter, SensorAdapter};

/// Period of both background cycles.
pub const CYCLE_PERIOD: Duration = Duration::from_secs(5);

/// Device-id prefix of DS18B20 temperature probes; anything else on the
/// bus is ignored.
pub const DS18B20_FAMILY_PREFIX: &str = "28-";

// ============================================================================
// Relay Cycle
// ============================================================================

/// Periodic relay toggler.
///
/// Runs from [`start`](Self::start) until [`stop`](Self::stop) (or drop).
/// Each tick flips the relay through the engine under the hub lock; a
/// failing write is logged and the cycle keeps ticking.
#[derive(Debug, Default)]
pub struct RelayCycle {
    handle: Option<JoinHandle<()>>,
    period: Option<Duration>,
}

impl RelayCycle {
    /// New cycle with the standard five-second period.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the period (tests).
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = Some(period);
        self
    }

    /// Spawn the toggle task. A second call while running is a no-op.
    pub fn start<P>(&mut self, hub: Arc<SharedHub<P>>)
    where
        P: PinAdapter + Send + 'static,
    {
        if self.handle.is_some() {
            return;
        }
        let period = self.period.unwrap_or(CYCLE_PERIOD);
        self.handle = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                match hub.with_engine(|engine| engine.toggle_relay()) {
                    Ok(on) => debug!(on, "relay toggled"),
                    Err(e) => warn!(%e, "relay toggle failed"),
                }
            }
        }));
    }

    /// Cancel the toggle task.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether the toggle task is running.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for RelayCycle {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Temperature Cycle
// ============================================================================

/// Periodic temperature sampler.
///
/// [`start`](Self::start) enumerates the bus once and spawns one
/// independent sampling loop per DS18B20-class probe, all broadcasting
/// [`WireEvent::Temperature`] tagged with the probe id. An empty or
/// non-matching bus starts nothing; a warning is logged so the silence is
/// diagnosable.
#[derive(Debug, Default)]
pub struct TemperatureCycle {
    handles: Vec<JoinHandle<()>>,
    period: Option<Duration>,
}

impl TemperatureCycle {
    /// New cycle with the standard five-second period.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the period (tests).
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = Some(period);
        self
    }

    /// Enumerate probes and spawn a sampling loop per match.
    ///
    /// Returns the number of loops started. Enumeration failure is an
    /// error; individual sample failures later are logged per tick and
    /// the loop continues.
    pub fn start<S>(
        &mut self,
        mut sensors: S,
        events: tokio::sync::broadcast::Sender<WireEvent>,
    ) -> Result<usize, HubError>
    where
        S: SensorAdapter + Send + 'static,
    {
        if !self.handles.is_empty() {
            return Ok(self.handles.len());
        }
        let period = self.period.unwrap_or(CYCLE_PERIOD);

        let ids: Vec<_> = sensors
            .list_sensors()
            .map_err(HubError::sensor)?
            .into_iter()
            .filter(|id| id.starts_with(DS18B20_FAMILY_PREFIX))
            .collect();

        if ids.is_empty() {
            warn!("no DS18B20 probes on the bus; temperature broadcasts disabled");
            return Ok(0);
        }

        let sensors = Arc::new(Mutex::new(sensors));
        for id in ids {
            let sensors = Arc::clone(&sensors);
            let events = events.clone();
            self.handles.push(tokio::spawn(async move {
                let mut ticks = interval_at(Instant::now() + period, period);
                loop {
                    ticks.tick().await;
                    let sample = sensors.lock().unwrap().read_celsius(&id);
                    match sample {
                        Ok(celsius) => {
                            debug!(sensor = %id, celsius, "temperature sampled");
                            let _ = events.send(WireEvent::Temperature {
                                status: celsius,
                                sensor: id.clone(),
                            });
                        }
                        Err(e) => warn!(sensor = %id, %e, "temperature sample failed"),
                    }
                }
            }));
        }
        Ok(self.handles.len())
    }

    /// Cancel every sampling loop.
    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    /// Number of sampling loops currently running.
    pub fn running_loops(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for TemperatureCycle {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Both background cycles, cancellable as a unit at shutdown.
#[derive(Debug, Default)]
pub struct Cycles {
    /// The relay toggler.
    pub relay: RelayCycle,
    /// The temperature sampler.
    pub temperature: TemperatureCycle,
}

impl Cycles {
    /// New, not-yet-started cycle pair.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop both cycles. No further hardware writes or broadcasts occur
    /// once this returns.
    pub fn stop_all(&mut self) {
        self.relay.stop();
        self.temperature.stop();
    }
}
