//! Ordered teardown and process exit codes.
//!
//! Two triggers can race (normal exit and an interrupt signal), and
//! teardown must run exactly once. [`Lifecycle`] guards the transition
//! with an atomic flag; the second trigger observes the flag and does
//! nothing.
//!
//! Teardown order: stop both background cycles first (so nothing can
//! write after the pins go safe), then drive every output to its safe
//! value and release the pins. See `DESIGN.md` for why the cycles go
//! first.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::cycles::Cycles;
use crate::hub::SharedHub;
use crate::traits::PinAdapter;

/// Why the process is exiting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// Service ended on its own (listener closed, fatal serve error).
    Normal,
    /// Operator interrupt (ctrl-c / SIGINT).
    Interrupt,
}

impl ExitReason {
    /// Process exit code: 0 for a normal exit, 2 for an interrupt, so
    /// operational tooling can tell the two apart.
    #[inline]
    pub const fn code(&self) -> i32 {
        match self {
            ExitReason::Normal => 0,
            ExitReason::Interrupt => 2,
        }
    }
}

/// RUNNING → TERMINATING gate with exactly-once teardown.
#[derive(Debug, Default)]
pub struct Lifecycle {
    terminating: AtomicBool,
}

impl Lifecycle {
    /// New lifecycle in the RUNNING state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether teardown has been triggered.
    pub fn is_terminating(&self) -> bool {
        self.terminating.load(Ordering::SeqCst)
    }

    /// Run the ordered teardown.
    ///
    /// Returns `true` if this call performed the teardown, `false` if a
    /// racing trigger already did. Hardware failures during teardown are
    /// logged but do not stop the sweep.
    pub fn shutdown<P: PinAdapter>(&self, hub: &SharedHub<P>, cycles: &mut Cycles) -> bool {
        if self.terminating.swap(true, Ordering::SeqCst) {
            return false;
        }

        info!("shutting down: stopping background cycles");
        cycles.stop_all();

        info!("shutting down: driving outputs safe and releasing pins");
        if let Err(e) = hub.with_engine(|engine| engine.safe_shutdown()) {
            warn!(%e, "teardown completed with hardware errors");
        }

        info!("shutdown complete");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_interrupt() {
        assert_eq!(ExitReason::Normal.code(), 0);
        assert_eq!(ExitReason::Interrupt.code(), 2);
        assert_ne!(ExitReason::Interrupt.code(), ExitReason::Normal.code());
    }

    #[test]
    fn lifecycle_starts_running() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_terminating());
    }
}
