//! The gpio-hub server binary.
//!
//! Wires the pieces together: load the pin layout, open the hardware
//! adapters (mocks on desktop, rppal with `--features rpi`), start the
//! background cycles, serve the gateway until it ends or the operator
//! interrupts, then run the ordered teardown and exit.
//!
//! # Usage
//!
//! ```sh
//! gpio-hub [path/to/gpio.config.json]
//! ```
//!
//! The config path defaults to `gpio.config.json` in the working
//! directory; a missing file falls back to the built-in default layout.
//! The listen port defaults to 8080 and can be overridden with the `PORT`
//! environment variable. Exit code 0 on normal termination, 2 on
//! interrupt.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gpio_hub::{
    run_gateway, Cycles, ExitReason, GatewayConfig, Lifecycle, PinLayout, RelayCycle, SharedHub,
    SyncEngine, TemperatureCycle,
};

const DEFAULT_CONFIG_PATH: &str = "gpio.config.json";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = match tokio::runtime::Runtime::new().context("creating tokio runtime") {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run()) {
        Ok(reason) => ExitCode::from(reason.code() as u8),
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitReason> {
    let layout = load_layout().context("loading pin layout")?;
    let gateway = GatewayConfig::default().with_port_from_env();

    info!(
        led = layout.led,
        laser = layout.laser,
        relay = layout.relay,
        rgb = ?layout.rgb_pins(),
        "pin layout loaded"
    );

    // Hardware adapters: real GPIO with the rpi feature, mocks otherwise.
    #[cfg(feature = "rpi")]
    let pins = gpio_hub::hal::RpiPins::open().context("opening GPIO peripheral")?;
    #[cfg(not(feature = "rpi"))]
    let pins = {
        info!("built without the rpi feature; driving mock pins");
        gpio_hub::hal::MockPins::new()
    };

    #[cfg(feature = "rpi")]
    let sensors = gpio_hub::hal::W1Sensors::new();
    #[cfg(not(feature = "rpi"))]
    let sensors = gpio_hub::hal::MockSensors::new();

    let engine = SyncEngine::new(pins, layout).context("initializing actuators")?;
    let hub = Arc::new(SharedHub::new(engine));

    let mut cycles = Cycles {
        relay: RelayCycle::new(),
        temperature: TemperatureCycle::new(),
    };
    cycles.relay.start(Arc::clone(&hub));
    match cycles.temperature.start(sensors, hub.sender()) {
        Ok(loops) => info!(loops, "temperature sampling started"),
        Err(e) => warn!(%e, "temperature sampling unavailable"),
    }

    let lifecycle = Lifecycle::new();
    let reason = tokio::select! {
        result = run_gateway(Arc::clone(&hub), &gateway) => {
            if let Err(e) = result {
                warn!(%e, "gateway stopped with an error");
            }
            ExitReason::Normal
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    info!("interrupt received");
                    ExitReason::Interrupt
                }
                Err(e) => {
                    warn!(%e, "signal listener failed");
                    ExitReason::Normal
                }
            }
        }
    };

    lifecycle.shutdown(&hub, &mut cycles);
    Ok(reason)
}

fn load_layout() -> anyhow::Result<PinLayout> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    if std::path::Path::new(&path).exists() {
        Ok(PinLayout::from_json_file(&path)?)
    } else {
        warn!(%path, "pin config not found; using default layout");
        Ok(PinLayout::default())
    }
}
