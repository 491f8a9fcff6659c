//! Integration tests for shutdown determinism.

use std::sync::Arc;
use std::time::Duration;

use gpio_hub::config::PinLayout;
use gpio_hub::cycles::{Cycles, RelayCycle, TemperatureCycle};
use gpio_hub::engine::SyncEngine;
use gpio_hub::hal::{MockPins, MockSensors};
use gpio_hub::hub::SharedHub;
use gpio_hub::lifecycle::{ExitReason, Lifecycle};
use gpio_hub::store::{RgbValue, Switch};

const PERIOD: Duration = Duration::from_millis(50);

fn test_hub() -> Arc<SharedHub<MockPins>> {
    let engine = SyncEngine::new(MockPins::new(), PinLayout::default()).unwrap();
    Arc::new(SharedHub::new(engine))
}

#[tokio::test(start_paused = true)]
async fn shutdown_leaves_every_output_safe_and_released() {
    let hub = test_hub();
    let layout = PinLayout::default();

    // Drive the system into a busy state first.
    hub.with_engine(|engine| {
        engine.apply_switch(Switch::Led, true).unwrap();
        engine.apply_switch(Switch::Laser, true).unwrap();
        engine.apply_rgb(RgbValue::new(200, 100, 50)).unwrap();
    });

    let mut cycles = Cycles::new();
    cycles.relay = RelayCycle::new().with_period(PERIOD);
    cycles.temperature = TemperatureCycle::new().with_period(PERIOD);
    cycles.relay.start(Arc::clone(&hub));
    cycles
        .temperature
        .start(MockSensors::new().with_sensor("28-eeee", 22.0), hub.sender())
        .unwrap();
    tokio::time::sleep(PERIOD * 3 + Duration::from_millis(10)).await;

    let lifecycle = Lifecycle::new();
    assert!(lifecycle.shutdown(&hub, &mut cycles));
    assert!(lifecycle.is_terminating());

    hub.with_engine(|engine| {
        let pins = engine.pins();

        // Last digital write to each binary pin drove it low.
        for pin in [layout.led, layout.laser, layout.relay] {
            let last = pins
                .digital_writes
                .iter()
                .rev()
                .find(|(p, _)| *p == pin)
                .copied();
            assert_eq!(last, Some((pin, false)));
        }

        // Last PWM write to each channel was zero duty.
        for pin in layout.rgb_pins() {
            let last = pins.pwm_writes.iter().rev().find(|(p, _)| *p == pin).copied();
            assert_eq!(last, Some((pin, 0)));
        }

        // Every configured pin was released.
        for pin in layout.all_pins() {
            assert!(pins.released.contains(&pin), "pin {pin} not released");
        }
    });

    let snap = hub.snapshot();
    assert!(!snap.led);
    assert!(!snap.laser);
    assert!(!snap.relay);
    assert_eq!(snap.rgb, RgbValue::OFF);
}

#[tokio::test(start_paused = true)]
async fn no_writes_after_teardown_completes() {
    let hub = test_hub();
    let mut cycles = Cycles::new();
    cycles.relay = RelayCycle::new().with_period(PERIOD);
    cycles.relay.start(Arc::clone(&hub));
    tokio::time::sleep(PERIOD + Duration::from_millis(10)).await;

    Lifecycle::new().shutdown(&hub, &mut cycles);
    let writes = hub.with_engine(|engine| engine.pins().digital_writes.len());

    tokio::time::sleep(PERIOD * 10).await;
    let writes_after = hub.with_engine(|engine| engine.pins().digital_writes.len());
    assert_eq!(writes_after, writes);
}

#[tokio::test(start_paused = true)]
async fn second_trigger_is_a_no_op() {
    let hub = test_hub();
    let mut cycles = Cycles::new();

    let lifecycle = Lifecycle::new();
    assert!(lifecycle.shutdown(&hub, &mut cycles));

    let writes = hub.with_engine(|engine| {
        (
            engine.pins().digital_writes.len(),
            engine.pins().released.len(),
        )
    });

    // Both exit paths can fire; only the first runs the teardown.
    assert!(!lifecycle.shutdown(&hub, &mut cycles));

    let writes_after = hub.with_engine(|engine| {
        (
            engine.pins().digital_writes.len(),
            engine.pins().released.len(),
        )
    });
    assert_eq!(writes_after, writes);
}

#[tokio::test(start_paused = true)]
async fn teardown_sweeps_past_hardware_failures() {
    let hub = test_hub();
    let mut cycles = Cycles::new();

    // First teardown write fails; the sweep must still reach the rest.
    hub.with_engine(|engine| engine.pins_mut().fail_next("pin busy"));

    Lifecycle::new().shutdown(&hub, &mut cycles);

    let layout = PinLayout::default();
    hub.with_engine(|engine| {
        let pins = engine.pins();
        // The laser and relay were still driven low and released.
        assert!(pins.digital_writes.contains(&(layout.laser, false)));
        assert!(pins.released.contains(&layout.laser));
        assert!(pins.released.contains(&layout.relay));
        for pin in layout.rgb_pins() {
            assert!(pins.released.contains(&pin));
        }
    });
}

#[test]
fn exit_codes_match_the_contract() {
    assert_eq!(ExitReason::Normal.code(), 0);
    assert_eq!(ExitReason::Interrupt.code(), 2);
}
