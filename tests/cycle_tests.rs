//! Integration tests for the background cycles.
//!
//! Timer behavior runs under paused tokio time (`start_paused`), so the
//! five-second-equivalent periods elapse instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;

use gpio_hub::config::PinLayout;
use gpio_hub::cycles::{Cycles, RelayCycle, TemperatureCycle};
use gpio_hub::engine::SyncEngine;
use gpio_hub::events::WireEvent;
use gpio_hub::hal::{MockPins, MockSensors};
use gpio_hub::hub::SharedHub;

const PERIOD: Duration = Duration::from_millis(50);

fn test_hub() -> Arc<SharedHub<MockPins>> {
    let engine = SyncEngine::new(MockPins::new(), PinLayout::default()).unwrap();
    Arc::new(SharedHub::new(engine))
}

/// Sleep through `n` cycle periods of paused time, landing a little past
/// the tick boundary so due timers have unambiguously fired.
async fn elapse_periods(n: u32) {
    tokio::time::sleep(PERIOD * n + Duration::from_millis(10)).await;
}

// ============================================================================
// Relay Cycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn relay_waits_one_full_period_before_first_toggle() {
    let hub = test_hub();
    let mut cycle = RelayCycle::new().with_period(PERIOD);
    cycle.start(Arc::clone(&hub));

    // Just under one period: nothing yet.
    tokio::time::sleep(PERIOD - Duration::from_millis(5)).await;
    assert!(!hub.snapshot().relay);

    // Crossing the period boundary fires the first toggle.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(hub.snapshot().relay);

    cycle.stop();
}

#[tokio::test(start_paused = true)]
async fn relay_toggles_every_period() {
    let hub = test_hub();
    let mut cycle = RelayCycle::new().with_period(PERIOD);
    cycle.start(Arc::clone(&hub));

    elapse_periods(1).await;
    assert!(hub.snapshot().relay);

    elapse_periods(1).await;
    assert!(!hub.snapshot().relay);

    elapse_periods(1).await;
    assert!(hub.snapshot().relay);

    // Each toggle wrote, none were coalesced.
    let relay_pin = PinLayout::default().relay;
    let writes = hub.with_engine(|engine| engine.pins().digital_write_count(relay_pin));
    assert_eq!(writes, 1 + 3); // one at construction, one per tick

    cycle.stop();
}

#[tokio::test(start_paused = true)]
async fn relay_toggles_are_not_broadcast() {
    let hub = test_hub();
    let mut rx = hub.subscribe();
    let mut cycle = RelayCycle::new().with_period(PERIOD);
    cycle.start(Arc::clone(&hub));

    elapse_periods(3).await;
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));

    cycle.stop();
}

#[tokio::test(start_paused = true)]
async fn stopped_relay_cycle_writes_nothing_more() {
    let hub = test_hub();
    let mut cycle = RelayCycle::new().with_period(PERIOD);
    cycle.start(Arc::clone(&hub));

    elapse_periods(1).await;
    cycle.stop();
    assert!(!cycle.is_running());

    let relay_pin = PinLayout::default().relay;
    let writes = hub.with_engine(|engine| engine.pins().digital_write_count(relay_pin));

    elapse_periods(5).await;
    let writes_after = hub.with_engine(|engine| engine.pins().digital_write_count(relay_pin));
    assert_eq!(writes_after, writes);
}

#[tokio::test(start_paused = true)]
async fn starting_a_running_relay_cycle_is_a_no_op() {
    let hub = test_hub();
    let mut cycle = RelayCycle::new().with_period(PERIOD);
    cycle.start(Arc::clone(&hub));
    cycle.start(Arc::clone(&hub));

    elapse_periods(1).await;

    // A doubled cycle would toggle twice per period.
    let relay_pin = PinLayout::default().relay;
    let writes = hub.with_engine(|engine| engine.pins().digital_write_count(relay_pin));
    assert_eq!(writes, 1 + 1);

    cycle.stop();
}

// ============================================================================
// Temperature Cycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn temperature_samples_and_tags_the_probe() {
    let hub = test_hub();
    let mut rx = hub.subscribe();
    let sensors = MockSensors::new().with_sensor("28-000005e2fdc3", 21.5);

    let mut cycle = TemperatureCycle::new().with_period(PERIOD);
    let started = cycle.start(sensors, hub.sender()).unwrap();
    assert_eq!(started, 1);

    elapse_periods(1).await;
    assert_eq!(
        rx.try_recv().unwrap(),
        WireEvent::Temperature {
            status: 21.5,
            sensor: "28-000005e2fdc3".to_string(),
        }
    );

    elapse_periods(1).await;
    assert!(rx.try_recv().is_ok(), "sampling repeats every period");

    cycle.stop();
}

#[tokio::test(start_paused = true)]
async fn non_ds18b20_devices_are_filtered_out() {
    let hub = test_hub();
    let sensors = MockSensors::new()
        .with_sensor("10-000802be3bfa", 30.0) // DS18S20: wrong family
        .with_sensor("28-0316a2795c1b", 19.25);

    let mut cycle = TemperatureCycle::new().with_period(PERIOD);
    assert_eq!(cycle.start(sensors, hub.sender()).unwrap(), 1);
    assert_eq!(cycle.running_loops(), 1);

    let mut rx = hub.subscribe();
    elapse_periods(1).await;

    match rx.try_recv().unwrap() {
        WireEvent::Temperature { sensor, status } => {
            assert_eq!(sensor, "28-0316a2795c1b");
            assert_eq!(status, 19.25);
        }
        other => panic!("unexpected event {other:?}"),
    }

    cycle.stop();
}

#[tokio::test(start_paused = true)]
async fn each_qualifying_probe_gets_its_own_loop() {
    let hub = test_hub();
    let sensors = MockSensors::new()
        .with_sensor("28-aaaa", 10.0)
        .with_sensor("28-bbbb", 20.0);

    let mut cycle = TemperatureCycle::new().with_period(PERIOD);
    assert_eq!(cycle.start(sensors, hub.sender()).unwrap(), 2);

    let mut rx = hub.subscribe();
    elapse_periods(1).await;

    let mut seen = Vec::new();
    while let Ok(WireEvent::Temperature { sensor, .. }) = rx.try_recv() {
        seen.push(sensor);
    }
    seen.sort();
    assert_eq!(seen, vec!["28-aaaa".to_string(), "28-bbbb".to_string()]);

    cycle.stop();
}

#[tokio::test(start_paused = true)]
async fn empty_bus_starts_no_loops() {
    let hub = test_hub();
    let mut cycle = TemperatureCycle::new().with_period(PERIOD);

    assert_eq!(cycle.start(MockSensors::new(), hub.sender()).unwrap(), 0);
    assert_eq!(cycle.running_loops(), 0);

    let mut rx = hub.subscribe();
    elapse_periods(3).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn stopped_temperature_cycle_broadcasts_nothing_more() {
    let hub = test_hub();
    let sensors = MockSensors::new().with_sensor("28-cccc", 25.0);

    let mut cycle = TemperatureCycle::new().with_period(PERIOD);
    cycle.start(sensors, hub.sender()).unwrap();

    elapse_periods(1).await;
    cycle.stop();
    assert_eq!(cycle.running_loops(), 0);

    let mut rx = hub.subscribe();
    elapse_periods(5).await;
    assert!(rx.try_recv().is_err());
}

// ============================================================================
// Aggregate
// ============================================================================

#[tokio::test(start_paused = true)]
async fn stop_all_halts_both_cycles() {
    let hub = test_hub();
    let mut cycles = Cycles::new();
    cycles.relay = RelayCycle::new().with_period(PERIOD);
    cycles.temperature = TemperatureCycle::new().with_period(PERIOD);

    cycles.relay.start(Arc::clone(&hub));
    cycles
        .temperature
        .start(MockSensors::new().with_sensor("28-dddd", 18.0), hub.sender())
        .unwrap();

    elapse_periods(1).await;
    cycles.stop_all();

    assert!(!cycles.relay.is_running());
    assert_eq!(cycles.temperature.running_loops(), 0);

    let relay_pin = PinLayout::default().relay;
    let writes = hub.with_engine(|engine| engine.pins().digital_write_count(relay_pin));
    let mut rx = hub.subscribe();

    elapse_periods(5).await;
    let writes_after = hub.with_engine(|engine| engine.pins().digital_write_count(relay_pin));
    assert_eq!(writes_after, writes);
    assert!(rx.try_recv().is_err());
}
