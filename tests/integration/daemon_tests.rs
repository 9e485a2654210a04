//! Daemon event loop: end of input keeps the daemon running; only a
//! termination signal ends the loop.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gardenctl::app::context::GardenContext;
use gardenctl::app::registry::ModuleRegistry;
use gardenctl::config::SystemConfig;
use gardenctl::daemon::{self, Event};
use gardenctl::gpioex::bank::Actuators;
use gardenctl::modules::watering::Watering;

use crate::mock_hw::{RecordingActuators, RecordingTransport};

fn message(topic: &str, payload: &str) -> Event {
    Event::Message {
        topic: topic.into(),
        payload: payload.into(),
    }
}

#[test]
fn closed_input_keeps_running_until_signal() {
    let actuators = Arc::new(RecordingActuators::new());
    let transport = Arc::new(RecordingTransport::new());
    let ctx = GardenContext::new(SystemConfig::default(), actuators.clone(), transport);
    let mut registry = ModuleRegistry::new();
    registry.register(Box::new(Watering::new()));
    registry.init_all(&ctx).unwrap();

    let (tx, rx) = flume::unbounded();
    let signals = tx.clone();
    let input = thread::spawn(move || {
        tx.send(message("/garden/tap", "on")).unwrap();
        tx.send(Event::InputClosed).unwrap();
    });
    input.join().unwrap();
    // Arrives after input closed, e.g. from a bridge reconnect.
    signals.send(message("/garden/tap", "off")).unwrap();
    signals.send(Event::Terminate(libc::SIGTERM)).unwrap();

    let signo = daemon::run(&mut registry, &rx, |_| true);

    assert_eq!(signo, Some(libc::SIGTERM));
    assert_eq!(actuators.sets(), vec![(Actuators::TAP, true), (Actuators::TAP, false)]);
    registry.shutdown();
}

#[test]
fn run_waits_for_signal_after_input_closed() {
    let registry = ModuleRegistry::new();
    let (tx, rx) = flume::unbounded();
    tx.send(Event::InputClosed).unwrap();

    let waiter = thread::spawn(move || {
        let mut registry = registry;
        daemon::run(&mut registry, &rx, |_| true)
    });
    thread::sleep(Duration::from_millis(50));
    assert!(!waiter.is_finished(), "end of input must not stop the daemon");

    tx.send(Event::Terminate(libc::SIGINT)).unwrap();
    assert_eq!(waiter.join().unwrap(), Some(libc::SIGINT));
}

#[test]
fn unsubscribed_topics_are_dropped() {
    let actuators = Arc::new(RecordingActuators::new());
    let transport = Arc::new(RecordingTransport::new());
    let ctx = GardenContext::new(SystemConfig::default(), actuators.clone(), transport);
    let mut registry = ModuleRegistry::new();
    registry.register(Box::new(Watering::new()));
    registry.init_all(&ctx).unwrap();

    let (tx, rx) = flume::unbounded();
    tx.send(message("/garden/tap", "on")).unwrap();
    tx.send(message("/garden/barrel", "on")).unwrap();
    tx.send(Event::Terminate(libc::SIGINT)).unwrap();

    let signo = daemon::run(&mut registry, &rx, |topic| topic == "/garden/barrel");

    assert_eq!(signo, Some(libc::SIGINT));
    assert_eq!(actuators.sets(), vec![(Actuators::BARREL, true)]);
}
