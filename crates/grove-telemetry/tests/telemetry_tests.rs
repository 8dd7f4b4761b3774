//! Integration tests for grove-telemetry.

use grove_telemetry::{EventBus, EventKind, EventSink, SimulationEvent, TracingSink, VecSink};

// ─── EventBus Tests ───────────────────────────────────────────

#[test]
fn emit_and_flush() {
    let sink = VecSink::new();
    let mut bus = EventBus::new().with_sink(sink.clone());

    bus.emit(SimulationEvent::new(0, EventKind::StepBegin { sim_time: 0.0, dt: 1e-3 }));
    bus.emit_kind(0, EventKind::StepEnd { wall_time: 0.001 });
    assert!(sink.is_empty(), "events are queued until flush");

    assert_eq!(bus.flush(), 2);
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0].kind, EventKind::StepBegin { .. }));
    assert!(matches!(events[1].kind, EventKind::StepEnd { .. }));
}

#[test]
fn disabled_bus_drops_events() {
    let sink = VecSink::new();
    let mut bus = EventBus::new().with_sink(sink.clone());
    bus.set_enabled(false);
    bus.emit_kind(0, EventKind::Energy { kinetic: 1.0 });
    assert_eq!(bus.flush(), 0);
    assert!(sink.is_empty());
}

#[test]
fn every_sink_sees_every_event() {
    let a = VecSink::new();
    let b = VecSink::new();
    let mut bus = EventBus::new().with_sink(a.clone()).with_sink(b.clone());
    assert_eq!(bus.sink_count(), 2);

    for step in 0..3 {
        bus.emit_kind(step, EventKind::Momentum { norm: step as f64 });
    }
    bus.finalize();
    assert_eq!(a.events(), b.events());
    assert_eq!(a.len(), 3);
}

#[test]
fn sender_from_another_thread() {
    let sink = VecSink::new();
    let mut bus = EventBus::new().with_sink(sink.clone());
    let sender = bus.sender();
    std::thread::spawn(move || {
        sender
            .send(SimulationEvent::new(7, EventKind::NewtonIteration { iteration: 1, residual: 1e-3 }))
            .unwrap();
    })
    .join()
    .unwrap();

    bus.flush();
    assert_eq!(sink.events()[0].step, 7);
}

#[test]
fn tracing_sink_accepts_all_kinds() {
    let mut sink = TracingSink::new();
    sink.handle(&SimulationEvent::new(1, EventKind::NewtonIteration { iteration: 2, residual: 0.1 }));
    sink.handle(&SimulationEvent::new(
        1,
        EventKind::Convergence {
            iterations: 20,
            final_residual: 1.0,
            converged: false,
        },
    ));
    sink.handle(&SimulationEvent::new(1, EventKind::Export { path: "out.json".into(), frame: 0 }));
    assert_eq!(sink.name(), "tracing_sink");
}

// ─── Serialization Tests ──────────────────────────────────────

#[test]
fn event_serialization() {
    let event = SimulationEvent::new(5, EventKind::Energy { kinetic: 1.5 });
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"energy\""));
    let recovered: SimulationEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, event);
}

#[test]
fn convergence_event() {
    let event = SimulationEvent::new(
        10,
        EventKind::Convergence {
            iterations: 3,
            final_residual: 1e-9,
            converged: true,
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("converged"));
}
