//! Integration tests for grove-io.

use approx::assert_relative_eq;

use grove_grid::Grid;
use grove_io::validator::validate_frame;
use grove_io::{ExportSink, Field, Frame, JsonFrameExporter, MemorySink, SaveSchedule};
use grove_math::Vector;
use grove_solver::ParticleSet;

fn sample_frame(step: u64) -> Frame {
    let grid = Grid::<2>::new(0.5, [(0.0, 1.0), (0.0, 1.0)]).unwrap();
    let mut particles = ParticleSet::with_uniform_volume(
        vec![Vector::<2>::new(0.25, 0.25), Vector::<2>::new(0.75, 0.5)],
        0.01,
        1000.0,
    )
    .unwrap();
    particles.velocity[1] = Vector::<2>::new(1.0, -1.0);
    Frame::capture(step, step as f64 * 0.1, &particles, &grid)
}

// ─── Frame Tests ──────────────────────────────────────────────

#[test]
fn capture_layout() {
    let frame = sample_frame(0);
    assert_eq!(frame.particle_count, 2);
    assert_eq!(frame.node_count, 9);

    let velocity = frame.particle_field("velocity").unwrap();
    assert_eq!(velocity.components, 2);
    assert_eq!(velocity.values, vec![0.0, 0.0, 1.0, -1.0]);
    assert_eq!(frame.particle_field("von_mises").unwrap().len(), 2);
    assert_eq!(frame.node_field("velocity").unwrap().values.len(), 18);
    assert!(frame.node_field("pressure").is_none());
    assert!(validate_frame(&frame).is_ok());
}

#[test]
fn wrong_field_length_rejected() {
    let mut frame = sample_frame(0);
    frame.particle_fields.push(Field::scalar("extra", vec![1.0; 3]));
    assert!(validate_frame(&frame).is_err());
}

#[test]
fn duplicate_field_rejected() {
    let mut frame = sample_frame(0);
    frame.node_fields.push(Field::scalar("mass", vec![0.0; 9]));
    assert!(validate_frame(&frame).is_err());
}

#[test]
fn non_finite_time_rejected() {
    let mut frame = sample_frame(0);
    frame.time = f64::NAN;
    assert!(validate_frame(&frame).is_err());
}

// ─── Sink Tests ───────────────────────────────────────────────

#[test]
fn memory_sink_keeps_frames() {
    let mut sink = MemorySink::new();
    sink.write_frame(&sample_frame(0)).unwrap();
    sink.write_frame(&sample_frame(3)).unwrap();
    sink.finalize().unwrap();
    assert_eq!(sink.frame_count(), 2);
    assert_eq!(sink.frames()[1].step, 3);
}

#[test]
fn json_exporter_writes_document() {
    let dir = std::env::temp_dir().join(format!("grove-io-test-{}", std::process::id()));
    let path = dir.join("frames.json");
    let mut sink = JsonFrameExporter::new(&path).pretty();
    sink.write_frame(&sample_frame(0)).unwrap();
    sink.write_frame(&sample_frame(1)).unwrap();
    sink.finalize().unwrap();

    let frames = JsonFrameExporter::read(&path).unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1], sample_frame(1));
    std::fs::remove_dir_all(&dir).unwrap();
}

// ─── SaveSchedule Tests ───────────────────────────────────────

#[test]
fn schedule_from_fps() {
    let schedule = SaveSchedule::from_fps(0.0, 1.0, 4.0);
    assert_eq!(schedule.len(), 5);
    assert_relative_eq!(schedule.remaining()[4], 1.0);
}

#[test]
fn schedule_fires_once_per_crossing() {
    let mut schedule = SaveSchedule::from_fps(0.0, 1.0, 10.0);
    assert!(schedule.due(0.0));
    assert!(!schedule.due(0.05));
    assert!(schedule.due(0.1));
    assert!(!schedule.due(0.1));
    // A long step skips several points but saves once.
    assert!(schedule.due(0.55));
    assert_relative_eq!(schedule.remaining()[0], 0.6, epsilon = 1e-12);
    assert!(schedule.due(2.0));
    assert!(schedule.is_finished());
}

#[test]
fn schedule_without_rate_saves_initial_only() {
    let mut schedule = SaveSchedule::from_fps(0.0, 1.0, 0.0);
    assert_eq!(schedule.len(), 1);
    assert!(schedule.due(0.0));
    assert!(!schedule.due(1.0));
}
