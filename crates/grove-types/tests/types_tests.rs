//! Integration tests for grove-types.

use grove_types::{GroveError, ParticleId};

// ─── ID Tests ──────────────────────────────────────────────────

#[test]
fn particle_id_index() {
    let id = ParticleId(42);
    assert_eq!(id.index(), 42);
}

#[test]
fn particle_id_from_usize() {
    let id = ParticleId::from(7usize);
    assert_eq!(id.index(), 7);
    assert_eq!(id.to_string(), "#7");
}

#[test]
fn ids_are_serializable() {
    let id = ParticleId(100);
    let json = serde_json::to_string(&id).unwrap();
    let deserialized: ParticleId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, deserialized);
}

// ─── Error Tests ───────────────────────────────────────────────

#[test]
fn error_display_empty_support() {
    let err = GroveError::EmptySupport { particle: ParticleId(3) };
    assert_eq!(err.to_string(), "Empty kernel support for particle #3");
    assert!(err.is_support_error());
}

#[test]
fn error_display_non_convergence() {
    let err = GroveError::NonConvergence {
        iterations: 20,
        residual: 1.5e-3,
    };
    let msg = err.to_string();
    assert!(msg.contains("20 iterations"));
    assert!(msg.contains("1.50e-3"));
    assert!(!err.is_support_error());
}

#[test]
fn error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: GroveError = io_err.into();
    assert!(matches!(err, GroveError::Io(_)));
}
