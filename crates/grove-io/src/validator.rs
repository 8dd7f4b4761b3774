//! Frame validation.
//!
//! Checks a frame before a sink accepts it, catching layout errors
//! early with clear diagnostics.

use grove_types::{GroveError, GroveResult};

use crate::frame::{Field, Frame};

/// Validates a frame.
///
/// Checks:
/// - time is finite
/// - every field has a name and at least one component
/// - particle fields cover `particle_count` entries, node fields `node_count`
/// - names are unique within each group
pub fn validate_frame(frame: &Frame) -> GroveResult<()> {
    if !frame.time.is_finite() {
        return Err(GroveError::InvalidConfig(format!(
            "Frame {} has non-finite time",
            frame.step
        )));
    }
    validate_group("particle", &frame.particle_fields, frame.particle_count)?;
    validate_group("node", &frame.node_fields, frame.node_count)?;
    Ok(())
}

fn validate_group(kind: &str, fields: &[Field], count: usize) -> GroveResult<()> {
    for (i, field) in fields.iter().enumerate() {
        if field.name.is_empty() {
            return Err(GroveError::InvalidConfig(format!("Unnamed {kind} field at index {i}")));
        }
        if field.components == 0 {
            return Err(GroveError::InvalidConfig(format!(
                "{kind} field '{}' has zero components",
                field.name
            )));
        }
        if field.values.len() != field.components * count {
            return Err(GroveError::InvalidConfig(format!(
                "{kind} field '{}' has {} values, expected {} ({} x {count})",
                field.name,
                field.values.len(),
                field.components * count,
                field.components
            )));
        }
        if fields[..i].iter().any(|f| f.name == field.name) {
            return Err(GroveError::InvalidConfig(format!(
                "Duplicate {kind} field '{}'",
                field.name
            )));
        }
    }
    Ok(())
}
