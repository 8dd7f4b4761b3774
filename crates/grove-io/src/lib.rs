//! # grove-io
//!
//! Export boundary of the simulation core.
//!
//! At chosen save times the runner captures named per-particle and
//! per-node arrays into a [`Frame`] and hands it to an [`ExportSink`].
//! Nothing flows back into the simulation.

pub mod frame;
pub mod schedule;
pub mod sink;
pub mod validator;

pub use frame::{Field, Frame};
pub use schedule::SaveSchedule;
pub use sink::{ExportSink, JsonFrameExporter, MemorySink};
