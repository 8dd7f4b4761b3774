//! Export sinks.
//!
//! Sinks are write-only: they receive frames and persist or hold them.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;

use grove_types::{GroveError, GroveResult};

use crate::frame::Frame;
use crate::validator::validate_frame;

/// Trait for frame consumers.
pub trait ExportSink: Send {
    fn write_frame(&mut self, frame: &Frame) -> GroveResult<()>;

    /// Called once after the last frame.
    fn finalize(&mut self) -> GroveResult<()> {
        Ok(())
    }

    fn name(&self) -> &str;

    /// Frames accepted so far.
    fn frame_count(&self) -> usize;
}

/// Keeps frames in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    frames: Vec<Frame>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl ExportSink for MemorySink {
    fn write_frame(&mut self, frame: &Frame) -> GroveResult<()> {
        validate_frame(frame)?;
        self.frames.push(frame.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[derive(Serialize)]
struct FrameDocument<'a> {
    frames: &'a [Frame],
}

/// Buffers frames and writes them as one JSON document on `finalize`.
///
/// ```text
/// { "frames": [ { "step": 0, "time": 0.0, ... }, ... ] }
/// ```
#[derive(Debug)]
pub struct JsonFrameExporter {
    path: PathBuf,
    frames: Vec<Frame>,
    pretty: bool,
}

impl JsonFrameExporter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frames: Vec::new(),
            pretty: false,
        }
    }

    /// Indented output.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a document written by this exporter.
    pub fn read(path: impl AsRef<Path>) -> GroveResult<Vec<Frame>> {
        #[derive(serde::Deserialize)]
        struct Owned {
            frames: Vec<Frame>,
        }
        let file = File::open(path)?;
        let doc: Owned = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| GroveError::Serialization(e.to_string()))?;
        Ok(doc.frames)
    }
}

impl ExportSink for JsonFrameExporter {
    fn write_frame(&mut self, frame: &Frame) -> GroveResult<()> {
        validate_frame(frame)?;
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finalize(&mut self) -> GroveResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&self.path)?);
        let doc = FrameDocument { frames: &self.frames };
        let result = if self.pretty {
            serde_json::to_writer_pretty(writer, &doc)
        } else {
            serde_json::to_writer(writer, &doc)
        };
        result.map_err(|e| GroveError::Serialization(e.to_string()))?;
        tracing::info!(path = %self.path.display(), frames = self.frames.len(), "wrote frames");
        Ok(())
    }

    fn name(&self) -> &str {
        "json"
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }
}
