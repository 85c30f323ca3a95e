//! Live pen input to committed strokes.
//!
//! A batch of raw points is one gesture. It is turned into a single stroke,
//! validated, and only then appended to the target layer, so a rejected
//! batch leaves the document untouched.

use serde::{Deserialize, Serialize};

use crate::config::StrokeDefaults;
use crate::error::{Error, Result};
use crate::model::{normalize_pressure, Document, Point, Stroke, StrokeTool};

/// Tool codes as reported by the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Pen,
    Eraser,
    Highlighter,
    Pencil,
}

impl ToolKind {
    /// Map a host tool code: 0 pen, 1 eraser, 2 highlighter, 3 pencil.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(ToolKind::Pen),
            1 => Ok(ToolKind::Eraser),
            2 => Ok(ToolKind::Highlighter),
            3 => Ok(ToolKind::Pencil),
            other => Err(Error::InvalidParam(format!("unknown tool code {}", other))),
        }
    }
}

impl From<ToolKind> for StrokeTool {
    fn from(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Pen => StrokeTool::Pen,
            ToolKind::Eraser => StrokeTool::Eraser,
            ToolKind::Highlighter => StrokeTool::Highlighter,
            ToolKind::Pencil => StrokeTool::Pencil,
        }
    }
}

/// Position of a point within its gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    Down,
    #[default]
    Move,
    Up,
}

impl Phase {
    /// Map a host phase code: 0 down, 1 move, 2 up.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Phase::Down),
            1 => Ok(Phase::Move),
            2 => Ok(Phase::Up),
            other => Err(Error::InvalidParam(format!("unknown phase code {}", other))),
        }
    }
}

/// One sample from the input device, in page points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPoint {
    pub x: f64,
    pub y: f64,
    /// Raw pressure; values outside (0, 1] mean "no pressure"
    pub pressure: f64,
    pub timestamp_ms: i64,
    pub tool: ToolKind,
    pub phase: Phase,
}

impl RawPoint {
    /// A pen sample without pressure.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            pressure: -1.0,
            timestamp_ms: 0,
            tool: ToolKind::Pen,
            phase: Phase::Move,
        }
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = pressure;
        self
    }

    pub fn with_tool(mut self, tool: ToolKind) -> Self {
        self.tool = tool;
        self
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    pub fn at(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    fn to_point(self) -> Result<Point> {
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err(Error::InvalidParam(format!(
                "point coordinates must be finite, got ({}, {})",
                self.x, self.y
            )));
        }
        Ok(Point {
            x: self.x,
            y: self.y,
            pressure: normalize_pressure(self.pressure),
        })
    }
}

/// Page and layer that receive ingested strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestTarget {
    pub page: usize,
    pub layer: usize,
}

impl IngestTarget {
    pub fn new(page: usize, layer: usize) -> Self {
        Self { page, layer }
    }
}

/// Builds strokes from raw point batches and commits them to a document.
#[derive(Debug, Clone, Copy)]
pub struct Ingestor<'a> {
    defaults: &'a StrokeDefaults,
    target: IngestTarget,
}

impl<'a> Ingestor<'a> {
    pub fn new(defaults: &'a StrokeDefaults, target: IngestTarget) -> Self {
        Self { defaults, target }
    }

    /// Build a complete stroke from one gesture.
    ///
    /// The tool comes from the first point. Points keep their input order.
    pub fn build_stroke(&self, points: &[RawPoint]) -> Result<Stroke> {
        let first = points
            .first()
            .ok_or_else(|| Error::invalid("stroke batch is empty"))?;
        if points.iter().any(|p| p.tool != first.tool) {
            log::warn!(
                "Stroke batch mixes tools; using {:?} from the first point",
                first.tool
            );
        }

        let tool = StrokeTool::from(first.tool);
        let mut stroke = Stroke::new(tool)
            .with_width(self.defaults.width_for(tool))
            .with_color(self.defaults.color);
        for raw in points {
            stroke.push_point(raw.to_point()?);
        }
        stroke.validate()?;
        Ok(stroke)
    }

    /// Append the stroke built from `points` to the target layer of `doc`.
    ///
    /// Returns the index of the new element within its layer.
    pub fn commit(&self, doc: &mut Document, points: &[RawPoint]) -> Result<usize> {
        if points.is_empty() {
            return Err(Error::invalid("stroke batch is empty"));
        }
        let IngestTarget { page, layer } = self.target;
        let page_count = doc.page_count();
        let target_page = doc.page_mut(page).ok_or_else(|| {
            Error::InvalidParam(format!(
                "ingest page {} out of range (document has {} pages)",
                page, page_count
            ))
        })?;
        let layer_count = target_page.layers.len();
        let target_layer = target_page.layer_mut(layer).ok_or_else(|| {
            Error::InvalidParam(format!(
                "ingest layer {} out of range (page {} has {} layers)",
                layer, page, layer_count
            ))
        })?;

        let stroke = self.build_stroke(points)?;
        log::trace!(
            "Committing {} stroke with {} points to page {} layer {}",
            stroke.tool,
            stroke.len(),
            page,
            layer
        );
        target_layer.push_stroke(stroke);
        let index = target_layer.len() - 1;
        doc.touch();
        Ok(index)
    }
}
