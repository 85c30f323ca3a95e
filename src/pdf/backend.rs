//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the PDF operations the note core
//! needs (page enumeration, page geometry, page rasterization), isolating
//! the concrete PDF library (lopdf) from the document store and renderer.

use std::path::Path;
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{Document as LopdfDocument, Object, ObjectId};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Stroke, StrokeDash, Transform};

use crate::error::{Error, Result};
use crate::format::is_pdf_bytes;
use crate::model::Color;
use crate::render::surface::to_sk_color;
use crate::render::Surface;

/// Fallback page size (US Letter) when a page has no usable MediaBox.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// An opened PDF document.
///
/// Page numbers are 0-based.
pub trait PdfSource: Send + Sync {
    /// Number of pages in the PDF.
    fn page_count(&self) -> usize;

    /// Page size in PDF points.
    fn page_size(&self, page_number: usize) -> Result<(f64, f64)>;

    /// Rasterize a page at its intrinsic resolution (1 pixel per point).
    fn render_page(&self, page_number: usize) -> Result<Surface>;
}

/// Opens PDF files.
pub trait PdfDecoder: Send + Sync {
    /// Open and decode the PDF at `path`.
    fn open(&self, path: &Path) -> Result<Arc<dyn PdfSource>>;
}

// ---------------------------------------------------------------------------
// LopdfDecoder: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfDecoder`] backed by `lopdf`.
///
/// Page rendering interprets the vector subset of the content stream
/// (paths, fills, strokes, colors, transforms). Text and XObjects are skipped.
#[derive(Debug, Clone, Default)]
pub struct LopdfDecoder {
    _private: (),
}

impl LopdfDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl PdfDecoder for LopdfDecoder {
    fn open(&self, path: &Path) -> Result<Arc<dyn PdfSource>> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let data = std::fs::read(path)?;
        Ok(Arc::new(LopdfSource::load_bytes(&data)?))
    }
}

/// Concrete [`PdfSource`] backed by `lopdf::Document`.
pub struct LopdfSource {
    doc: LopdfDocument,
    pages: Vec<ObjectId>,
}

impl LopdfSource {
    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        if !is_pdf_bytes(data) {
            return Err(Error::PdfDecode("not a PDF file".to_string()));
        }
        let doc = LopdfDocument::load_mem(data)?;
        let pages = doc.get_pages().into_values().collect();
        Ok(Self { doc, pages })
    }

    fn page_id(&self, page_number: usize) -> Result<ObjectId> {
        self.pages.get(page_number).copied().ok_or_else(|| {
            Error::PdfDecode(format!(
                "PDF page {} out of range (PDF has {} pages)",
                page_number,
                self.pages.len()
            ))
        })
    }

    /// MediaBox `[x0, y0, x1, y1]`, inherited through `Parent` links.
    fn media_box(&self, mut id: ObjectId) -> Result<[f32; 4]> {
        loop {
            let dict = self.doc.get_object(id)?.as_dict()?;
            if let Ok(arr) = dict.get(b"MediaBox").and_then(Object::as_array) {
                if let Some(media_box) = parse_media_box_array(arr) {
                    return Ok(media_box);
                }
            }
            id = match dict.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent_id) => parent_id,
                Err(_) => break,
            };
        }
        Ok(DEFAULT_MEDIA_BOX)
    }
}

impl PdfSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page_number: usize) -> Result<(f64, f64)> {
        let [x0, y0, x1, y1] = self.media_box(self.page_id(page_number)?)?;
        Ok(((x1 - x0).abs() as f64, (y1 - y0).abs() as f64))
    }

    fn render_page(&self, page_number: usize) -> Result<Surface> {
        let page_id = self.page_id(page_number)?;
        let [x0, y0, x1, y1] = self.media_box(page_id)?;
        let (width, height) = ((x1 - x0).abs(), (y1 - y0).abs());

        let mut surface = Surface::new(width.round().max(1.0) as u32, height.round().max(1.0) as u32)?;
        surface.fill(Color::WHITE);

        let content = self.doc.get_page_content(page_id)?;
        let content = Content::decode(&content)?;

        // PDF user space has a bottom-left origin
        let base = Transform::from_row(1.0, 0.0, 0.0, -1.0, -x0.min(x1), y0.max(y1));
        let mut painter = Painter::new(base);
        for op in &content.operations {
            painter.apply(&mut surface, op);
        }
        if painter.skipped > 0 {
            log::trace!(
                "PDF page {}: skipped {} non-vector operators",
                page_number,
                painter.skipped
            );
        }
        Ok(surface)
    }
}

#[derive(Clone)]
struct GraphicsState {
    ctm: Transform,
    fill: Color,
    stroke: Color,
    line_width: f32,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f32,
    dash: Option<(Vec<f32>, f32)>,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Transform::identity(),
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: None,
        }
    }
}

/// Content stream interpreter for the vector subset of PDF.
struct Painter {
    base: Transform,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    path: PathBuilder,
    current: (f32, f32),
    has_path: bool,
    skipped: usize,
}

impl Painter {
    fn new(base: Transform) -> Self {
        Self {
            base,
            state: GraphicsState::default(),
            stack: Vec::new(),
            path: PathBuilder::new(),
            current: (0.0, 0.0),
            has_path: false,
            skipped: 0,
        }
    }

    fn apply(&mut self, surface: &mut Surface, op: &Operation) {
        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(prev) = self.stack.pop() {
                    self.state = prev;
                }
            }
            "cm" => {
                if let Some([a, b, c, d, e, f]) = op_f32_n::<6>(op) {
                    self.state.ctm = self.state.ctm.pre_concat(Transform::from_row(a, b, c, d, e, f));
                }
            }
            "w" => {
                if let Some(width) = op_f32(op, 0) {
                    self.state.line_width = width.max(0.0);
                }
            }
            "J" => {
                if let Some(cap) = op_i64(op, 0) {
                    self.state.line_cap = match cap {
                        1 => LineCap::Round,
                        2 => LineCap::Square,
                        _ => LineCap::Butt,
                    };
                }
            }
            "j" => {
                if let Some(join) = op_i64(op, 0) {
                    self.state.line_join = match join {
                        1 => LineJoin::Round,
                        2 => LineJoin::Bevel,
                        _ => LineJoin::Miter,
                    };
                }
            }
            "M" => {
                if let Some(limit) = op_f32(op, 0) {
                    self.state.miter_limit = limit.max(1.0);
                }
            }
            "d" => {
                let pattern: Vec<f32> = op
                    .operands
                    .first()
                    .and_then(|o| o.as_array().ok())
                    .map(|arr| arr.iter().filter_map(obj_to_f32).map(f32::abs).collect())
                    .unwrap_or_default();
                let phase = op_f32(op, 1).unwrap_or(0.0);
                self.state.dash = (!pattern.is_empty()).then_some((pattern, phase));
            }
            "g" | "rg" | "k" | "sc" | "scn" => {
                if let Some(color) = color_from_operands(op) {
                    self.state.fill = color;
                }
            }
            "G" | "RG" | "K" | "SC" | "SCN" => {
                if let Some(color) = color_from_operands(op) {
                    self.state.stroke = color;
                }
            }
            "m" => {
                if let Some([x, y]) = op_f32_n::<2>(op) {
                    self.path.move_to(x, y);
                    self.current = (x, y);
                    self.has_path = true;
                }
            }
            "l" => {
                if let Some([x, y]) = op_f32_n::<2>(op) {
                    self.ensure_started();
                    self.path.line_to(x, y);
                    self.current = (x, y);
                }
            }
            "c" => {
                if let Some([x1, y1, x2, y2, x, y]) = op_f32_n::<6>(op) {
                    self.ensure_started();
                    self.path.cubic_to(x1, y1, x2, y2, x, y);
                    self.current = (x, y);
                }
            }
            "v" => {
                if let Some([x2, y2, x, y]) = op_f32_n::<4>(op) {
                    self.ensure_started();
                    let (x1, y1) = self.current;
                    self.path.cubic_to(x1, y1, x2, y2, x, y);
                    self.current = (x, y);
                }
            }
            "y" => {
                if let Some([x1, y1, x, y]) = op_f32_n::<4>(op) {
                    self.ensure_started();
                    self.path.cubic_to(x1, y1, x, y, x, y);
                    self.current = (x, y);
                }
            }
            "h" => {
                if self.has_path {
                    self.path.close();
                }
            }
            "re" => {
                if let Some([x, y, w, h]) = op_f32_n::<4>(op) {
                    self.path.move_to(x, y);
                    self.path.line_to(x + w, y);
                    self.path.line_to(x + w, y + h);
                    self.path.line_to(x, y + h);
                    self.path.close();
                    self.current = (x, y);
                    self.has_path = true;
                }
            }
            "S" => self.paint(surface, None, true),
            "s" => {
                self.path.close();
                self.paint(surface, None, true);
            }
            "f" | "F" => self.paint(surface, Some(FillRule::Winding), false),
            "f*" => self.paint(surface, Some(FillRule::EvenOdd), false),
            "B" => self.paint(surface, Some(FillRule::Winding), true),
            "B*" => self.paint(surface, Some(FillRule::EvenOdd), true),
            "b" => {
                self.path.close();
                self.paint(surface, Some(FillRule::Winding), true);
            }
            "b*" => {
                self.path.close();
                self.paint(surface, Some(FillRule::EvenOdd), true);
            }
            "n" => self.discard_path(),
            // Clipping is not applied; the following `n` discards the path
            "W" | "W*" => {}
            _ => self.skipped += 1,
        }
    }

    fn ensure_started(&mut self) {
        if !self.has_path {
            let (x, y) = self.current;
            self.path.move_to(x, y);
            self.has_path = true;
        }
    }

    fn discard_path(&mut self) {
        self.path = PathBuilder::new();
        self.has_path = false;
    }

    fn paint(&mut self, surface: &mut Surface, fill_rule: Option<FillRule>, stroke: bool) {
        let builder = std::mem::replace(&mut self.path, PathBuilder::new());
        self.has_path = false;
        let Some(path) = builder.finish() else {
            return;
        };
        let transform = self.base.pre_concat(self.state.ctm);
        let pixmap = surface.pixmap_mut();

        if let Some(rule) = fill_rule {
            let paint = solid_paint(self.state.fill);
            pixmap.fill_path(&path, &paint, rule, transform, None);
        }
        if stroke {
            let paint = solid_paint(self.state.stroke);
            pixmap.stroke_path(&path, &paint, &self.build_stroke(), transform, None);
        }
    }

    fn build_stroke(&self) -> Stroke {
        let mut stroke = Stroke {
            width: self.state.line_width,
            miter_limit: self.state.miter_limit,
            line_cap: self.state.line_cap,
            line_join: self.state.line_join,
            ..Stroke::default()
        };
        if let Some((pattern, phase)) = &self.state.dash {
            let mut pattern = pattern.clone();
            if pattern.len() % 2 == 1 {
                pattern.extend(pattern.clone());
            }
            stroke.dash = StrokeDash::new(pattern, *phase);
        }
        stroke
    }
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_sk_color(color));
    paint.anti_alias = true;
    paint
}

fn color_from_operands(op: &Operation) -> Option<Color> {
    let values: Vec<f32> = op.operands.iter().filter_map(obj_to_f32).collect();
    let (r, g, b) = match values.as_slice() {
        [gray] => (*gray, *gray, *gray),
        [r, g, b] => (*r, *g, *b),
        [c, m, y, k] => cmyk_to_rgb(*c, *m, *y, *k),
        _ => return None,
    };
    Some(Color::rgb(unit_to_u8(r), unit_to_u8(g), unit_to_u8(b)))
}

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn cmyk_to_rgb(c: f32, m: f32, y: f32, k: f32) -> (f32, f32, f32) {
    ((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
}

fn parse_media_box_array(arr: &[Object]) -> Option<[f32; 4]> {
    if arr.len() < 4 {
        return None;
    }
    let media_box = [
        obj_to_f32(&arr[0])?,
        obj_to_f32(&arr[1])?,
        obj_to_f32(&arr[2])?,
        obj_to_f32(&arr[3])?,
    ];
    let usable = (media_box[2] - media_box[0]).abs() >= 1.0 && (media_box[3] - media_box[1]).abs() >= 1.0;
    usable.then_some(media_box)
}

fn op_f32(op: &Operation, idx: usize) -> Option<f32> {
    obj_to_f32(op.operands.get(idx)?)
}

fn op_i64(op: &Operation, idx: usize) -> Option<i64> {
    op.operands.get(idx)?.as_i64().ok()
}

fn op_f32_n<const N: usize>(op: &Operation) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    for (idx, slot) in out.iter_mut().enumerate() {
        *slot = op_f32(op, idx)?;
    }
    Some(out)
}

fn obj_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
