//! Page backgrounds: plain fills with ruling, images, PDF pages.

use std::path::Path;

use tiny_skia::{FillRule, Paint, PathBuilder, Stroke, Transform};

use super::surface::to_sk_color;
use super::{BackgroundFlags, Surface};
use crate::error::Result;
use crate::model::{Background, Color, Page, RulingStyle};

/// Distance between ruled lines, in points.
const LINE_SPACING: f32 = 24.0;
/// First ruled line, leaving room for a header.
const HEADER_HEIGHT: f32 = 80.0;
/// Grid and dot pitch: 5 mm.
const GRID_SPACING: f32 = 14.17;
/// Vertical margin line on `Ruled` pages.
const MARGIN_X: f32 = 72.0;

const RULING_WIDTH: f32 = 0.5;
const DOT_RADIUS: f32 = 0.75;

const RULING_COLOR: Color = Color::rgb(0x40, 0xa0, 0xff);
const MARGIN_COLOR: Color = Color::rgb(0xff, 0x00, 0x80);
const DOT_COLOR: Color = Color::rgb(0x80, 0x80, 0x80);

/// Draw the background of `page` onto `surface`.
///
/// `pdf_background` is the decoded PDF page for `PdfPage` backgrounds, if
/// one is available.
pub(crate) fn draw_background(
    surface: &mut Surface,
    page: &Page,
    pdf_background: Option<&Surface>,
    scale: f32,
    flags: BackgroundFlags,
) -> Result<()> {
    match &page.background {
        Background::Plain { ruling, color } => {
            surface.fill(*color);
            if flags.show_ruling {
                draw_ruling(surface, page, *ruling, scale);
            }
        }
        Background::Image { source } => {
            surface.fill(Color::WHITE);
            if flags.show_image {
                draw_image(surface, source);
            }
        }
        Background::PdfPage { page_number } => {
            surface.fill(Color::WHITE);
            if !flags.show_pdf {
                return Ok(());
            }
            match pdf_background {
                Some(bg) => stretch_onto(surface, bg),
                None => log::warn!(
                    "No PDF attached for background page {}, rendering without it",
                    page_number
                ),
            }
        }
    }
    Ok(())
}

fn stretch_onto(surface: &mut Surface, src: &Surface) {
    let sx = surface.width() as f32 / src.width() as f32;
    let sy = surface.height() as f32 / src.height() as f32;
    surface.draw_surface(src, sx, sy);
}

fn draw_image(surface: &mut Surface, source: &Path) {
    let decoded = std::fs::read(source)
        .map_err(crate::error::Error::from)
        .and_then(|bytes| Surface::decode(&bytes));
    match decoded {
        Ok(image) => stretch_onto(surface, &image),
        Err(e) => log::warn!(
            "Skipping image background {}: {}",
            source.display(),
            e
        ),
    }
}

fn draw_ruling(surface: &mut Surface, page: &Page, ruling: RulingStyle, scale: f32) {
    let (width, height) = (page.width as f32, page.height as f32);
    let transform = Transform::from_scale(scale, scale);

    match ruling {
        RulingStyle::Plain => {}
        RulingStyle::Lined | RulingStyle::Ruled => {
            let mut pb = PathBuilder::new();
            let mut y = HEADER_HEIGHT;
            while y < height {
                pb.move_to(0.0, y);
                pb.line_to(width, y);
                y += LINE_SPACING;
            }
            stroke_lines(surface, pb, RULING_COLOR, transform);

            if ruling == RulingStyle::Ruled {
                let mut pb = PathBuilder::new();
                pb.move_to(MARGIN_X, 0.0);
                pb.line_to(MARGIN_X, height);
                stroke_lines(surface, pb, MARGIN_COLOR, transform);
            }
        }
        RulingStyle::Graph => {
            let mut pb = PathBuilder::new();
            let mut x = GRID_SPACING;
            while x < width {
                pb.move_to(x, 0.0);
                pb.line_to(x, height);
                x += GRID_SPACING;
            }
            let mut y = GRID_SPACING;
            while y < height {
                pb.move_to(0.0, y);
                pb.line_to(width, y);
                y += GRID_SPACING;
            }
            stroke_lines(surface, pb, RULING_COLOR, transform);
        }
        RulingStyle::Dotted => {
            let mut pb = PathBuilder::new();
            let mut y = GRID_SPACING;
            while y < height {
                let mut x = GRID_SPACING;
                while x < width {
                    pb.push_circle(x, y, DOT_RADIUS);
                    x += GRID_SPACING;
                }
                y += GRID_SPACING;
            }
            if let Some(path) = pb.finish() {
                let paint = solid(DOT_COLOR);
                surface
                    .pixmap_mut()
                    .fill_path(&path, &paint, FillRule::Winding, transform, None);
            }
        }
    }
}

fn stroke_lines(surface: &mut Surface, pb: PathBuilder, color: Color, transform: Transform) {
    let Some(path) = pb.finish() else {
        return;
    };
    let stroke = Stroke {
        width: RULING_WIDTH,
        ..Stroke::default()
    };
    surface
        .pixmap_mut()
        .stroke_path(&path, &solid(color), &stroke, transform, None);
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_sk_color(color));
    paint.anti_alias = true;
    paint
}
