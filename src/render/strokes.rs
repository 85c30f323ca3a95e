//! Vector stroke rasterization.

use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke as SkStroke, Transform};

use super::surface::to_sk_color;
use super::Surface;
use crate::model::{Color, Page, Stroke, StrokeTool};

/// Highlighter ink is drawn at half the stroke color's alpha.
const HIGHLIGHTER_ALPHA_DIVISOR: u8 = 2;

/// Draw every visible layer of `page`, in stored order.
pub(crate) fn draw_layers(surface: &mut Surface, page: &Page, scale: f32, pressure_sensitive: bool) {
    let transform = Transform::from_scale(scale, scale);
    let pixmap = surface.pixmap_mut();
    for layer in page.layers.iter().filter(|layer| layer.visible) {
        for stroke in layer.strokes() {
            draw_stroke(pixmap, stroke, transform, pressure_sensitive);
        }
    }
}

/// Ink color after tool semantics are applied.
pub(crate) fn ink_color(stroke: &Stroke) -> Color {
    match stroke.tool {
        StrokeTool::Eraser => Color::WHITE,
        StrokeTool::Highlighter => stroke.color.with_alpha(stroke.color.a / HIGHLIGHTER_ALPHA_DIVISOR),
        StrokeTool::Pen | StrokeTool::Pencil => stroke.color,
    }
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &Stroke, transform: Transform, pressure_sensitive: bool) {
    let mut paint = Paint::default();
    paint.set_color(to_sk_color(ink_color(stroke)));
    paint.anti_alias = true;

    let width = stroke.width as f32;
    let use_pressure = pressure_sensitive && stroke.has_pressure();

    match stroke.points.as_slice() {
        [] => {}
        [point] => {
            let pressure = if use_pressure { point.pressure.unwrap_or(1.0) as f32 } else { 1.0 };
            let radius = (width * pressure / 2.0).max(0.1);
            if let Some(dot) = PathBuilder::from_circle(point.x as f32, point.y as f32, radius) {
                pixmap.fill_path(&dot, &paint, FillRule::Winding, transform, None);
            }
        }
        points if use_pressure => {
            // Each segment takes the pressure of its starting point
            for pair in points.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                let mut pb = PathBuilder::new();
                pb.move_to(a.x as f32, a.y as f32);
                pb.line_to(b.x as f32, b.y as f32);
                let Some(path) = pb.finish() else {
                    continue;
                };
                let seg_width = width * a.pressure.unwrap_or(1.0) as f32;
                pixmap.stroke_path(&path, &paint, &round_stroke(seg_width), transform, None);
            }
        }
        points => {
            let mut pb = PathBuilder::new();
            pb.move_to(points[0].x as f32, points[0].y as f32);
            for point in &points[1..] {
                pb.line_to(point.x as f32, point.y as f32);
            }
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &paint, &round_stroke(width), transform, None);
            }
        }
    }
}

fn round_stroke(width: f32) -> SkStroke {
    SkStroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..SkStroke::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point;

    fn white_page(size: f64) -> (Page, Surface) {
        let page = Page::new(size, size);
        let mut surface = Surface::new(size as u32, size as u32).unwrap();
        surface.fill(Color::WHITE);
        (page, surface)
    }

    fn line(tool: StrokeTool, width: f64) -> Stroke {
        let mut stroke = Stroke::new(tool).with_width(width);
        stroke.push_point(Point::new(10.0, 50.0));
        stroke.push_point(Point::new(90.0, 50.0));
        stroke
    }

    #[test]
    fn test_pen_line() {
        let (mut page, mut surface) = white_page(100.0);
        page.layers[0].push_stroke(line(StrokeTool::Pen, 4.0));
        draw_layers(&mut surface, &page, 1.0, true);
        assert_eq!(surface.pixel(50, 50), Some(Color::BLACK));
        assert_eq!(surface.pixel(50, 20), Some(Color::WHITE));
    }

    #[test]
    fn test_single_point_is_dot() {
        let (mut page, mut surface) = white_page(20.0);
        let mut stroke = Stroke::new(StrokeTool::Pen).with_width(6.0);
        stroke.push_point(Point::new(10.0, 10.0));
        page.layers[0].push_stroke(stroke);
        draw_layers(&mut surface, &page, 1.0, true);
        assert_eq!(surface.pixel(10, 10), Some(Color::BLACK));
    }

    #[test]
    fn test_eraser_whites_out() {
        let (mut page, mut surface) = white_page(100.0);
        page.layers[0].push_stroke(line(StrokeTool::Pen, 4.0));
        page.layers[0].push_stroke(line(StrokeTool::Eraser, 10.0));
        draw_layers(&mut surface, &page, 1.0, true);
        assert_eq!(surface.pixel(50, 50), Some(Color::WHITE));
    }

    #[test]
    fn test_highlighter_is_translucent() {
        let stroke = line(StrokeTool::Highlighter, 10.0).with_color(Color::rgb(255, 255, 0));
        assert_eq!(ink_color(&stroke).a, 127);

        let (mut page, mut surface) = white_page(100.0);
        page.layers[0].push_stroke(line(StrokeTool::Pen, 12.0));
        page.layers[0].push_stroke(stroke);
        draw_layers(&mut surface, &page, 1.0, true);
        // Pen ink shows through the highlighter
        let px = surface.pixel(50, 50).unwrap();
        assert!(px.r < 255 && px.b < 10);
    }

    #[test]
    fn test_invisible_layer_skipped() {
        let (mut page, mut surface) = white_page(100.0);
        page.layers[0].push_stroke(line(StrokeTool::Pen, 4.0));
        page.layers[0].visible = false;
        draw_layers(&mut surface, &page, 1.0, true);
        assert_eq!(surface.pixel(50, 50), Some(Color::WHITE));
    }

    #[test]
    fn test_pressure_thins_stroke() {
        let mut stroke = Stroke::new(StrokeTool::Pen).with_width(20.0);
        stroke.push_point(Point::with_pressure(10.0, 50.0, 0.1));
        stroke.push_point(Point::with_pressure(90.0, 50.0, 0.1));

        let (mut page, mut surface) = white_page(100.0);
        page.layers[0].push_stroke(stroke.clone());
        draw_layers(&mut surface, &page, 1.0, true);
        // Width 2.0 with pressure, so 6px off-axis stays white
        assert_eq!(surface.pixel(50, 56), Some(Color::WHITE));

        let (mut page, mut flat) = white_page(100.0);
        page.layers[0].push_stroke(stroke);
        draw_layers(&mut flat, &page, 1.0, false);
        assert_eq!(flat.pixel(50, 56), Some(Color::BLACK));
    }

    #[test]
    fn test_scale_applies_to_strokes() {
        let page = {
            let mut page = Page::new(50.0, 50.0);
            let mut stroke = Stroke::new(StrokeTool::Pen).with_width(4.0);
            stroke.push_point(Point::new(5.0, 25.0));
            stroke.push_point(Point::new(45.0, 25.0));
            page.layers[0].push_stroke(stroke);
            page
        };
        let mut surface = Surface::new(100, 100).unwrap();
        surface.fill(Color::WHITE);
        draw_layers(&mut surface, &page, 2.0, true);
        assert_eq!(surface.pixel(50, 50), Some(Color::BLACK));
        assert_eq!(surface.pixel(50, 25), Some(Color::WHITE));
    }
}
