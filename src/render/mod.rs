//! Page rasterization: backgrounds, strokes, and image encoding.
//!
//! Pages are laid out in PDF points. A render maps the page onto the
//! requested pixel box with one uniform scale factor; the output keeps the
//! page aspect ratio. The surface itself carries no device scale.

mod background;
mod options;
mod strokes;
pub mod surface;

pub use options::{BackgroundFlags, ImageFormat, RenderOptions};
pub use surface::Surface;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::{Background, Document, Page};
use crate::pdf::AttachedPdf;

/// Uniform scale mapping `page` into a `width` x `height` pixel box.
///
/// When either target dimension is zero the page renders at 1 px per point.
pub fn compute_scale(page: &Page, width: u32, height: u32) -> f64 {
    if width == 0 || height == 0 {
        return 1.0;
    }
    let sx = width as f64 / page.width;
    let sy = height as f64 / page.height;
    sx.min(sy)
}

/// Pixel size of `page` rendered at `scale`.
pub fn output_size(page: &Page, scale: f64) -> (u32, u32) {
    // The fitted dimension can land a hair below its target after division
    const EPSILON: f64 = 1e-6;
    (
        (page.width * scale + EPSILON).floor().max(0.0) as u32,
        (page.height * scale + EPSILON).floor().max(0.0) as u32,
    )
}

/// Rasterize one page of `doc`.
///
/// PDF-backed pages draw their background through `pdf`'s cache; without an
/// attached PDF they render on white.
pub fn render_page(
    doc: &Document,
    pdf: Option<&mut AttachedPdf>,
    page_index: usize,
    width: u32,
    height: u32,
    options: &RenderOptions,
) -> Result<Surface> {
    let page = doc.require_page(page_index)?;
    let pdf_background = resolve_pdf_background(page, pdf, options)?;
    rasterize(page, page_index, pdf_background.as_deref(), width, height, options)
}

/// Rasterize one page and write the encoded image to `path`.
pub fn render_page_to_file(
    doc: &Document,
    pdf: Option<&mut AttachedPdf>,
    page_index: usize,
    path: &Path,
    width: u32,
    height: u32,
    options: &RenderOptions,
) -> Result<()> {
    let surface = render_page(doc, pdf, page_index, width, height, options)?;
    surface.save(path, options.format)?;
    log::debug!("Wrote page {} to {}", page_index, path.display());
    Ok(())
}

/// Render every page of `doc` into `dir` as `page-NNN.<ext>` (1-based).
///
/// PDF backgrounds are decoded up front through the cache; the pages
/// themselves are rasterized in parallel.
pub fn export_pages(
    doc: &Document,
    mut pdf: Option<&mut AttachedPdf>,
    dir: &Path,
    width: u32,
    height: u32,
    options: &RenderOptions,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut backgrounds = Vec::with_capacity(doc.page_count());
    for page in &doc.pages {
        backgrounds.push(resolve_pdf_background(page, pdf.as_deref_mut(), options)?);
    }

    let ext = options.format.extension();
    doc.pages
        .par_iter()
        .zip(backgrounds.par_iter())
        .enumerate()
        .map(|(index, (page, background))| {
            let path = dir.join(format!("page-{:03}.{}", index + 1, ext));
            let surface = rasterize(page, index, background.as_deref(), width, height, options)?;
            surface.save(&path, options.format)?;
            Ok(path)
        })
        .collect()
}

fn resolve_pdf_background(
    page: &Page,
    pdf: Option<&mut AttachedPdf>,
    options: &RenderOptions,
) -> Result<Option<Arc<Surface>>> {
    let Background::PdfPage { page_number } = &page.background else {
        return Ok(None);
    };
    if !options.background.show_pdf {
        return Ok(None);
    }
    match pdf {
        Some(attached) => attached.background(*page_number).map(Some),
        None => Ok(None),
    }
}

fn rasterize(
    page: &Page,
    page_index: usize,
    pdf_background: Option<&Surface>,
    width: u32,
    height: u32,
    options: &RenderOptions,
) -> Result<Surface> {
    let scale = compute_scale(page, width, height);
    let (out_w, out_h) = output_size(page, scale);
    if out_w == 0 || out_h == 0 {
        return Err(Error::InvalidParam(format!(
            "page {} renders to an empty {}x{} image at scale {:.4}",
            page_index, out_w, out_h, scale
        )));
    }
    log::debug!(
        "Rendering page {} at scale {:.4} -> {}x{} (pdf={}, image={}, ruling={})",
        page_index,
        scale,
        out_w,
        out_h,
        options.background.show_pdf,
        options.background.show_image,
        options.background.show_ruling
    );

    let mut surface = Surface::new(out_w, out_h)?;
    background::draw_background(
        &mut surface,
        page,
        pdf_background,
        scale as f32,
        options.background,
    )?;
    strokes::draw_layers(&mut surface, page, scale as f32, options.pressure_sensitive);
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, Point, Stroke, StrokeTool};

    #[test]
    fn test_compute_scale_a4() {
        let page = Page::a4();
        let scale = compute_scale(&page, 200, 200);
        assert!((scale - 200.0 / crate::model::A4_HEIGHT).abs() < 1e-12);
        assert_eq!(output_size(&page, scale), (141, 200));
    }

    #[test]
    fn test_compute_scale_fallback() {
        let page = Page::new(300.0, 100.0);
        assert_eq!(compute_scale(&page, 0, 500), 1.0);
        assert_eq!(compute_scale(&page, 500, 0), 1.0);
        assert_eq!(output_size(&page, compute_scale(&page, 0, 0)), (300, 100));
    }

    #[test]
    fn test_render_page_out_of_range() {
        let doc = Document::with_page(Page::a4());
        let result = render_page(&doc, None, 1, 100, 100, &RenderOptions::default());
        assert!(matches!(result, Err(Error::InvalidParam(_))));
    }

    #[test]
    fn test_render_page_empty_output() {
        let doc = Document::with_page(Page::new(1000.0, 1.0));
        let result = render_page(&doc, None, 0, 10, 10, &RenderOptions::default());
        assert!(matches!(result, Err(Error::InvalidParam(_))));
    }

    #[test]
    fn test_render_page_with_stroke() {
        let mut page = Page::new(100.0, 100.0);
        let mut stroke = Stroke::new(StrokeTool::Pen).with_width(4.0);
        stroke.push_point(Point::new(0.0, 50.0));
        stroke.push_point(Point::new(100.0, 50.0));
        page.layers[0].push_stroke(stroke);
        let doc = Document::with_page(page);

        let surface = render_page(&doc, None, 0, 50, 50, &RenderOptions::default()).unwrap();
        assert_eq!((surface.width(), surface.height()), (50, 50));
        assert_eq!(surface.pixel(25, 25), Some(Color::BLACK));
        assert_eq!(surface.pixel(25, 5), Some(Color::WHITE));
    }

    #[test]
    fn test_export_pages_names_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::with_page(Page::new(20.0, 20.0));
        doc.add_page(Page::new(20.0, 20.0));
        doc.add_page(Page::pdf_backed(20.0, 20.0, 0));

        let options = RenderOptions::default().with_format(ImageFormat::Jpeg);
        let paths = export_pages(&doc, None, dir.path(), 40, 40, &options).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["page-001.jpg", "page-002.jpg", "page-003.jpg"]);
        assert!(paths.iter().all(|p| p.exists()));
    }
}
