//! Integration tests for rendering through the store and exporting pages.

mod common;

use inkpage::{
    BackgroundFlags, Color, CreateOptions, ErrorKind, ImageFormat, RawPoint, RenderOptions,
    RulingStyle, ToolKind,
};

use common::{assert_near, solid_page, write_pdf};

fn horizontal(tool: ToolKind, y: f64) -> Vec<RawPoint> {
    (0..=10)
        .map(|i| RawPoint::new(10.0 + i as f64 * 8.0, y).with_tool(tool))
        .collect()
}

#[test]
fn test_render_options_from_json() {
    let options = RenderOptions::from_json("").unwrap();
    assert_eq!(options, RenderOptions::default());

    let options = RenderOptions::from_json(
        r#"{"background": {"show_ruling": false}, "format": "jpeg", "pressure_sensitive": false}"#,
    )
    .unwrap();
    assert!(options.background.show_pdf);
    assert!(options.background.show_image);
    assert!(!options.background.show_ruling);
    assert_eq!(options.format, ImageFormat::Jpeg);
    assert!(!options.pressure_sensitive);

    let err = RenderOptions::from_json(r#"{"format": "tiff"}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParam);
}

#[test]
fn test_render_writes_requested_format() {
    let dir = tempfile::tempdir().unwrap();
    let store = common::store();
    let handle = store.create(&CreateOptions::new().with_size(100.0, 100.0)).unwrap();
    store.ingest(handle, &horizontal(ToolKind::Pen, 50.0)).unwrap();

    let png = dir.path().join("page.png");
    store
        .render(handle, 0, &png, 100, 100, &RenderOptions::default())
        .unwrap();
    let bytes = std::fs::read(&png).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    let jpg = dir.path().join("page.jpg");
    let options = RenderOptions::default().with_format(ImageFormat::Jpeg);
    store.render(handle, 0, &jpg, 100, 100, &options).unwrap();
    let bytes = std::fs::read(&jpg).unwrap();
    assert_eq!(&bytes[..2], &[0xff, 0xd8]);
    assert_eq!(image::image_dimensions(&jpg).unwrap(), (100, 100));
}

#[test]
fn test_render_to_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let store = common::store();
    let handle = store.create(&CreateOptions::default()).unwrap();
    let out = dir.path().join("no-such-dir").join("page.png");

    let err = store
        .render(handle, 0, &out, 100, 100, &RenderOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoError);
    assert_eq!(err.kind().code(), -4);
    assert!(!out.exists());
}

#[test]
fn test_eraser_paints_paper_white() {
    let store = common::store();
    let handle = store.create(&CreateOptions::new().with_size(100.0, 100.0)).unwrap();
    store.ingest(handle, &horizontal(ToolKind::Pen, 50.0)).unwrap();
    store.ingest(handle, &horizontal(ToolKind::Eraser, 50.0)).unwrap();

    let surface = store
        .render_surface(handle, 0, 100, 100, &RenderOptions::default())
        .unwrap();
    assert_eq!(surface.pixel(50, 50), Some(Color::WHITE));
}

#[test]
fn test_highlighter_is_translucent_over_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "blue.pdf", &[solid_page(100, 100, (0.0, 0.0, 1.0))]);
    let store = common::store();
    let handle = store.open_pdf(&pdf, false).unwrap();
    store
        .ingest(handle, &horizontal(ToolKind::Highlighter, 50.0))
        .unwrap();

    let surface = store
        .render_surface(handle, 0, 100, 100, &RenderOptions::default())
        .unwrap();
    let pixel = surface.pixel(50, 50).unwrap();
    // Black at half alpha over pure blue
    assert_eq!(pixel.r, 0);
    assert!(pixel.b > 64 && pixel.b < 192, "{:?}", pixel);
    assert_near(surface.pixel(50, 10), Color::rgb(0, 0, 255));
}

#[test]
fn test_ruling_flag_hides_lines() {
    let store = common::store();
    let handle = store
        .create(&CreateOptions::new().with_size(200.0, 200.0).with_ruling(RulingStyle::Ruled))
        .unwrap();

    let with_lines = store
        .render_surface(handle, 0, 200, 200, &RenderOptions::default())
        .unwrap();
    // The half-point margin line straddles pixels 71 and 72
    let on_margin = |s: &inkpage::Surface| {
        s.pixel(71, 20) != Some(Color::WHITE) || s.pixel(72, 20) != Some(Color::WHITE)
    };
    assert!(on_margin(&with_lines));

    let options = RenderOptions::default().with_background(BackgroundFlags {
        show_ruling: false,
        ..BackgroundFlags::ALL
    });
    let plain = store.render_surface(handle, 0, 200, 200, &options).unwrap();
    assert!(!on_margin(&plain));
}

#[test]
fn test_export_all_pages() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(
        dir.path(),
        "deck.pdf",
        &[
            solid_page(200, 150, (1.0, 0.0, 0.0)),
            solid_page(200, 150, (0.0, 1.0, 0.0)),
            solid_page(200, 150, (0.0, 0.0, 1.0)),
        ],
    );
    let (store, decoder) = common::counting_store();
    let handle = store.open_pdf(&pdf, false).unwrap();
    store.add_page(handle, &CreateOptions::default()).unwrap();

    let out = dir.path().join("export");
    let paths = store
        .export(handle, &out, 400, 300, &RenderOptions::default())
        .unwrap();

    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        ["page-001.png", "page-002.png", "page-003.png", "page-004.png"]
    );
    for path in &paths[..3] {
        assert_eq!(image::image_dimensions(path).unwrap(), (400, 300));
    }
    assert_eq!(store.pdf_cache_len(handle).unwrap(), 3);
    assert_eq!(decoder.renders(), 3);

    let [r, g, b, a] = image::open(&paths[1]).unwrap().to_rgba8().get_pixel(200, 150).0;
    assert_near(Some(Color::rgba(r, g, b, a)), Color::rgb(0, 255, 0));

    // A second export reuses every cached background
    store
        .export(handle, &out, 200, 150, &RenderOptions::default())
        .unwrap();
    assert_eq!(decoder.renders(), 3);
}

#[test]
fn test_export_jpeg_extension() {
    let dir = tempfile::tempdir().unwrap();
    let store = common::store();
    let handle = store.create(&CreateOptions::default()).unwrap();
    let options = RenderOptions::default().with_format(ImageFormat::Jpeg);

    let paths = store.export(handle, dir.path(), 100, 100, &options).unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].extension().unwrap(), "jpg");
    assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
}
