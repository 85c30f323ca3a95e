//! Raster surfaces backed by tiny-skia pixmaps.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, RgbaImage};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use super::ImageFormat;
use crate::error::{Error, Result};
use crate::format::write_atomic;
use crate::model::Color;

/// An RGBA raster at a fixed pixel size with device scale 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            Error::Encode(format!("cannot allocate {}x{} surface", width, height))
        })?;
        Ok(Self { pixmap })
    }

    /// Wrap an existing pixmap.
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self { pixmap }
    }

    /// Decode PNG/JPEG bytes into a surface.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let rgba = image::load_from_memory(data)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut surface = Self::new(width, height)?;
        let dst = surface.pixmap.data_mut();
        for (src_px, dst_px) in rgba.as_raw().chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
            let a = src_px[3];
            dst_px[0] = premul_u8(src_px[0], a);
            dst_px[1] = premul_u8(src_px[1], a);
            dst_px[2] = premul_u8(src_px[2], a);
            dst_px[3] = a;
        }
        Ok(surface)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Borrow the underlying pixmap.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Mutably borrow the underlying pixmap.
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Fill the whole surface with one color.
    pub fn fill(&mut self, color: Color) {
        self.pixmap.fill(to_sk_color(color));
    }

    /// Composite another surface at the origin, scaled by `(sx, sy)`.
    pub fn draw_surface(&mut self, src: &Surface, sx: f32, sy: f32) {
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            src.pixmap.as_ref(),
            &paint,
            Transform::from_scale(sx, sy),
            None,
        );
    }

    /// Read back one pixel (straight alpha).
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let px = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba(px.red(), px.green(), px.blue(), px.alpha()))
    }

    /// Convert to a straight-alpha RGBA image.
    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.width(), self.height(), data)
            .ok_or_else(|| Error::Encode("surface buffer size mismatch".to_string()))
    }

    /// Encode the surface into an image file format.
    pub fn encode(&self, format: ImageFormat) -> Result<Vec<u8>> {
        let rgba = self.to_rgba_image()?;
        let image = match format {
            ImageFormat::Png => DynamicImage::ImageRgba8(rgba),
            // JPEG has no alpha channel
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()),
        };
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format.into())?;
        Ok(out.into_inner())
    }

    /// Encode and write the surface to `path`.
    pub fn save(&self, path: &Path, format: ImageFormat) -> Result<()> {
        let bytes = self.encode(format)?;
        write_atomic(path, &bytes)
    }
}

pub(crate) fn to_sk_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn premul_u8(channel: u8, alpha: u8) -> u8 {
    let prod = (channel as u16) * (alpha as u16) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_size() {
        assert!(matches!(Surface::new(0, 10), Err(Error::Encode(_))));
    }

    #[test]
    fn test_fill_and_pixel() {
        let mut surface = Surface::new(4, 3).unwrap();
        assert_eq!(surface.pixel(0, 0), Some(Color::rgba(0, 0, 0, 0)));
        surface.fill(Color::rgb(10, 20, 30));
        assert_eq!(surface.pixel(3, 2), Some(Color::rgb(10, 20, 30)));
        assert_eq!(surface.pixel(4, 0), None);
    }

    #[test]
    fn test_png_encode_decode() {
        let mut surface = Surface::new(8, 5).unwrap();
        surface.fill(Color::rgb(200, 0, 0));
        let png = surface.encode(ImageFormat::Png).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let decoded = Surface::decode(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 5));
        assert_eq!(decoded.pixel(1, 1), Some(Color::rgb(200, 0, 0)));
    }

    #[test]
    fn test_jpeg_encode() {
        let mut surface = Surface::new(16, 16).unwrap();
        surface.fill(Color::WHITE);
        let jpeg = surface.encode(ImageFormat::Jpeg).unwrap();
        assert!(jpeg.starts_with(&[0xff, 0xd8]));
    }

    #[test]
    fn test_draw_surface_scaled() {
        let mut src = Surface::new(2, 2).unwrap();
        src.fill(Color::rgb(0, 0, 255));
        let mut dst = Surface::new(8, 8).unwrap();
        dst.fill(Color::WHITE);
        dst.draw_surface(&src, 2.0, 2.0);
        assert_eq!(dst.pixel(1, 1), Some(Color::rgb(0, 0, 255)));
        assert_eq!(dst.pixel(7, 7), Some(Color::WHITE));
    }
}
