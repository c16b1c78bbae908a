//! Glyph rasterization: turns one code point into a coverage bitmap.
//!
//! The [`Rasterizer`] trait is the seam between the glyph cache and the
//! font technology. [`SwashRasterizer`] is the default implementation,
//! backed by `swash`'s outline scaler.
//!
//! Metrics follow the FreeType conventions the renderer expects:
//!
//! - `advance` is in 1/64 pixel units (26.6 fixed point).
//! - `bearing_x` is the offset from the pen to the bitmap's left edge.
//! - `bearing_y` is the offset from the baseline up to the bitmap's top edge.

use swash::scale::{Render, ScaleContext, Source};
use swash::zeno::Format;
use swash::FontRef;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("Font data is not a readable TrueType/OpenType face (index {0})")]
    InvalidFontData(usize),
}

/// An 8-bit coverage bitmap plus placement metrics for one code point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RasterizedGlyph {
    /// Bitmap width in pixels.
    pub width: u32,
    /// Bitmap height in pixels.
    pub height: u32,
    /// Horizontal pen advance in 1/64 pixels.
    pub advance: u32,
    /// Pen origin → bitmap left edge, in pixels.
    pub bearing_x: i32,
    /// Baseline → bitmap top edge, in pixels (positive up).
    pub bearing_y: i32,
    /// Row-major coverage bytes, `width * height` long.
    pub coverage: Vec<u8>,
}

impl RasterizedGlyph {
    /// A glyph with an advance but no ink (e.g. a space).
    pub fn blank(advance: u32) -> Self {
        Self {
            advance,
            ..Default::default()
        }
    }
}

/// Produces coverage bitmaps for individual code points.
///
/// Returns `None` when the font has no glyph for `code_point`. A
/// supported glyph without ink is reported as a zero-sized bitmap, not
/// as `None`.
pub trait Rasterizer {
    fn rasterize(&mut self, code_point: u32, pixel_size: u32) -> Option<RasterizedGlyph>;
}

/// `swash`-backed rasterizer over an owned font file.
pub struct SwashRasterizer {
    data: Vec<u8>,
    face_index: usize,
    context: ScaleContext,
}

impl SwashRasterizer {
    /// Parse `data` as a font file, using the first face.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RasterError> {
        Self::from_bytes_with_index(data, 0)
    }

    /// Parse `data` as a font collection and use face `face_index`.
    pub fn from_bytes_with_index(data: Vec<u8>, face_index: usize) -> Result<Self, RasterError> {
        if FontRef::from_index(&data, face_index).is_none() {
            return Err(RasterError::InvalidFontData(face_index));
        }
        Ok(Self {
            data,
            face_index,
            context: ScaleContext::new(),
        })
    }

    fn font(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, self.face_index)
    }
}

impl Rasterizer for SwashRasterizer {
    fn rasterize(&mut self, code_point: u32, pixel_size: u32) -> Option<RasterizedGlyph> {
        // Surrogates and out-of-range values have no glyph.
        let ch = char::from_u32(code_point)?;

        let font = FontRef::from_index(&self.data, self.face_index)?;
        let glyph_id = font.charmap().map(ch);
        if glyph_id == 0 {
            return None;
        }

        let size = pixel_size as f32;
        let units_per_em = font.metrics(&[]).units_per_em.max(1) as f32;
        let advance_px = font.glyph_metrics(&[]).advance_width(glyph_id) * size / units_per_em;
        let advance = (advance_px.max(0.0) * 64.0).round() as u32;

        let mut scaler = self.context.builder(font).size(size).hint(true).build();
        let mut render = Render::new(&[Source::Outline]);
        render.format(Format::Alpha);

        let image = match render.render(&mut scaler, glyph_id) {
            Some(image) => image,
            None => return Some(RasterizedGlyph::blank(advance)),
        };

        let width = image.placement.width;
        let height = image.placement.height;
        if width == 0 || height == 0 {
            return Some(RasterizedGlyph::blank(advance));
        }

        Some(RasterizedGlyph {
            width,
            height,
            advance,
            bearing_x: image.placement.left,
            bearing_y: image.placement.top,
            coverage: image.data,
        })
    }
}

impl std::fmt::Debug for SwashRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwashRasterizer")
            .field("bytes", &self.data.len())
            .field("face_index", &self.face_index)
            .field("glyphs", &self.font().map(|font| font.metrics(&[]).glyph_count))
            .finish()
    }
}

// ===================================================================
// Tests
// ===================================================================
