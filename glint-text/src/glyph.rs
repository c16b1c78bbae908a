//! Glyph metrics and the block arithmetic shared by every glyph cache.
//!
//! Glyphs are rasterized in blocks of [`BLOCK_SIZE`] consecutive code
//! points. A miss on `c` populates the whole block
//! `[c - c % 32, c - c % 32 + 31]`, so runs of nearby characters (ASCII,
//! a Cyrillic word) cost one rasterization pass instead of one per glyph.

use std::ops::RangeInclusive;

use crate::raster::RasterizedGlyph;

/// Number of code points rasterized together on a cache miss.
pub const BLOCK_SIZE: u32 = 32;

/// First code point of the block containing `code_point`.
#[inline]
pub const fn block_origin(code_point: u32) -> u32 {
    code_point - code_point % BLOCK_SIZE
}

/// The closed range of code points in the block containing `code_point`.
#[inline]
pub const fn block_range(code_point: u32) -> RangeInclusive<u32> {
    let low = block_origin(code_point);
    low..=low + (BLOCK_SIZE - 1)
}

/// Placement metrics of one cached glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Bitmap width in pixels.
    pub width: u32,
    /// Bitmap height in pixels.
    pub height: u32,
    /// Pen advance in 1/64 pixels.
    pub advance: u32,
    /// Pen origin → bitmap left edge, in pixels.
    pub bearing_x: i32,
    /// Baseline → bitmap top edge, in pixels.
    pub bearing_y: i32,
}

impl GlyphMetrics {
    /// Whole-pixel advance (the 26.6 value shifted right by 6).
    #[inline]
    pub const fn advance_px(&self) -> u32 {
        self.advance >> 6
    }
}

impl From<&RasterizedGlyph> for GlyphMetrics {
    fn from(glyph: &RasterizedGlyph) -> Self {
        Self {
            width: glyph.width,
            height: glyph.height,
            advance: glyph.advance,
            bearing_x: glyph.bearing_x,
            bearing_y: glyph.bearing_y,
        }
    }
}

/// Resolves code points to glyphs, populating lazily on a miss.
///
/// `Texture` is whatever the backend binds to draw the glyph; the layout
/// engine only copies it into the quads it emits.
pub trait GlyphSource {
    type Texture: Copy;

    /// Metrics and texture for `code_point`, or `None` when the font does
    /// not cover it.
    fn glyph(&mut self, code_point: u32) -> Option<(GlyphMetrics, Self::Texture)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_origin_ascii() {
        assert_eq!(block_origin(0), 0);
        assert_eq!(block_origin(31), 0);
        assert_eq!(block_origin('A' as u32), 64);
        assert_eq!(block_origin('i' as u32), 96);
    }

    #[test]
    fn test_block_origin_above_first_block() {
        // 'Ж' = 0x416 = 1046 → 1024.
        assert_eq!(block_origin('Ж' as u32), 1024);
        assert_eq!(block_origin(0x10_FFFF), 0x10_FFE0);
    }

    #[test]
    fn test_block_range_is_32_wide() {
        let range = block_range(100);
        assert_eq!(*range.start(), 96);
        assert_eq!(*range.end(), 127);
        assert_eq!(range.count(), BLOCK_SIZE as usize);
    }

    #[test]
    fn test_block_range_at_u32_max_does_not_overflow() {
        let range = block_range(u32::MAX);
        assert_eq!(*range.end(), u32::MAX);
    }

    #[test]
    fn test_advance_px_truncates() {
        let metrics = GlyphMetrics {
            advance: 10 * 64 + 63,
            ..Default::default()
        };
        assert_eq!(metrics.advance_px(), 10);
    }

    #[test]
    fn test_metrics_from_raster() {
        let raster = RasterizedGlyph {
            width: 3,
            height: 4,
            advance: 320,
            bearing_x: -1,
            bearing_y: 4,
            coverage: vec![0; 12],
        };
        let metrics = GlyphMetrics::from(&raster);
        assert_eq!(metrics.width, 3);
        assert_eq!(metrics.height, 4);
        assert_eq!(metrics.advance_px(), 5);
        assert_eq!(metrics.bearing_x, -1);
    }
}
