//! Single-line layout and measurement.
//!
//! Turns a sequence of code points into positioned glyph quads. Each quad
//! is two triangles (six vertices) in pixel space, textured with the full
//! `[0,1]×[0,1]` range of its glyph's own texture.
//!
//! Alignment is resolved once, up front, from [`measure`], the same
//! function callers use. A centered string is shifted by exactly half of
//! what `measure` reports.

use bytemuck::{Pod, Zeroable};

use crate::glyph::{GlyphMetrics, GlyphSource};

// ── Alignment ───────────────────────────────────────────────────────

/// Horizontal anchoring of a string relative to its `x` coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    /// `x` is the left edge.
    #[default]
    Left,
    /// `x` is the horizontal center.
    Center,
    /// `x` is the right edge.
    Right,
}

/// Integer alignment codes: `0` centers, negative right-anchors, positive
/// left-anchors.
impl From<i32> for Align {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Center,
            c if c < 0 => Self::Right,
            _ => Self::Left,
        }
    }
}

impl Align {
    /// Offset applied to the starting pen position for a string of
    /// `width` pixels.
    #[inline]
    pub fn offset(self, width: f32) -> f32 {
        match self {
            Self::Left => 0.0,
            Self::Center => -width * 0.5,
            Self::Right => -width,
        }
    }
}

// ── Geometry ────────────────────────────────────────────────────────

/// One interleaved vertex: pixel position then texture coordinate.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl GlyphVertex {
    /// Byte distance between consecutive vertices.
    pub const STRIDE: usize = std::mem::size_of::<GlyphVertex>();
    /// Byte offset of `tex_coords` inside a vertex.
    pub const TEX_COORDS_OFFSET: usize = std::mem::size_of::<[f32; 2]>();

    #[inline]
    const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            tex_coords: [u, v],
        }
    }
}

/// Vertices per glyph quad (two triangles).
pub const VERTICES_PER_QUAD: usize = 6;

/// A glyph quad ready for submission, paired with the texture it samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionedQuad<T> {
    pub vertices: [GlyphVertex; VERTICES_PER_QUAD],
    pub texture: T,
}

impl<T> PositionedQuad<T> {
    /// Build the quad for a glyph whose pen position is `(pen_x, pen_y)`.
    ///
    /// Winding: bottom-right, bottom-left, top-left, top-left, top-right,
    /// bottom-right.
    pub fn new(pen_x: f32, pen_y: f32, scale: f32, metrics: &GlyphMetrics, texture: T) -> Self {
        let xpos = pen_x + metrics.bearing_x as f32 * scale;
        let ypos = pen_y - (metrics.height as i32 - metrics.bearing_y) as f32 * scale;
        let w = metrics.width as f32 * scale;
        let h = metrics.height as f32 * scale;

        Self {
            vertices: [
                GlyphVertex::new(xpos + w, ypos, 1.0, 0.0),
                GlyphVertex::new(xpos, ypos, 0.0, 0.0),
                GlyphVertex::new(xpos, ypos + h, 0.0, 1.0),
                GlyphVertex::new(xpos, ypos + h, 0.0, 1.0),
                GlyphVertex::new(xpos + w, ypos + h, 1.0, 1.0),
                GlyphVertex::new(xpos + w, ypos, 1.0, 0.0),
            ],
            texture,
        }
    }

    /// Left edge of the quad in pixels.
    #[inline]
    pub fn left(&self) -> f32 {
        self.vertices[1].position[0]
    }

    /// Bottom edge of the quad in pixels.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.vertices[1].position[1]
    }
}

// ── Engine ──────────────────────────────────────────────────────────

/// Decode already-formatted text into code points.
pub fn code_points(text: &str) -> Vec<u32> {
    text.chars().map(u32::from).collect()
}

/// Width in pixels of `code_points` at `scale`.
///
/// Sums `(advance >> 6) * scale` over every code point the source can
/// resolve; unresolvable ones contribute nothing. Misses populate the
/// source exactly as [`layout`] would.
pub fn measure<S: GlyphSource>(source: &mut S, scale: f32, code_points: &[u32]) -> f32 {
    let mut width = 0.0;
    for &code_point in code_points {
        if let Some((metrics, _)) = source.glyph(code_point) {
            width += metrics.advance_px() as f32 * scale;
        }
    }
    width
}

/// Lay out `code_points` as a single horizontal line starting at `(x, y)`.
///
/// Returns one quad per resolved code point, in input order. Code points
/// the source cannot resolve are skipped and do not move the pen.
pub fn layout<S: GlyphSource>(
    source: &mut S,
    x: f32,
    y: f32,
    scale: f32,
    align: Align,
    code_points: &[u32],
) -> Vec<PositionedQuad<S::Texture>> {
    if code_points.is_empty() {
        return Vec::new();
    }

    let mut pen_x = match align {
        Align::Left => x,
        _ => x + align.offset(measure(source, scale, code_points)),
    };

    let mut quads = Vec::with_capacity(code_points.len());
    for &code_point in code_points {
        let Some((metrics, texture)) = source.glyph(code_point) else {
            log::trace!("skipping unresolved code point U+{code_point:04X}");
            continue;
        };

        quads.push(PositionedQuad::new(pen_x, y, scale, &metrics, texture));
        pen_x += metrics.advance_px() as f32 * scale;
    }
    quads
}

// ===================================================================
// Tests
// ===================================================================
