//! # glint-text
//!
//! Backend-agnostic half of glint: glyph rasterization, glyph metrics and
//! single-line layout. Nothing in this crate touches a GPU.
//!
//! ## Architecture
//!
//! ```text
//! Rasterizer (swash) ──► RasterizedGlyph { coverage, metrics }
//!                              │
//!                              ▼
//!              GlyphSource (implemented by the GPU glyph cache)
//!                              │
//!     measure(code points) ◄───┴───► layout(code points) ──► Vec<PositionedQuad>
//! ```
//!
//! - **`raster`**: the `Rasterizer` seam and its swash implementation.
//! - **`glyph`**: per-glyph metrics, 32-code-point block arithmetic.
//! - **`layout`**: alignment, pen advance, quad generation, measurement.

pub mod glyph;
pub mod layout;
pub mod raster;

// Re-exports for ergonomic use.
pub use glyph::{block_origin, block_range, GlyphMetrics, GlyphSource, BLOCK_SIZE};
pub use layout::{
    code_points, layout, measure, Align, GlyphVertex, PositionedQuad, VERTICES_PER_QUAD,
};
pub use raster::{RasterError, RasterizedGlyph, Rasterizer, SwashRasterizer};
