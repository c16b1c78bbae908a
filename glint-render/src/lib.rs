//! # glint-render
//!
//! GPU half of glint: glyph textures, the text shader program and batched
//! quad submission, behind a small [`GraphicsDevice`] abstraction.
//!
//! ## Architecture
//!
//! ```text
//!  FontLoader::load(path, pixel_size, viewport)
//!       │   read asset → compile program → create buffers → preload 32..=127
//!       ▼
//!  Font::printf(x, y, scale, align, blend, clip, format_args!(..))
//!       │
//!       ├──► GlyphCache      ◀─── miss rasterizes a 32-code-point block
//!       │
//!       ├──► layout()        ◀─── glint-text: aligned quads, one per glyph
//!       │
//!       ▼
//!  BatchRenderer::begin()   ◀─── DrawState: blend, scissor, program, VAO
//!       │
//!       ▼
//!  DrawState::submit()      ◀─── one upload, one draw per texture run
//! ```
//!
//! ## Crate modules
//!
//! - [`device`]: the `GraphicsDevice` trait and its value types
//! - [`tier`]: GL 2.1 / GL 3.2 / GLES capability differences
//! - [`resource`]: owned handles, released exactly once on drop
//! - [`shader`]: program compilation, linking and uniforms
//! - [`cache`]: block-wise glyph cache
//! - [`batch`]: vertex buffer, draw state, submission
//! - [`font`]: the `Font` facade and its loader
//! - [`recording`]: headless device for tests and benchmarks
//! - `glow_device`: the real device (feature `glow`)

pub mod batch;
pub mod cache;
pub mod device;
pub mod font;
#[cfg(feature = "glow")]
pub mod glow_device;
pub mod recording;
pub mod resource;
pub mod shader;
pub mod tier;

// Re-exports for convenience
pub use batch::{BatchRenderer, DrawState};
pub use cache::{GlyphCache, GlyphRecord};
pub use device::{
    BlendFactor, Capability, ClipRect, DeviceError, GraphicsDevice, ShaderStage, TextureFormat,
};
pub use font::{Color, Font, FontConfig, FontError, FontLoader};
#[cfg(feature = "glow")]
pub use glow_device::GlowDevice;
pub use glint_text::{Align, GlyphMetrics, RasterizedGlyph, Rasterizer, SwashRasterizer};
pub use recording::{Call, RecordingDevice};
pub use shader::{ShaderError, ShaderProgram, ShaderSources};
pub use tier::CapabilityTier;
