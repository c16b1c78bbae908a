//! The font facade.
//!
//! [`FontLoader`] turns a font asset into a ready-to-draw [`Font`]: it reads
//! the asset, compiles the text program for the loader's tier, creates the
//! vertex buffer and preloads the configured code point range. A `Font`
//! therefore always holds a linked program; drawing cannot fail.
//!
//! ```no_run
//! # use std::rc::Rc;
//! # use glint_render::{Align, CapabilityTier, ClipRect, FontLoader, RecordingDevice};
//! let device = Rc::new(RecordingDevice::new());
//! let mut font = FontLoader::new(CapabilityTier::Gl32)
//!     .load(device, "assets/DejaVuSans.ttf", 48, 1024, 768)
//!     .unwrap();
//! font.set_color(1.0, 0.8, 0.2, 1.0);
//! let score = 1200;
//! font.printf(512.0, 700.0, 1.0, Align::Center, true, ClipRect::new(0, 0, 1024, 768),
//!     format_args!("Score: {score}"));
//! ```

use std::fmt::{self, Write};
use std::io::{self, Read};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glint_text::{code_points, layout, measure, Align, RasterError, Rasterizer, SwashRasterizer};
use log::{info, warn};
use thiserror::Error;

use crate::batch::BatchRenderer;
use crate::cache::GlyphCache;
use crate::device::{ClipRect, DeviceError, GraphicsDevice};
use crate::shader::{self, ShaderError, ShaderProgram, ShaderSources};
use crate::tier::CapabilityTier;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to open font asset {}: {source}", path.display())]
    AssetOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read font data: {0}")]
    AssetRead(#[source] io::Error),
    #[error("Invalid font data: {0}")]
    InvalidFont(String),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl From<RasterError> for FontError {
    fn from(err: RasterError) -> Self {
        Self::InvalidFont(err.to_string())
    }
}

// ── Configuration ───────────────────────────────────────────────────

/// Text color. Components are passed to the shader unclamped.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

/// Per-font load options.
#[derive(Clone, Debug)]
pub struct FontConfig {
    /// GLSL version for the preamble; the tier's default when `None`.
    pub glsl_version: Option<u32>,
    /// Code points rasterized at load.
    pub preload: RangeInclusive<u32>,
    pub shaders: ShaderSources,
    /// Initial text color.
    pub color: Color,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            glsl_version: None,
            preload: 32..=127,
            shaders: ShaderSources::default(),
            color: Color::WHITE,
        }
    }
}

// ── Loader ──────────────────────────────────────────────────────────

/// Builds fonts for one capability tier.
#[derive(Clone, Debug)]
pub struct FontLoader {
    tier: CapabilityTier,
    config: FontConfig,
}

impl FontLoader {
    pub fn new(tier: CapabilityTier) -> Self {
        Self {
            tier,
            config: FontConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FontConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tier(&self) -> CapabilityTier {
        self.tier
    }

    pub fn config(&self) -> &FontConfig {
        &self.config
    }

    /// Load the font file at `path`, rasterized at `pixel_size` pixels,
    /// for a `viewport_width` × `viewport_height` target.
    ///
    /// The file is read before any device call, so a missing asset leaves
    /// the device untouched.
    pub fn load<D: GraphicsDevice>(
        &self,
        device: Rc<D>,
        path: impl AsRef<Path>,
        pixel_size: u32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Result<Font<D>, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontError::AssetOpen {
            path: path.to_path_buf(),
            source,
        })?;
        info!("read font asset {} ({} bytes)", path.display(), data.len());
        self.load_from_bytes(device, data, pixel_size, viewport_width, viewport_height)
    }

    /// Like [`load`](Self::load), reading the asset from `reader`.
    pub fn load_from_reader<D: GraphicsDevice>(
        &self,
        device: Rc<D>,
        mut reader: impl Read,
        pixel_size: u32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Result<Font<D>, FontError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).map_err(FontError::AssetRead)?;
        self.load_from_bytes(device, data, pixel_size, viewport_width, viewport_height)
    }

    /// Like [`load`](Self::load), from font data already in memory.
    pub fn load_from_bytes<D: GraphicsDevice>(
        &self,
        device: Rc<D>,
        data: Vec<u8>,
        pixel_size: u32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Result<Font<D>, FontError> {
        let rasterizer = SwashRasterizer::from_bytes(data)?;
        self.load_with_rasterizer(device, rasterizer, pixel_size, viewport_width, viewport_height)
    }

    /// Build a font around any [`Rasterizer`].
    pub fn load_with_rasterizer<D: GraphicsDevice, R: Rasterizer>(
        &self,
        device: Rc<D>,
        rasterizer: R,
        pixel_size: u32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Result<Font<D, R>, FontError> {
        let tier = self.tier;
        let glsl_version = self
            .config
            .glsl_version
            .unwrap_or_else(|| tier.default_glsl_version());

        let program = shader::compile(&device, tier, glsl_version, &self.config.shaders)?;
        program.set_resolution(viewport_width, viewport_height);

        let batch = BatchRenderer::new(&device, tier, glsl_version, program.attributes())?;

        let mut cache = GlyphCache::new(
            device.clone(),
            rasterizer,
            pixel_size,
            tier.coverage_format(glsl_version),
        );
        cache.generate(self.config.preload.clone());

        info!(
            "loaded font: {tier}, GLSL {glsl_version}, {pixel_size}px, {} glyphs preloaded",
            cache.len()
        );

        Ok(Font {
            cache,
            batch,
            program,
            color: self.config.color,
            tier,
            text: String::new(),
            device,
        })
    }
}

// ── Font ────────────────────────────────────────────────────────────

/// A loaded font bound to one device and tier.
///
/// Not `Send`: the device it draws through belongs to the current thread.
/// Dropping the font (or calling [`destroy`](Self::destroy)) releases every
/// device object it created.
pub struct Font<D: GraphicsDevice, R = SwashRasterizer> {
    cache: GlyphCache<D, R>,
    batch: BatchRenderer<D>,
    program: ShaderProgram<D>,
    color: Color,
    tier: CapabilityTier,
    /// Formatting scratch.
    text: String,
    device: Rc<D>,
}

impl<D: GraphicsDevice, R: Rasterizer> Font<D, R> {
    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.color = Color::new(r, g, b, a);
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Tell the shader the new viewport size. Leaves no program bound.
    pub fn update_resolution(&self, width: u32, height: u32) {
        self.program.set_resolution(width, height);
    }

    /// Format `args` and draw it as one line with its pen starting at
    /// `(x, y)`, clipped to `clip`.
    ///
    /// All pipeline state touched for the draw is restored before
    /// returning. An empty string issues no device calls at all.
    #[allow(clippy::too_many_arguments)]
    pub fn printf(
        &mut self,
        x: f32,
        y: f32,
        scale: f32,
        align: Align,
        blend: bool,
        clip: impl Into<ClipRect>,
        args: fmt::Arguments<'_>,
    ) {
        if !self.format(args) {
            return;
        }
        let code_points = code_points(&self.text);
        let quads = layout(&mut self.cache, x, y, scale, align, &code_points);

        let mut pass = self
            .batch
            .begin(&self.program, self.color.to_array(), blend, clip.into());
        pass.submit(&quads);
    }

    /// Width in pixels `args` would occupy at `scale`.
    pub fn measure(&mut self, scale: f32, args: fmt::Arguments<'_>) -> f32 {
        if !self.format(args) {
            return 0.0;
        }
        let code_points = code_points(&self.text);
        measure(&mut self.cache, scale, &code_points)
    }

    /// Rasterize `range` ahead of use. Returns the number of new glyphs.
    pub fn generate_glyphs(&mut self, range: RangeInclusive<u32>) -> usize {
        self.cache.generate(range)
    }

    /// Render `args` into the scratch string. `false` when there is
    /// nothing to draw.
    fn format(&mut self, args: fmt::Arguments<'_>) -> bool {
        self.text.clear();
        if let Err(err) = self.text.write_fmt(args) {
            warn!("discarding text: formatting failed ({err})");
            self.text.clear();
        }
        !self.text.is_empty()
    }
}

impl<D: GraphicsDevice, R> Font<D, R> {
    /// Number of glyphs uploaded so far.
    pub fn glyph_count(&self) -> usize {
        self.cache.len()
    }

    pub fn tier(&self) -> CapabilityTier {
        self.tier
    }

    pub fn glsl_version(&self) -> u32 {
        self.program.glsl_version()
    }

    pub fn pixel_size(&self) -> u32 {
        self.cache.pixel_size()
    }

    pub fn device(&self) -> &Rc<D> {
        &self.device
    }

    /// Release every device object the font owns.
    pub fn destroy(self) {
        info!("destroying font: {} glyphs", self.cache.len());
    }
}

impl<D: GraphicsDevice, R> fmt::Debug for Font<D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("tier", &self.tier)
            .field("pixel_size", &self.cache.pixel_size())
            .field("glyphs", &self.cache.len())
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ShaderStage;
    use crate::recording::RecordingDevice;
    use glint_text::RasterizedGlyph;

    /// Every code point in 32..=0x24F, 10 px advance.
    struct Latin;

    impl Rasterizer for Latin {
        fn rasterize(&mut self, code_point: u32, _pixel_size: u32) -> Option<RasterizedGlyph> {
            (32..=0x24F).contains(&code_point).then(|| RasterizedGlyph {
                width: 6,
                height: 9,
                advance: 10 << 6,
                bearing_x: 1,
                bearing_y: 9,
                coverage: vec![0x80; 54],
            })
        }
    }

    fn load(tier: CapabilityTier) -> (Rc<RecordingDevice>, Font<RecordingDevice, Latin>) {
        let device = Rc::new(RecordingDevice::new());
        let font = FontLoader::new(tier)
            .load_with_rasterizer(device.clone(), Latin, 48, 1024, 768)
            .unwrap();
        (device, font)
    }

    #[test]
    fn test_default_color_is_white() {
        let (_device, font) = load(CapabilityTier::Gl32);
        assert_eq!(font.color(), Color::WHITE);
    }

    #[test]
    fn test_set_color() {
        let (_device, mut font) = load(CapabilityTier::Gl32);
        font.set_color(1.0, 0.0, 0.5, 0.25);
        assert_eq!(font.color(), Color::new(1.0, 0.0, 0.5, 0.25));
    }

    #[test]
    fn test_preload_default_range() {
        let (_device, font) = load(CapabilityTier::Gl21);
        assert_eq!(font.glyph_count(), 96);
        assert_eq!(font.pixel_size(), 48);
        assert_eq!(font.glsl_version(), 120);
    }

    #[test]
    fn test_configured_glsl_version_and_color() {
        let device = Rc::new(RecordingDevice::new());
        let config = FontConfig {
            glsl_version: Some(100),
            preload: 65..=90,
            color: Color::from([0.0, 1.0, 0.0, 1.0]),
            ..FontConfig::default()
        };
        let font = FontLoader::new(CapabilityTier::Gles)
            .with_config(config)
            .load_with_rasterizer(device.clone(), Latin, 16, 640, 480)
            .unwrap();
        assert_eq!(font.glsl_version(), 100);
        assert_eq!(font.glyph_count(), 26);
        assert_eq!(font.color().g, 1.0);
        assert_eq!(device.live_vertex_arrays(), 0);
    }

    #[test]
    fn test_measure_formats_arguments() {
        let (_device, mut font) = load(CapabilityTier::Gl32);
        let n = 42;
        assert_eq!(font.measure(1.0, format_args!("n={n}")), 40.0);
        assert_eq!(font.measure(2.0, format_args!("")), 0.0);
    }

    #[test]
    fn test_generate_glyphs_extends_cache() {
        let (_device, mut font) = load(CapabilityTier::Gl32);
        let before = font.glyph_count();
        assert_eq!(font.generate_glyphs(0xC0..=0xFF), 64);
        assert_eq!(font.glyph_count(), before + 64);
        assert_eq!(font.generate_glyphs(0xC0..=0xFF), 0);
    }

    #[test]
    fn test_shader_error_surfaces() {
        let device = Rc::new(RecordingDevice::new());
        device.fail_compile(ShaderStage::Fragment, "syntax error");
        let err = FontLoader::new(CapabilityTier::Gl32)
            .load_with_rasterizer(device.clone(), Latin, 48, 1024, 768)
            .unwrap_err();
        assert!(matches!(err, FontError::Shader(ShaderError::Compile { .. })));
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_invalid_font_bytes() {
        let device = Rc::new(RecordingDevice::new());
        let err = FontLoader::new(CapabilityTier::Gl32)
            .load_from_bytes(device.clone(), b"not a font".to_vec(), 48, 1024, 768)
            .unwrap_err();
        assert!(matches!(err, FontError::InvalidFont(_)));
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_debug_output() {
        let (_device, font) = load(CapabilityTier::Gl32);
        let debug = format!("{font:?}");
        assert!(debug.contains("Gl32"));
        assert!(debug.contains("glyphs: 96"));
    }
}
