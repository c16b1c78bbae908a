//! Block-wise glyph cache.
//!
//! Maps code points to uploaded glyph textures. A miss on a code point
//! whose 32-wide block has never been processed rasterizes the entire
//! block and uploads one single-channel texture per covered code point.
//! The cache only grows; records live until the cache is dropped.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::rc::Rc;

use glint_text::{
    block_origin, block_range, GlyphMetrics, GlyphSource, RasterizedGlyph, Rasterizer, BLOCK_SIZE,
};
use log::{debug, error};

use crate::device::{DeviceError, GraphicsDevice, TextureFormat};
use crate::resource::OwnedTexture;

/// One uploaded glyph.
pub struct GlyphRecord<D: GraphicsDevice> {
    texture: OwnedTexture<D>,
    metrics: GlyphMetrics,
}

impl<D: GraphicsDevice> GlyphRecord<D> {
    #[inline]
    pub fn texture(&self) -> D::Texture {
        self.texture.raw()
    }

    #[inline]
    pub fn metrics(&self) -> GlyphMetrics {
        self.metrics
    }
}

/// Code point → glyph record, populated a block at a time.
pub struct GlyphCache<D: GraphicsDevice, R> {
    device: Rc<D>,
    rasterizer: R,
    pixel_size: u32,
    format: TextureFormat,
    records: HashMap<u32, GlyphRecord<D>>,
    /// Origins of blocks that were rasterized in full.
    processed: HashSet<u32>,
}

impl<D: GraphicsDevice, R: Rasterizer> GlyphCache<D, R> {
    pub fn new(device: Rc<D>, rasterizer: R, pixel_size: u32, format: TextureFormat) -> Self {
        Self {
            device,
            rasterizer,
            pixel_size,
            format,
            records: HashMap::new(),
            processed: HashSet::new(),
        }
    }

    /// Metrics and texture for `code_point`, rasterizing its block on the
    /// first miss. `None` when the font does not cover it.
    pub fn lookup(&mut self, code_point: u32) -> Option<(GlyphMetrics, D::Texture)> {
        let origin = block_origin(code_point);
        if !self.records.contains_key(&code_point) && self.processed.insert(origin) {
            let (uploaded, absent) = self.populate(block_range(code_point));
            debug!("rasterized block U+{origin:04X}: {uploaded} uploaded, {absent} absent");
        }

        self.records
            .get(&code_point)
            .map(|record| (record.metrics, record.texture.raw()))
    }

    /// Rasterize every code point in `range` that is not cached yet.
    ///
    /// Blocks lying entirely inside `range` are marked processed; partially
    /// covered blocks are still filled in on their first miss. Returns the
    /// number of glyphs uploaded.
    pub fn generate(&mut self, range: RangeInclusive<u32>) -> usize {
        let (start, end) = (*range.start(), *range.end());
        if start > end {
            return 0;
        }

        let (uploaded, absent) = self.populate(range);

        let mut origin = match start % BLOCK_SIZE {
            0 => Some(start),
            rem => start.checked_add(BLOCK_SIZE - rem),
        };
        while let Some(low) = origin {
            match low.checked_add(BLOCK_SIZE - 1) {
                Some(high) if high <= end => {
                    self.processed.insert(low);
                    origin = low.checked_add(BLOCK_SIZE);
                }
                _ => break,
            }
        }

        debug!("generated U+{start:04X}..=U+{end:04X}: {uploaded} uploaded, {absent} absent");
        uploaded
    }

    fn populate(&mut self, range: RangeInclusive<u32>) -> (usize, usize) {
        let mut uploaded = 0;
        let mut absent = 0;

        for code_point in range {
            if self.records.contains_key(&code_point) {
                continue;
            }
            let Some(glyph) = self.rasterizer.rasterize(code_point, self.pixel_size) else {
                absent += 1;
                continue;
            };
            match self.upload(&glyph) {
                Ok(texture) => {
                    let metrics = GlyphMetrics::from(&glyph);
                    self.records.insert(code_point, GlyphRecord { texture, metrics });
                    uploaded += 1;
                }
                Err(err) => {
                    error!("dropping glyph U+{code_point:04X}: {err}");
                    absent += 1;
                }
            }
        }
        (uploaded, absent)
    }

    fn upload(&self, glyph: &RasterizedGlyph) -> Result<OwnedTexture<D>, DeviceError> {
        let texture = OwnedTexture::new(self.device.clone(), self.device.create_texture()?);
        self.device.bind_texture(Some(texture.raw()));
        self.device
            .upload_coverage(self.format, glyph.width, glyph.height, &glyph.coverage);
        self.device.bind_texture(None);
        Ok(texture)
    }
}

impl<D: GraphicsDevice, R> GlyphCache<D, R> {
    /// Number of cached glyphs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `code_point` is cached. Never rasterizes.
    pub fn contains(&self, code_point: u32) -> bool {
        self.records.contains_key(&code_point)
    }

    pub fn record(&self, code_point: u32) -> Option<&GlyphRecord<D>> {
        self.records.get(&code_point)
    }

    pub fn is_block_processed(&self, code_point: u32) -> bool {
        self.processed.contains(&block_origin(code_point))
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }
}

impl<D: GraphicsDevice, R: Rasterizer> GlyphSource for GlyphCache<D, R> {
    type Texture = D::Texture;

    #[inline]
    fn glyph(&mut self, code_point: u32) -> Option<(GlyphMetrics, D::Texture)> {
        self.lookup(code_point)
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Call, RecordingDevice};

    /// Covers printable ASCII only; records every request.
    #[derive(Default)]
    struct FakeRasterizer {
        requests: Vec<u32>,
    }

    impl Rasterizer for FakeRasterizer {
        fn rasterize(&mut self, code_point: u32, _pixel_size: u32) -> Option<RasterizedGlyph> {
            self.requests.push(code_point);
            if !(32..=126).contains(&code_point) {
                return None;
            }
            if code_point == u32::from(' ') {
                return Some(RasterizedGlyph::blank(10 << 6));
            }
            Some(RasterizedGlyph {
                width: 8,
                height: 12,
                advance: 10 << 6,
                bearing_x: 1,
                bearing_y: 12,
                coverage: vec![0xff; 8 * 12],
            })
        }
    }

    fn cache() -> (Rc<RecordingDevice>, GlyphCache<RecordingDevice, FakeRasterizer>) {
        let device = Rc::new(RecordingDevice::new());
        let rasterizer = FakeRasterizer::default();
        let cache = GlyphCache::new(device.clone(), rasterizer, 48, TextureFormat::Red8);
        (device, cache)
    }

    #[test]
    fn test_miss_populates_whole_block() {
        let (device, mut cache) = cache();
        let (metrics, _) = cache.lookup('A' as u32).unwrap();
        assert_eq!(metrics.advance_px(), 10);

        // 'A' = 65 lives in block 64..=95, all printable.
        assert_eq!(cache.rasterizer().requests, (64..=95).collect::<Vec<_>>());
        assert_eq!(cache.len(), 32);
        assert_eq!(device.live_textures(), 32);
        assert!(cache.is_block_processed('Z' as u32));
        assert!(!cache.is_block_processed('a' as u32));
    }

    #[test]
    fn test_hit_does_not_rasterize() {
        let (device, mut cache) = cache();
        cache.lookup('A' as u32);
        device.clear_calls();
        let requests = cache.rasterizer().requests.len();

        cache.lookup('B' as u32);
        cache.lookup('A' as u32);
        assert_eq!(cache.rasterizer().requests.len(), requests);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_repeated_lookup_returns_same_texture() {
        let (_device, mut cache) = cache();
        let first = cache.lookup('x' as u32).unwrap();
        let second = cache.lookup('x' as u32).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.record('x' as u32).unwrap().texture(), first.1);
    }

    #[test]
    fn test_uncovered_code_point_is_absent_and_not_retried() {
        let (_device, mut cache) = cache();
        assert!(cache.lookup(0x4E2D).is_none());
        let requests = cache.rasterizer().requests.len();
        assert_eq!(requests, 32);

        assert!(cache.lookup(0x4E2D).is_none());
        assert!(cache.lookup(0x4E2E).is_none());
        assert_eq!(cache.rasterizer().requests.len(), requests);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_partial_block_only_uploads_covered() {
        let (_device, mut cache) = cache();
        // Block 96..=127: 96..=126 printable, 127 is DEL.
        cache.lookup('z' as u32);
        assert_eq!(cache.len(), 31);
        assert!(!cache.contains(127));
    }

    #[test]
    fn test_upload_sequence() {
        let (device, mut cache) = cache();
        cache.generate(65..=65);
        let calls = device.calls();
        assert_eq!(
            calls,
            vec![
                Call::CreateTexture(1),
                Call::BindTexture(Some(1)),
                Call::UploadCoverage {
                    format: TextureFormat::Red8,
                    width: 8,
                    height: 12,
                    bytes: 96,
                },
                Call::BindTexture(None),
            ]
        );
    }

    #[test]
    fn test_blank_glyph_is_cached() {
        let (_device, mut cache) = cache();
        let (metrics, _) = cache.lookup(' ' as u32).unwrap();
        assert_eq!((metrics.width, metrics.height), (0, 0));
        assert_eq!(metrics.advance_px(), 10);
    }

    #[test]
    fn test_generate_marks_full_blocks_only() {
        let (_device, mut cache) = cache();
        let uploaded = cache.generate(32..=127);
        assert_eq!(uploaded, 95);
        assert!(cache.is_block_processed(32));
        assert!(cache.is_block_processed(64));
        assert!(cache.is_block_processed(96));
        assert!(!cache.is_block_processed(0));

        let requests = cache.rasterizer().requests.len();
        cache.lookup('H' as u32);
        cache.lookup('i' as u32);
        assert_eq!(cache.rasterizer().requests.len(), requests);
    }

    #[test]
    fn test_generate_partial_block_still_fills_on_miss() {
        let (device, mut cache) = cache();
        cache.generate(40..=70);
        assert!(!cache.is_block_processed(40));
        assert!(cache.contains(40));
        assert!(!cache.contains(33));

        // A hit on a generated glyph does not fill the rest of its block.
        let texture = cache.lookup(40).unwrap().1;
        assert!(!cache.contains(33));

        device.clear_calls();
        cache.lookup(33);
        assert!(cache.contains(33));
        assert!(cache.contains(63));
        assert!(cache.is_block_processed(33));
        // Only 32..=39 were missing from block 32..=63.
        assert_eq!(device.count_calls(|c| matches!(c, Call::CreateTexture(_))), 8);
        assert_eq!(cache.record(40).unwrap().texture(), texture);
    }

    #[test]
    fn test_generate_empty_and_high_ranges() {
        let (_device, mut cache) = cache();
        #[allow(clippy::reversed_empty_ranges)]
        let empty = 10..=5;
        assert_eq!(cache.generate(empty), 0);
        assert_eq!(cache.generate(u32::MAX - 2..=u32::MAX), 0);
        assert!(cache.rasterizer().requests.len() <= 3);
    }

    #[test]
    fn test_texture_failure_is_absent() {
        let (device, mut cache) = cache();
        device.fail_textures(true);
        assert!(cache.lookup('A' as u32).is_none());
        assert!(cache.is_block_processed('A' as u32));
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn test_drop_releases_every_texture() {
        let (device, mut cache) = cache();
        cache.generate(32..=127);
        assert_eq!(device.live_textures(), 95);
        drop(cache);
        assert_eq!(device.live_textures(), 0);
        assert_eq!(device.double_deletes(), 0);
    }
}
