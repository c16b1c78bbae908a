//! Graphics capability tiers.
//!
//! A font is bound to one tier for its whole life. Everything that differs
//! between tiers is answered here:
//!
//! | Tier   | Preamble                                   | VAO      | Coverage    |
//! |--------|--------------------------------------------|----------|-------------|
//! | `Gl21` | `#version 120`                             | no       | `LUMINANCE` |
//! | `Gl32` | `#version 150 core`                        | yes      | `R8`        |
//! | `Gles` | `#version 320 es` + `precision mediump`    | ES 3 only| `R8` (ES 3) |

use crate::device::TextureFormat;

/// The graphics API profile a font renders through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CapabilityTier {
    /// OpenGL 2.1.
    Gl21,
    /// OpenGL 3.2 core profile.
    Gl32,
    /// OpenGL ES 2.0 / 3.x.
    Gles,
}

impl CapabilityTier {
    /// GLSL version used when the caller does not request one.
    pub const fn default_glsl_version(self) -> u32 {
        match self {
            Self::Gl21 => 120,
            Self::Gl32 => 150,
            Self::Gles => 320,
        }
    }

    /// Text prepended to each shader stage before compiling.
    pub fn preamble(self, glsl_version: u32) -> String {
        match self {
            Self::Gl21 => format!("#version {glsl_version}\n"),
            Self::Gl32 if glsl_version >= 150 => format!("#version {glsl_version} core\n"),
            Self::Gl32 => format!("#version {glsl_version}\n"),
            Self::Gles if glsl_version >= 300 => {
                format!("#version {glsl_version} es\nprecision mediump float;\n")
            }
            Self::Gles => String::from("#version 100\nprecision mediump float;\n"),
        }
    }

    /// Whether vertex array objects are available. Without them the
    /// attribute pointers are re-specified for every batch.
    pub const fn has_vertex_arrays(self, glsl_version: u32) -> bool {
        match self {
            Self::Gl21 => false,
            Self::Gl32 => true,
            Self::Gles => glsl_version >= 300,
        }
    }

    /// Single-channel texture format for glyph coverage.
    pub const fn coverage_format(self, glsl_version: u32) -> TextureFormat {
        match self {
            Self::Gl21 => TextureFormat::Luminance,
            Self::Gl32 => TextureFormat::Red8,
            Self::Gles if glsl_version >= 300 => TextureFormat::Red8,
            Self::Gles => TextureFormat::Luminance,
        }
    }
}

impl std::fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gl21 => f.write_str("GL 2.1"),
            Self::Gl32 => f.write_str("GL 3.2"),
            Self::Gles => f.write_str("GLES"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preambles() {
        assert_eq!(CapabilityTier::Gl21.preamble(120), "#version 120\n");
        assert_eq!(CapabilityTier::Gl32.preamble(150), "#version 150 core\n");
        assert_eq!(CapabilityTier::Gl32.preamble(130), "#version 130\n");
        assert_eq!(
            CapabilityTier::Gles.preamble(320),
            "#version 320 es\nprecision mediump float;\n"
        );
        assert_eq!(
            CapabilityTier::Gles.preamble(100),
            "#version 100\nprecision mediump float;\n"
        );
    }

    #[test]
    fn test_vertex_arrays_by_tier() {
        assert!(!CapabilityTier::Gl21.has_vertex_arrays(120));
        assert!(CapabilityTier::Gl32.has_vertex_arrays(150));
        assert!(CapabilityTier::Gles.has_vertex_arrays(300));
        assert!(!CapabilityTier::Gles.has_vertex_arrays(100));
    }

    #[test]
    fn test_coverage_format_by_tier() {
        assert_eq!(CapabilityTier::Gl21.coverage_format(120), TextureFormat::Luminance);
        assert_eq!(CapabilityTier::Gl32.coverage_format(150), TextureFormat::Red8);
        assert_eq!(CapabilityTier::Gles.coverage_format(320), TextureFormat::Red8);
        assert_eq!(CapabilityTier::Gles.coverage_format(100), TextureFormat::Luminance);
    }

    #[test]
    fn test_default_glsl_versions() {
        assert_eq!(CapabilityTier::Gl21.default_glsl_version(), 120);
        assert_eq!(CapabilityTier::Gl32.default_glsl_version(), 150);
        assert_eq!(CapabilityTier::Gles.default_glsl_version(), 320);
        let gles = CapabilityTier::Gles;
        assert!(gles.has_vertex_arrays(gles.default_glsl_version()));
    }

    #[test]
    fn test_default_versions_produce_valid_preambles() {
        for tier in [CapabilityTier::Gl21, CapabilityTier::Gl32, CapabilityTier::Gles] {
            let preamble = tier.preamble(tier.default_glsl_version());
            assert!(preamble.starts_with("#version "));
            assert!(preamble.ends_with('\n'));
        }
    }
}
