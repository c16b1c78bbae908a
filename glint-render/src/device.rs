//! Graphics device abstraction.
//!
//! [`GraphicsDevice`] is the small slice of an OpenGL-family API the text
//! renderer needs: textures, one vertex buffer, an optional vertex array,
//! a shader program with a handful of uniforms, blend/scissor toggles and
//! `glDrawArrays`. Two implementations ship with the crate:
//!
//! 1. [`GlowDevice`](crate::glow_device::GlowDevice), a real context through `glow`.
//! 2. [`RecordingDevice`](crate::recording::RecordingDevice), headless,
//!    records every call. Used for tests and benchmarks.
//!
//! Methods take `&self`: GL contexts are shared, and the caller is the
//! single thread that owns the context.

use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

/// A device refused to create an object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to create {object}: {message}")]
pub struct DeviceError {
    pub object: &'static str,
    pub message: String,
}

impl DeviceError {
    pub fn new(object: &'static str, message: impl Into<String>) -> Self {
        Self {
            object,
            message: message.into(),
        }
    }
}

/// Programmable pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Toggleable pipeline state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    Blend,
    ScissorTest,
}

/// Blend factors used by the text pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Single-channel coverage formats, by tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// `GL_LUMINANCE`, GL 2.1 and GLES 2.
    Luminance,
    /// `GL_R8` / `GL_RED`, GL 3.x core and GLES 3.
    Red8,
}

/// Scissor rectangle in window pixels (GL convention: origin bottom-left).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClipRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ClipRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<[i32; 4]> for ClipRect {
    fn from([x, y, width, height]: [i32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

/// The graphics API as seen by the text renderer.
pub trait GraphicsDevice {
    type Texture: Copy + Eq + Hash + Debug;
    type Buffer: Copy + Eq + Debug;
    type VertexArray: Copy + Eq + Debug;
    type Shader: Copy + Eq + Debug;
    type Program: Copy + Eq + Debug;
    type UniformLocation: Clone + Debug;

    /// `GL_SHADING_LANGUAGE_VERSION`, for diagnostics.
    fn shading_language_version(&self) -> String;

    // ── Shaders ─────────────────────────────────────────────────

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, DeviceError>;
    /// Set the source and compile. Returns the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, DeviceError>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Link. Returns the link status.
    fn link_program(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn set_uniform_1i(&self, location: &Self::UniformLocation, value: i32);
    fn set_uniform_2f(&self, location: &Self::UniformLocation, x: f32, y: f32);
    fn set_uniform_4f(&self, location: &Self::UniformLocation, value: [f32; 4]);

    // ── Textures ────────────────────────────────────────────────

    fn create_texture(&self) -> Result<Self::Texture, DeviceError>;
    /// Select texture unit `unit` (0-based).
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, texture: Option<Self::Texture>);
    /// Upload a tightly packed (1-byte aligned) single-channel image to the
    /// bound texture, with clamp-to-edge wrapping and linear filtering.
    fn upload_coverage(&self, format: TextureFormat, width: u32, height: u32, pixels: &[u8]);
    fn delete_texture(&self, texture: Self::Texture);

    // ── Vertex data ─────────────────────────────────────────────

    fn create_buffer(&self) -> Result<Self::Buffer, DeviceError>;
    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>);
    /// Replace the bound array buffer's contents (dynamic usage).
    fn buffer_data(&self, data: &[u8]);
    fn delete_buffer(&self, buffer: Self::Buffer);

    fn create_vertex_array(&self) -> Result<Self::VertexArray, DeviceError>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    /// Enable attribute `index` and source `components` floats from the
    /// bound array buffer.
    fn vertex_attrib_f32(&self, index: u32, components: i32, stride: i32, offset: i32);
    fn disable_vertex_attrib_array(&self, index: u32);

    // ── State and drawing ───────────────────────────────────────

    fn enable(&self, capability: Capability);
    fn disable(&self, capability: Capability);
    fn blend_func(&self, src: BlendFactor, dst: BlendFactor);
    fn scissor(&self, rect: ClipRect);
    /// `glDrawArrays(GL_TRIANGLES, first, count)`.
    fn draw_triangles(&self, first: i32, count: i32);
}
