//! [`GraphicsDevice`] over a live OpenGL / OpenGL ES context via `glow`.
//!
//! # Safety
//!
//! [`GlowDevice::new`] is `unsafe`: the caller guarantees the context is
//! current on this thread for as long as the device (and every font built
//! on it) is alive. Every method below issues raw GL calls under that
//! guarantee.

use glow::HasContext;

use crate::device::{
    BlendFactor, Capability, ClipRect, DeviceError, GraphicsDevice, ShaderStage, TextureFormat,
};

/// A `glow` context driving real GPU work.
pub struct GlowDevice {
    gl: glow::Context,
}

impl GlowDevice {
    /// Wrap a context.
    ///
    /// # Safety
    ///
    /// `gl` must be current on the calling thread whenever the device is
    /// used, and must stay alive as long as the device does.
    pub unsafe fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    pub fn into_context(self) -> glow::Context {
        self.gl
    }
}

fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::Blend => glow::BLEND,
        Capability::ScissorTest => glow::SCISSOR_TEST,
    }
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
    }
}

type Gl = glow::Context;

impl GraphicsDevice for GlowDevice {
    type Texture = <Gl as HasContext>::Texture;
    type Buffer = <Gl as HasContext>::Buffer;
    type VertexArray = <Gl as HasContext>::VertexArray;
    type Shader = <Gl as HasContext>::Shader;
    type Program = <Gl as HasContext>::Program;
    type UniformLocation = <Gl as HasContext>::UniformLocation;

    fn shading_language_version(&self) -> String {
        unsafe { self.gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION) }
    }

    // ── Shaders ─────────────────────────────────────────────────

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, DeviceError> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(kind) }.map_err(|e| DeviceError::new("shader", e))
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            self.gl.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<Self::Program, DeviceError> {
        unsafe { self.gl.create_program() }.map_err(|e| DeviceError::new("program", e))
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&self, program: Self::Program) -> bool {
        unsafe {
            self.gl.link_program(program);
            self.gl.get_program_link_status(program)
        }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn set_uniform_1i(&self, location: &Self::UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(location), value) }
    }

    fn set_uniform_2f(&self, location: &Self::UniformLocation, x: f32, y: f32) {
        unsafe { self.gl.uniform_2_f32(Some(location), x, y) }
    }

    fn set_uniform_4f(&self, location: &Self::UniformLocation, [r, g, b, a]: [f32; 4]) {
        unsafe { self.gl.uniform_4_f32(Some(location), r, g, b, a) }
    }

    // ── Textures ────────────────────────────────────────────────

    fn create_texture(&self) -> Result<Self::Texture, DeviceError> {
        unsafe { self.gl.create_texture() }.map_err(|e| DeviceError::new("texture", e))
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, texture: Option<Self::Texture>) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture) }
    }

    fn upload_coverage(&self, format: TextureFormat, width: u32, height: u32, pixels: &[u8]) {
        let (internal, external) = match format {
            TextureFormat::Luminance => (glow::LUMINANCE, glow::LUMINANCE),
            TextureFormat::Red8 => (glow::R8, glow::RED),
        };
        // Empty bitmaps (spaces) still get a valid zero-sized image.
        let pixels = (!pixels.is_empty()).then_some(pixels);

        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal as i32,
                width as i32,
                height as i32,
                0,
                external,
                glow::UNSIGNED_BYTE,
                pixels,
            );
            let clamp = glow::CLAMP_TO_EDGE as i32;
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, clamp);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, clamp);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    // ── Vertex data ─────────────────────────────────────────────

    fn create_buffer(&self) -> Result<Self::Buffer, DeviceError> {
        unsafe { self.gl.create_buffer() }.map_err(|e| DeviceError::new("buffer", e))
    }

    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer) }
    }

    fn buffer_data(&self, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::DYNAMIC_DRAW)
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, DeviceError> {
        unsafe { self.gl.create_vertex_array() }.map_err(|e| DeviceError::new("vertex array", e))
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn vertex_attrib_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl.enable_vertex_attrib_array(index);
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, offset);
        }
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) }
    }

    // ── State and drawing ───────────────────────────────────────

    fn enable(&self, cap: Capability) {
        unsafe { self.gl.enable(capability(cap)) }
    }

    fn disable(&self, cap: Capability) {
        unsafe { self.gl.disable(capability(cap)) }
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(blend_factor(src), blend_factor(dst)) }
    }

    fn scissor(&self, rect: ClipRect) {
        unsafe { self.gl.scissor(rect.x, rect.y, rect.width, rect.height) }
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, first, count) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_mapping() {
        assert_eq!(capability(Capability::Blend), glow::BLEND);
        assert_eq!(capability(Capability::ScissorTest), glow::SCISSOR_TEST);
    }

    #[test]
    fn test_blend_factor_mapping() {
        assert_eq!(blend_factor(BlendFactor::SrcAlpha), glow::SRC_ALPHA);
        assert_eq!(blend_factor(BlendFactor::OneMinusSrcAlpha), glow::ONE_MINUS_SRC_ALPHA);
    }
}
