//! Headless device that records every call.
//!
//! `RecordingDevice` hands out sequential integer handles, tracks which
//! objects are alive and which state is bound, and logs each call as a
//! [`Call`]. Tests assert on the log; benchmarks use it to time the CPU
//! side of the pipeline without a GL context.
//!
//! Failures can be injected per shader stage, at link time, and at texture
//! creation to exercise error paths.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::device::{
    BlendFactor, Capability, ClipRect, DeviceError, GraphicsDevice, ShaderStage, TextureFormat,
};

/// Uniforms the recording device reports as active in every program.
const ACTIVE_UNIFORMS: &[&str] = &["resolution", "textColor", "tex"];
/// Attributes the recording device reports, with their locations.
const ACTIVE_ATTRIBUTES: &[(&str, u32)] = &[("vert", 0), ("vertTexCoord", 1)];

/// One recorded device call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateShader(ShaderStage, u32),
    CompileShader { shader: u32, source: String },
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    Uniform1i { name: String, value: i32 },
    Uniform2f { name: String, value: [f32; 2] },
    Uniform4f { name: String, value: [f32; 4] },
    CreateTexture(u32),
    ActiveTexture(u32),
    BindTexture(Option<u32>),
    UploadCoverage { format: TextureFormat, width: u32, height: u32, bytes: usize },
    DeleteTexture(u32),
    CreateBuffer(u32),
    BindArrayBuffer(Option<u32>),
    BufferData { bytes: usize },
    DeleteBuffer(u32),
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    VertexAttrib { index: u32, components: i32, stride: i32, offset: i32 },
    DisableVertexAttrib(u32),
    Enable(Capability),
    Disable(Capability),
    BlendFunc(BlendFactor, BlendFactor),
    Scissor(ClipRect),
    DrawTriangles { first: i32, count: i32 },
}

#[derive(Default)]
struct State {
    next_handle: u32,
    calls: Vec<Call>,

    shader_stages: HashMap<u32, ShaderStage>,
    live_shaders: HashSet<u32>,
    live_programs: HashSet<u32>,
    live_textures: HashSet<u32>,
    live_buffers: HashSet<u32>,
    live_vertex_arrays: HashSet<u32>,
    double_deletes: usize,

    bound_program: Option<u32>,
    bound_texture: Option<u32>,
    bound_buffer: Option<u32>,
    bound_vertex_array: Option<u32>,
    enabled: HashSet<Capability>,
    /// Enabled attribute arrays, keyed by the vertex array that owns them.
    enabled_attributes: HashSet<(Option<u32>, u32)>,
    last_buffer_data: Vec<u8>,

    compile_failures: HashMap<ShaderStage, String>,
    link_failure: Option<String>,
    texture_failures: bool,
}

impl State {
    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn note_release(&mut self, was_live: bool) {
        if !was_live {
            self.double_deletes += 1;
        }
    }
}

/// A [`GraphicsDevice`] with no GPU behind it.
#[derive(Default)]
pub struct RecordingDevice {
    state: RefCell<State>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Failure injection ───────────────────────────────────────

    /// Make every compile of `stage` fail with `log`.
    pub fn fail_compile(&self, stage: ShaderStage, log: impl Into<String>) {
        self.state.borrow_mut().compile_failures.insert(stage, log.into());
    }

    /// Make every link fail with `log`.
    pub fn fail_link(&self, log: impl Into<String>) {
        self.state.borrow_mut().link_failure = Some(log.into());
    }

    /// Make texture creation fail until called again with `false`.
    pub fn fail_textures(&self, fail: bool) {
        self.state.borrow_mut().texture_failures = fail;
    }

    // ── Call log ────────────────────────────────────────────────

    /// Every call recorded so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Drain the call log.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Contents of the most recent `buffer_data` upload.
    pub fn last_buffer_data(&self) -> Vec<u8> {
        self.state.borrow().last_buffer_data.clone()
    }

    // ── Object and binding state ────────────────────────────────

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().live_shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().live_programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().live_textures.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().live_buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().live_vertex_arrays.len()
    }

    /// Total live objects of every kind.
    pub fn live_objects(&self) -> usize {
        self.live_shaders()
            + self.live_programs()
            + self.live_textures()
            + self.live_buffers()
            + self.live_vertex_arrays()
    }

    /// Deletes of handles that were not alive.
    pub fn double_deletes(&self) -> usize {
        self.state.borrow().double_deletes
    }

    pub fn bound_program(&self) -> Option<u32> {
        self.state.borrow().bound_program
    }

    pub fn bound_texture(&self) -> Option<u32> {
        self.state.borrow().bound_texture
    }

    pub fn bound_array_buffer(&self) -> Option<u32> {
        self.state.borrow().bound_buffer
    }

    pub fn bound_vertex_array(&self) -> Option<u32> {
        self.state.borrow().bound_vertex_array
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.state.borrow().enabled.contains(&capability)
    }

    /// Attribute arrays enabled on the currently bound vertex array (or
    /// the default one when none is bound).
    pub fn enabled_attributes(&self) -> Vec<u32> {
        let state = self.state.borrow();
        let mut indices: Vec<u32> = state
            .enabled_attributes
            .iter()
            .filter(|(owner, _)| *owner == state.bound_vertex_array)
            .map(|&(_, index)| index)
            .collect();
        indices.sort_unstable();
        indices
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl GraphicsDevice for RecordingDevice {
    type Texture = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type Shader = u32;
    type Program = u32;
    type UniformLocation = String;

    fn shading_language_version(&self) -> String {
        String::from("4.60 (recording)")
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, DeviceError> {
        let mut state = self.state.borrow_mut();
        let shader = state.next();
        state.shader_stages.insert(shader, stage);
        state.live_shaders.insert(shader);
        state.calls.push(Call::CreateShader(stage, shader));
        Ok(shader)
    }

    fn compile_shader(&self, shader: u32, source: &str) -> bool {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::CompileShader {
            shader,
            source: source.to_owned(),
        });
        let stage = state.shader_stages.get(&shader).copied();
        !stage.is_some_and(|s| state.compile_failures.contains_key(&s))
    }

    fn shader_info_log(&self, shader: u32) -> String {
        let state = self.state.borrow();
        state
            .shader_stages
            .get(&shader)
            .and_then(|stage| state.compile_failures.get(stage))
            .cloned()
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        let was_live = state.live_shaders.remove(&shader);
        state.note_release(was_live);
        state.calls.push(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<u32, DeviceError> {
        let mut state = self.state.borrow_mut();
        let program = state.next();
        state.live_programs.insert(program);
        state.calls.push(Call::CreateProgram(program));
        Ok(program)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record(Call::AttachShader { program, shader });
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record(Call::DetachShader { program, shader });
    }

    fn link_program(&self, program: u32) -> bool {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::LinkProgram(program));
        state.link_failure.is_none()
    }

    fn program_info_log(&self, _program: u32) -> String {
        self.state.borrow().link_failure.clone().unwrap_or_default()
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        let was_live = state.live_programs.remove(&program);
        state.note_release(was_live);
        if state.bound_program == Some(program) {
            state.bound_program = None;
        }
        state.calls.push(Call::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.bound_program = program;
        state.calls.push(Call::UseProgram(program));
    }

    fn uniform_location(&self, _program: u32, name: &str) -> Option<String> {
        ACTIVE_UNIFORMS.contains(&name).then(|| name.to_owned())
    }

    fn attrib_location(&self, _program: u32, name: &str) -> Option<u32> {
        ACTIVE_ATTRIBUTES
            .iter()
            .find(|(attr, _)| *attr == name)
            .map(|&(_, index)| index)
    }

    fn set_uniform_1i(&self, location: &String, value: i32) {
        self.record(Call::Uniform1i {
            name: location.clone(),
            value,
        });
    }

    fn set_uniform_2f(&self, location: &String, x: f32, y: f32) {
        self.record(Call::Uniform2f {
            name: location.clone(),
            value: [x, y],
        });
    }

    fn set_uniform_4f(&self, location: &String, value: [f32; 4]) {
        self.record(Call::Uniform4f {
            name: location.clone(),
            value,
        });
    }

    fn create_texture(&self) -> Result<u32, DeviceError> {
        let mut state = self.state.borrow_mut();
        if state.texture_failures {
            return Err(DeviceError::new("texture", "injected failure"));
        }
        let texture = state.next();
        state.live_textures.insert(texture);
        state.calls.push(Call::CreateTexture(texture));
        Ok(texture)
    }

    fn active_texture(&self, unit: u32) {
        self.record(Call::ActiveTexture(unit));
    }

    fn bind_texture(&self, texture: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.bound_texture = texture;
        state.calls.push(Call::BindTexture(texture));
    }

    fn upload_coverage(&self, format: TextureFormat, width: u32, height: u32, pixels: &[u8]) {
        self.record(Call::UploadCoverage {
            format,
            width,
            height,
            bytes: pixels.len(),
        });
    }

    fn delete_texture(&self, texture: u32) {
        let mut state = self.state.borrow_mut();
        let was_live = state.live_textures.remove(&texture);
        state.note_release(was_live);
        if state.bound_texture == Some(texture) {
            state.bound_texture = None;
        }
        state.calls.push(Call::DeleteTexture(texture));
    }

    fn create_buffer(&self) -> Result<u32, DeviceError> {
        let mut state = self.state.borrow_mut();
        let buffer = state.next();
        state.live_buffers.insert(buffer);
        state.calls.push(Call::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn bind_array_buffer(&self, buffer: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.bound_buffer = buffer;
        state.calls.push(Call::BindArrayBuffer(buffer));
    }

    fn buffer_data(&self, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        state.last_buffer_data = data.to_vec();
        state.calls.push(Call::BufferData { bytes: data.len() });
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.borrow_mut();
        let was_live = state.live_buffers.remove(&buffer);
        state.note_release(was_live);
        state.calls.push(Call::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> Result<u32, DeviceError> {
        let mut state = self.state.borrow_mut();
        let vertex_array = state.next();
        state.live_vertex_arrays.insert(vertex_array);
        state.calls.push(Call::CreateVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.bound_vertex_array = vertex_array;
        state.calls.push(Call::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state.borrow_mut();
        let was_live = state.live_vertex_arrays.remove(&vertex_array);
        state.note_release(was_live);
        state.calls.push(Call::DeleteVertexArray(vertex_array));
    }

    fn vertex_attrib_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        let mut state = self.state.borrow_mut();
        let owner = state.bound_vertex_array;
        state.enabled_attributes.insert((owner, index));
        state.calls.push(Call::VertexAttrib {
            index,
            components,
            stride,
            offset,
        });
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        let owner = state.bound_vertex_array;
        state.enabled_attributes.remove(&(owner, index));
        state.calls.push(Call::DisableVertexAttrib(index));
    }

    fn enable(&self, capability: Capability) {
        let mut state = self.state.borrow_mut();
        state.enabled.insert(capability);
        state.calls.push(Call::Enable(capability));
    }

    fn disable(&self, capability: Capability) {
        let mut state = self.state.borrow_mut();
        state.enabled.remove(&capability);
        state.calls.push(Call::Disable(capability));
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        self.record(Call::BlendFunc(src, dst));
    }

    fn scissor(&self, rect: ClipRect) {
        self.record(Call::Scissor(rect));
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        self.record(Call::DrawTriangles { first, count });
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique() {
        let device = RecordingDevice::new();
        let a = device.create_texture().unwrap();
        let b = device.create_texture().unwrap();
        let c = device.create_buffer().unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(device.live_textures(), 2);
        assert_eq!(device.live_buffers(), 1);
    }

    #[test]
    fn test_double_delete_is_counted() {
        let device = RecordingDevice::new();
        let texture = device.create_texture().unwrap();
        device.delete_texture(texture);
        device.delete_texture(texture);
        assert_eq!(device.double_deletes(), 1);
    }

    #[test]
    fn test_injected_compile_failure_targets_stage() {
        let device = RecordingDevice::new();
        device.fail_compile(ShaderStage::Fragment, "0:1: syntax error");
        let vs = device.create_shader(ShaderStage::Vertex).unwrap();
        let fs = device.create_shader(ShaderStage::Fragment).unwrap();
        assert!(device.compile_shader(vs, "void main() {}"));
        assert!(!device.compile_shader(fs, "void main() {"));
        assert_eq!(device.shader_info_log(fs), "0:1: syntax error");
        assert!(device.shader_info_log(vs).is_empty());
    }

    #[test]
    fn test_binding_state_tracked() {
        let device = RecordingDevice::new();
        device.enable(Capability::Blend);
        device.use_program(Some(3));
        assert!(device.is_enabled(Capability::Blend));
        assert_eq!(device.bound_program(), Some(3));
        device.disable(Capability::Blend);
        device.use_program(None);
        assert!(!device.is_enabled(Capability::Blend));
        assert_eq!(device.bound_program(), None);
    }

    #[test]
    fn test_attribute_arrays_belong_to_bound_vertex_array() {
        let device = RecordingDevice::new();
        let vertex_array = device.create_vertex_array().unwrap();
        device.bind_vertex_array(Some(vertex_array));
        device.vertex_attrib_f32(0, 2, 16, 0);
        assert_eq!(device.enabled_attributes(), vec![0]);

        device.bind_vertex_array(None);
        assert!(device.enabled_attributes().is_empty());
        device.vertex_attrib_f32(1, 2, 16, 8);
        assert_eq!(device.enabled_attributes(), vec![1]);
        device.disable_vertex_attrib_array(1);
        assert!(device.enabled_attributes().is_empty());
    }

    #[test]
    fn test_texture_failure_toggle() {
        let device = RecordingDevice::new();
        device.fail_textures(true);
        assert!(device.create_texture().is_err());
        device.fail_textures(false);
        assert!(device.create_texture().is_ok());
    }

    #[test]
    fn test_unknown_uniform_has_no_location() {
        let device = RecordingDevice::new();
        assert_eq!(device.uniform_location(1, "textColor").as_deref(), Some("textColor"));
        assert!(device.uniform_location(1, "unused").is_none());
        assert_eq!(device.attrib_location(1, "vertTexCoord"), Some(1));
    }
}
