//! Shader program lifecycle: compile, link and uniforms.
//!
//! [`compile`] builds the text program for one capability tier. Each stage
//! gets the tier's `#version` preamble, is compiled on its own, and the
//! pair is linked. The intermediate stage objects are owned by
//! [`OwnedShader`]s, so they are released on every exit path, including
//! a failed compile of the other stage and a failed link. Compiling never
//! binds the program.

use std::borrow::Cow;
use std::rc::Rc;

use log::{debug, warn};
use thiserror::Error;

use crate::device::{DeviceError, GraphicsDevice, ShaderStage};
use crate::resource::{OwnedProgram, OwnedShader};
use crate::tier::CapabilityTier;

/// Uniform names the text shaders declare.
pub const RESOLUTION_UNIFORM: &str = "resolution";
pub const TEXT_COLOR_UNIFORM: &str = "textColor";
pub const SAMPLER_UNIFORM: &str = "tex";
/// Attribute names the text vertex shader declares.
pub const POSITION_ATTRIBUTE: &str = "vert";
pub const TEX_COORDS_ATTRIBUTE: &str = "vertTexCoord";

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("{version}\nfailed to compile {stage} shader: {log}")]
    Compile {
        stage: ShaderStage,
        version: String,
        log: String,
    },
    #[error("{version}\nfailed to link program: {log}")]
    Link { version: String, log: String },
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Vertex and fragment source text, without a `#version` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl Default for ShaderSources {
    /// The bundled text shaders, valid under every tier.
    fn default() -> Self {
        Self {
            vertex: Cow::Borrowed(include_str!("../shaders/text.vert")),
            fragment: Cow::Borrowed(include_str!("../shaders/text.frag")),
        }
    }
}

/// A linked text program and its resolved inputs.
pub struct ShaderProgram<D: GraphicsDevice> {
    program: OwnedProgram<D>,
    glsl_version: u32,
    resolution: Option<D::UniformLocation>,
    text_color: Option<D::UniformLocation>,
    sampler: Option<D::UniformLocation>,
    position_attribute: u32,
    tex_coords_attribute: u32,
}

/// Compile and link `sources` for `tier` at `glsl_version`.
pub fn compile<D: GraphicsDevice>(
    device: &Rc<D>,
    tier: CapabilityTier,
    glsl_version: u32,
    sources: &ShaderSources,
) -> Result<ShaderProgram<D>, ShaderError> {
    let preamble = tier.preamble(glsl_version);

    let vertex = compile_stage(device, ShaderStage::Vertex, &preamble, &sources.vertex)?;
    let fragment = compile_stage(device, ShaderStage::Fragment, &preamble, &sources.fragment)?;

    let program = OwnedProgram::new(device.clone(), device.create_program()?);
    device.attach_shader(program.raw(), vertex.raw());
    device.attach_shader(program.raw(), fragment.raw());
    let linked = device.link_program(program.raw());
    device.detach_shader(program.raw(), vertex.raw());
    device.detach_shader(program.raw(), fragment.raw());
    drop(vertex);
    drop(fragment);

    if !linked {
        return Err(ShaderError::Link {
            version: device.shading_language_version(),
            log: device.program_info_log(program.raw()),
        });
    }

    let log = device.program_info_log(program.raw());
    if !log.trim().is_empty() {
        warn!("text program linked with diagnostics: {}", log.trim());
    }

    let attribute = |name: &str| {
        device
            .attrib_location(program.raw(), name)
            .ok_or_else(|| ShaderError::Link {
                version: device.shading_language_version(),
                log: format!("attribute `{name}` is not active"),
            })
    };
    let position_attribute = attribute(POSITION_ATTRIBUTE)?;
    let tex_coords_attribute = attribute(TEX_COORDS_ATTRIBUTE)?;

    let resolution = device.uniform_location(program.raw(), RESOLUTION_UNIFORM);
    let text_color = device.uniform_location(program.raw(), TEXT_COLOR_UNIFORM);
    let sampler = device.uniform_location(program.raw(), SAMPLER_UNIFORM);

    debug!(
        "linked text program {:?} for {tier} (GLSL {glsl_version})",
        program.raw()
    );

    Ok(ShaderProgram {
        program,
        glsl_version,
        resolution,
        text_color,
        sampler,
        position_attribute,
        tex_coords_attribute,
    })
}

fn compile_stage<D: GraphicsDevice>(
    device: &Rc<D>,
    stage: ShaderStage,
    preamble: &str,
    body: &str,
) -> Result<OwnedShader<D>, ShaderError> {
    let shader = OwnedShader::new(device.clone(), device.create_shader(stage)?);
    let source = format!("{preamble}{body}");

    if !device.compile_shader(shader.raw(), &source) {
        return Err(ShaderError::Compile {
            stage,
            version: device.shading_language_version(),
            log: device.shader_info_log(shader.raw()),
        });
    }

    let log = device.shader_info_log(shader.raw());
    if !log.trim().is_empty() {
        warn!("{stage} shader compiled with diagnostics: {}", log.trim());
    }
    Ok(shader)
}

impl<D: GraphicsDevice> ShaderProgram<D> {
    #[inline]
    pub fn raw(&self) -> D::Program {
        self.program.raw()
    }

    pub fn glsl_version(&self) -> u32 {
        self.glsl_version
    }

    /// Attribute indices of `vert` and `vertTexCoord`.
    pub fn attributes(&self) -> (u32, u32) {
        (self.position_attribute, self.tex_coords_attribute)
    }

    /// Bind the program and push the text color and sampler unit.
    pub fn bind_with_color(&self, color: [f32; 4]) {
        let device = self.program.device();
        device.use_program(Some(self.program.raw()));
        if let Some(location) = &self.text_color {
            device.set_uniform_4f(location, color);
        }
        if let Some(location) = &self.sampler {
            device.set_uniform_1i(location, 0);
        }
    }

    pub fn unbind(&self) {
        self.program.device().use_program(None);
    }

    /// Push a new viewport size into `resolution`, leaving no program bound.
    pub fn set_resolution(&self, width: u32, height: u32) {
        let device = self.program.device();
        device.use_program(Some(self.program.raw()));
        if let Some(location) = &self.resolution {
            device.set_uniform_2f(location, width as f32, height as f32);
        }
        device.use_program(None);
    }
}

// ===================================================================
// Tests
// ===================================================================
