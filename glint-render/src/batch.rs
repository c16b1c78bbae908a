//! Batch submission of glyph quads.
//!
//! A [`BatchRenderer`] owns the streaming vertex buffer (and, on tiers
//! that have them, a vertex array configured once at load). Drawing goes
//! through a [`DrawState`], a scoped pass that sets blend, scissor, program
//! and texture unit on creation and restores all of it when dropped:
//!
//! ```text
//! let mut pass = batch.begin(&program, color, blend, clip);
//! pass.submit(&quads);
//! // pass dropped → VAO (or attribute arrays), texture, program released;
//! // blend and scissor disabled
//! ```

use std::rc::Rc;

use glint_text::{GlyphVertex, PositionedQuad, VERTICES_PER_QUAD};

use crate::device::{BlendFactor, Capability, ClipRect, DeviceError, GraphicsDevice};
use crate::resource::{OwnedBuffer, OwnedVertexArray};
use crate::shader::ShaderProgram;
use crate::tier::CapabilityTier;

/// Streaming vertex buffer plus optional vertex array.
pub struct BatchRenderer<D: GraphicsDevice> {
    buffer: OwnedBuffer<D>,
    vertex_array: Option<OwnedVertexArray<D>>,
    /// `vert` and `vertTexCoord` attribute indices.
    attributes: (u32, u32),
    /// Reused between submissions.
    vertices: Vec<GlyphVertex>,
}

impl<D: GraphicsDevice> BatchRenderer<D> {
    /// Create the vertex buffer, and the vertex array when `tier` has them.
    pub fn new(
        device: &Rc<D>,
        tier: CapabilityTier,
        glsl_version: u32,
        attributes: (u32, u32),
    ) -> Result<Self, DeviceError> {
        let buffer = OwnedBuffer::new(device.clone(), device.create_buffer()?);

        let vertex_array = if tier.has_vertex_arrays(glsl_version) {
            let vertex_array = OwnedVertexArray::new(device.clone(), device.create_vertex_array()?);
            device.bind_vertex_array(Some(vertex_array.raw()));
            device.bind_array_buffer(Some(buffer.raw()));
            describe_attributes(device.as_ref(), attributes);
            device.bind_vertex_array(None);
            device.bind_array_buffer(None);
            Some(vertex_array)
        } else {
            None
        };

        Ok(Self {
            buffer,
            vertex_array,
            attributes,
            vertices: Vec::new(),
        })
    }

    pub fn has_vertex_array(&self) -> bool {
        self.vertex_array.is_some()
    }

    /// Set up pipeline state for one draw call and return the pass that
    /// restores it.
    pub fn begin<'a>(
        &'a mut self,
        program: &'a ShaderProgram<D>,
        color: [f32; 4],
        blend: bool,
        clip: ClipRect,
    ) -> DrawState<'a, D> {
        let device = self.buffer.device().clone();

        device.enable(Capability::Blend);
        if blend {
            device.blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        }
        device.enable(Capability::ScissorTest);
        device.scissor(clip);

        program.bind_with_color(color);
        device.active_texture(0);
        if let Some(vertex_array) = &self.vertex_array {
            device.bind_vertex_array(Some(vertex_array.raw()));
        }

        DrawState {
            device,
            batch: self,
            program,
        }
    }

    /// Upload `quads` in one transfer and draw them in order.
    ///
    /// Runs of consecutive quads sampling the same texture share a draw.
    fn submit(&mut self, quads: &[PositionedQuad<D::Texture>]) {
        if quads.is_empty() {
            return;
        }
        let device = self.buffer.device();

        self.vertices.clear();
        self.vertices.extend(quads.iter().flat_map(|quad| quad.vertices));

        device.bind_array_buffer(Some(self.buffer.raw()));
        device.buffer_data(bytemuck::cast_slice(&self.vertices));
        if self.vertex_array.is_none() {
            describe_attributes(device.as_ref(), self.attributes);
        }

        let mut first = 0;
        for run in quads.chunk_by(|a, b| a.texture == b.texture) {
            let count = (run.len() * VERTICES_PER_QUAD) as i32;
            device.bind_texture(Some(run[0].texture));
            device.draw_triangles(first, count);
            first += count;
        }

        device.bind_texture(None);
        device.bind_array_buffer(None);
    }
}

/// Point `vert` and `vertTexCoord` at the bound array buffer.
fn describe_attributes<D: GraphicsDevice>(device: &D, (position, tex_coords): (u32, u32)) {
    let stride = GlyphVertex::STRIDE as i32;
    device.vertex_attrib_f32(position, 2, stride, 0);
    device.vertex_attrib_f32(tex_coords, 2, stride, GlyphVertex::TEX_COORDS_OFFSET as i32);
}

/// Pipeline state for one text draw. Restored on drop.
pub struct DrawState<'a, D: GraphicsDevice> {
    device: Rc<D>,
    batch: &'a mut BatchRenderer<D>,
    program: &'a ShaderProgram<D>,
}

impl<D: GraphicsDevice> DrawState<'_, D> {
    pub fn submit(&mut self, quads: &[PositionedQuad<D::Texture>]) {
        self.batch.submit(quads);
    }
}

impl<D: GraphicsDevice> Drop for DrawState<'_, D> {
    fn drop(&mut self) {
        if self.batch.vertex_array.is_some() {
            self.device.bind_vertex_array(None);
        } else {
            let (position, tex_coords) = self.batch.attributes;
            self.device.disable_vertex_attrib_array(position);
            self.device.disable_vertex_attrib_array(tex_coords);
        }
        self.device.bind_texture(None);
        self.program.unbind();
        self.device.disable(Capability::Blend);
        self.device.disable(Capability::ScissorTest);
    }
}

// ===================================================================
// Tests
// ===================================================================
