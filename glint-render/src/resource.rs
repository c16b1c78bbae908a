//! Owned GPU handles.
//!
//! Every handle the renderer creates is wrapped in exactly one owner from
//! this module. The owner keeps the device alive and deletes the handle
//! when dropped, so each handle is released exactly once regardless of
//! which path (success, early `?` return, font destruction) ends its life.

use std::fmt;
use std::rc::Rc;

use crate::device::GraphicsDevice;

macro_rules! owned_handle {
    ($(#[$meta:meta])* $name:ident, $raw:ident, $delete:ident) => {
        $(#[$meta])*
        pub struct $name<D: GraphicsDevice> {
            device: Rc<D>,
            raw: D::$raw,
        }

        impl<D: GraphicsDevice> $name<D> {
            /// Take ownership of `raw`, which must have been created by `device`.
            pub fn new(device: Rc<D>, raw: D::$raw) -> Self {
                Self { device, raw }
            }

            /// The raw handle, for binding. Still owned by `self`.
            #[inline]
            pub fn raw(&self) -> D::$raw {
                self.raw
            }

            #[inline]
            pub fn device(&self) -> &Rc<D> {
                &self.device
            }
        }

        impl<D: GraphicsDevice> Drop for $name<D> {
            fn drop(&mut self) {
                self.device.$delete(self.raw);
            }
        }

        impl<D: GraphicsDevice> fmt::Debug for $name<D> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.raw).finish()
            }
        }
    };
}

owned_handle!(
    /// A glyph texture.
    OwnedTexture,
    Texture,
    delete_texture
);
owned_handle!(
    /// The streaming vertex buffer.
    OwnedBuffer,
    Buffer,
    delete_buffer
);
owned_handle!(
    /// A vertex array object (tiers that have them).
    OwnedVertexArray,
    VertexArray,
    delete_vertex_array
);
owned_handle!(
    /// An intermediate shader stage; only lives until link.
    OwnedShader,
    Shader,
    delete_shader
);
owned_handle!(
    /// A linked shader program.
    OwnedProgram,
    Program,
    delete_program
);
