//! GPU rendering helpers.
//!
//! Geometry is specified directly in normalized device coordinates; there is no
//! camera or viewport uniform. The viewport transform comes from
//! [`RenderCtx::viewport`](ctx::RenderCtx) via `set_viewport`.

mod ctx;
pub mod geometry;
mod mesh;

pub use ctx::{RenderCtx, RenderTarget};
pub use geometry::Vertex;
pub use mesh::Mesh;
